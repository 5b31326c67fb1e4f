//! Equation scheduling: dependency graph, cycle detection and ordering.

pub mod dependency_graph;
pub mod ordering;

pub use dependency_graph::{build_dependency_graph, DependencyGraph};
pub use ordering::{schedule, Schedule};

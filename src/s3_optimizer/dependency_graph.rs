//! Equation dependency graph.
//!
//! One node per planned equation. An edge `d -> e` means equation `e` reads
//! a value computed by equation `d`. Reading a state or the variable of
//! integration adds no edge since those values are inputs of every
//! evaluation; reading a rate adds an edge from the rate equation.

use crate::s2_analyzer::variability::{Classification, Read};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::BTreeSet;

/// Edge in the dependency graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepEdge {
    /// Reads the value a variable equation computes
    Value,
    /// Reads the rate a rate equation computes
    Rate,
}

/// Dependency graph type alias; node weights are equation indices
pub type EquationDigraph = DiGraph<usize, DepEdge>;

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: EquationDigraph,
}

impl DependencyGraph {
    pub fn graph(&self) -> &EquationDigraph {
        &self.graph
    }

    pub fn equation_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Equations `equation` reads from, ascending.
    pub fn dependencies(&self, equation: usize) -> Vec<usize> {
        let deps: BTreeSet<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(equation), Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        deps.into_iter().collect()
    }

    /// Equations reading from `equation`, ascending.
    pub fn dependents(&self, equation: usize) -> Vec<usize> {
        let deps: BTreeSet<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(equation), Direction::Outgoing)
            .map(|n| self.graph[n])
            .collect();
        deps.into_iter().collect()
    }

    /// Strongly connected components, members ascending.
    pub fn strongly_connected_components(&self) -> Vec<Vec<usize>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|component| {
                let mut members: Vec<usize> =
                    component.into_iter().map(|n| self.graph[n]).collect();
                members.sort_unstable();
                members
            })
            .collect()
    }
}

/// Utility for building dependency graphs
pub struct GraphBuilder {
    graph: EquationDigraph,
    edges: BTreeSet<(usize, usize)>,
}

impl GraphBuilder {
    pub fn new(equation_count: usize) -> Self {
        let mut graph = EquationDigraph::with_capacity(equation_count, equation_count);
        for e in 0..equation_count {
            graph.add_node(e);
        }
        Self {
            graph,
            edges: BTreeSet::new(),
        }
    }

    /// Add an edge once; self edges are dropped.
    pub fn add_edge(&mut self, from: usize, to: usize, kind: DepEdge) {
        if from != to && self.edges.insert((from, to)) {
            self.graph
                .add_edge(NodeIndex::new(from), NodeIndex::new(to), kind);
        }
    }

    pub fn build(self) -> DependencyGraph {
        DependencyGraph { graph: self.graph }
    }
}

/// Build the dependency graph of a classified model.
pub fn build_dependency_graph(classification: &Classification) -> DependencyGraph {
    let value_defs = classification.value_definitions();
    let rate_defs = classification.rate_definitions();
    let mut builder = GraphBuilder::new(classification.equations.len());

    for (e, eq) in classification.equations.iter().enumerate() {
        for read in &eq.reads {
            match read {
                Read::Value(k) => {
                    if let Some(d) = value_defs[*k] {
                        builder.add_edge(d, e, DepEdge::Value);
                    }
                }
                Read::Rate(k) => {
                    if let Some(d) = rate_defs[*k] {
                        builder.add_edge(d, e, DepEdge::Rate);
                    }
                }
            }
        }
    }

    let graph = builder.build();
    log::debug!(
        "dependency graph: {} equations, {} edges",
        graph.equation_count(),
        graph.graph().edge_count()
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_dedups_edges() {
        let mut builder = GraphBuilder::new(3);
        builder.add_edge(0, 1, DepEdge::Value);
        builder.add_edge(0, 1, DepEdge::Value);
        builder.add_edge(2, 2, DepEdge::Value);
        builder.add_edge(1, 2, DepEdge::Rate);
        let graph = builder.build();
        assert_eq!(graph.graph().edge_count(), 2);
        assert_eq!(graph.dependencies(1), vec![0]);
        assert_eq!(graph.dependents(1), vec![2]);
        assert!(graph.dependencies(0).is_empty());
    }

    #[test]
    fn test_strongly_connected_components() {
        let mut builder = GraphBuilder::new(4);
        builder.add_edge(0, 1, DepEdge::Value);
        builder.add_edge(1, 2, DepEdge::Value);
        builder.add_edge(2, 1, DepEdge::Value);
        builder.add_edge(2, 3, DepEdge::Value);
        let mut sccs = builder.build().strongly_connected_components();
        sccs.sort();
        assert_eq!(sccs, vec![vec![0], vec![1, 2], vec![3]]);
    }
}

//! Analysis: equation trees, variable classification and the packaged
//! computation plan.

pub mod analyser;
pub mod analyser_model;
pub mod ast;
pub mod create_analyser_model;
pub mod external;
pub mod function_collector;
pub mod issue;
pub mod reference_checker;
pub mod repr_visitor;
pub mod variability;
pub mod visitor;

pub use analyser::Analyser;
pub use analyser_model::{
    AnalyserEquation, AnalyserModel, AnalyserVariable, CycleGroup, EquationType,
    InitialValueSlot, ModelType, VariableSlot, VariableType,
};
pub use ast::{AstId, AstKind, EquationAst};
pub use external::AnalyserExternalVariable;
pub use function_collector::{FunctionNeeds, HelperFunction};
pub use issue::{Issue, IssueReference, Severity};

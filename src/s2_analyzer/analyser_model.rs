//! Result of an analysis: the classified, ordered computation plan.
//!
//! An `AnalyserModel` is plain owned data. It never borrows from the input
//! model, so it stays usable after the model is dropped, and it is never
//! mutated once built: a new analysis produces a new `AnalyserModel`.

use super::ast::EquationAst;
use super::function_collector::FunctionNeeds;
use crate::s1_model::VariableId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Overall classification of an analysed model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Nothing to compute
    #[default]
    Unknown,
    /// Structurally unusable: bad variable of integration, bad derivative,
    /// bad initialisation or unresolved references
    Invalid,
    /// Algebraic equations only, solved by substitution
    Algebraic,
    /// Differential equations, solved by substitution
    Ode,
    /// Algebraic equations with at least one algebraic loop
    Nla,
    /// Differential equations with at least one algebraic loop
    Dae,
    Underconstrained,
    Overconstrained,
    UnsuitablyConstrained,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelType::Unknown => "unknown",
            ModelType::Invalid => "invalid",
            ModelType::Algebraic => "algebraic",
            ModelType::Ode => "ode",
            ModelType::Nla => "nla",
            ModelType::Dae => "dae",
            ModelType::Underconstrained => "underconstrained",
            ModelType::Overconstrained => "overconstrained",
            ModelType::UnsuitablyConstrained => "unsuitably constrained",
        };
        write!(f, "{}", s)
    }
}

/// Computational role of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    VariableOfIntegration,
    State,
    /// Literal initial value or literal-only equation
    Constant,
    /// Computed once from constants and other computed constants
    ComputedConstant,
    Algebraic,
    /// Supplied by the caller at evaluation time
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EquationType {
    /// No variable on the read side
    TrueConstant,
    /// Reads constants and computed constants only
    VariableBasedConstant,
    /// Defines the rate of a state
    Rate,
    Algebraic,
    /// Placeholder for a variable supplied by the caller
    External,
}

/// Where the value of a variable lives in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableSlot {
    Voi,
    State(usize),
    Rate(usize),
    Variable(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialValueSlot {
    /// Literal as it appears in the model
    Literal(String),
    /// Value of another (constant) variable
    Variable(VariableSlot),
}

/// A classified variable. Equivalent variables of the model share one
/// `AnalyserVariable`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyserVariable {
    pub(crate) kind: VariableType,
    pub(crate) index: usize,
    pub(crate) id: VariableId,
    pub(crate) component: String,
    pub(crate) name: String,
    pub(crate) units: String,
    pub(crate) initial_value: Option<InitialValueSlot>,
    pub(crate) equation: Option<usize>,
    pub(crate) equivalent: Vec<VariableId>,
}

impl AnalyserVariable {
    pub fn kind(&self) -> VariableType {
        self.kind
    }

    /// Position in the states array, the variables array, or 0 for the
    /// variable of integration.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The declared variable this entry is reported as.
    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn initial_value(&self) -> Option<&InitialValueSlot> {
        self.initial_value.as_ref()
    }

    /// Equation computing this variable (the rate equation for a state).
    pub fn equation(&self) -> Option<usize> {
        self.equation
    }

    /// All declared variables merged into this one, declaration order.
    pub fn equivalent_variables(&self) -> &[VariableId] {
        &self.equivalent
    }

    pub fn slot(&self) -> VariableSlot {
        match self.kind {
            VariableType::VariableOfIntegration => VariableSlot::Voi,
            VariableType::State => VariableSlot::State(self.index),
            _ => VariableSlot::Variable(self.index),
        }
    }
}

/// An equation of the computation plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyserEquation {
    pub(crate) kind: EquationType,
    #[serde(skip)]
    pub(crate) ast: EquationAst,
    pub(crate) component: String,
    pub(crate) dependencies: Vec<usize>,
    pub(crate) variable_dependencies: Vec<VariableSlot>,
    pub(crate) variable: Option<VariableSlot>,
    pub(crate) order: usize,
    pub(crate) cycle: Option<usize>,
    pub(crate) is_state_rate_based: bool,
    pub(crate) needed_for_rates: bool,
}

impl AnalyserEquation {
    pub fn kind(&self) -> EquationType {
        self.kind
    }

    pub fn ast(&self) -> &EquationAst {
        &self.ast
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Indices of the equations this one reads values from.
    pub fn dependencies(&self) -> &[usize] {
        &self.dependencies
    }

    /// Slots read by this equation, first occurrence order.
    pub fn variable_dependencies(&self) -> &[VariableSlot] {
        &self.variable_dependencies
    }

    /// Slot computed by this equation (`Rate` for a rate equation).
    pub fn variable(&self) -> Option<VariableSlot> {
        self.variable
    }

    pub fn is_rate(&self) -> bool {
        self.kind == EquationType::Rate
    }

    /// True if the equation reads the variable of integration, a state or a
    /// rate, directly or through its dependencies.
    pub fn is_state_rate_based(&self) -> bool {
        self.is_state_rate_based
    }

    /// Execution slot. Equations of one cycle group share it.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn cycle(&self) -> Option<usize> {
        self.cycle
    }

    /// True if `compute_rates` has to evaluate this equation.
    pub fn is_needed_for_rates(&self) -> bool {
        self.needed_for_rates
    }
}

/// Equations that have to be solved simultaneously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleGroup {
    pub(crate) equations: Vec<usize>,
    pub(crate) unknowns: Vec<VariableSlot>,
}

impl CycleGroup {
    /// Member equations, in plan order.
    pub fn equations(&self) -> &[usize] {
        &self.equations
    }

    /// Slots solved for, one per member equation.
    pub fn unknowns(&self) -> &[VariableSlot] {
        &self.unknowns
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyserModel {
    pub(crate) name: String,
    pub(crate) model_type: ModelType,
    pub(crate) valid: bool,
    pub(crate) voi: Option<AnalyserVariable>,
    pub(crate) states: Vec<AnalyserVariable>,
    pub(crate) variables: Vec<AnalyserVariable>,
    pub(crate) equations: Vec<AnalyserEquation>,
    pub(crate) cycles: Vec<CycleGroup>,
    #[serde(skip)]
    pub(crate) needs: FunctionNeeds,
    #[serde(skip)]
    pub(crate) slots: HashMap<VariableId, VariableSlot>,
    /// Equivalence class of each declared variable
    #[serde(skip)]
    pub(crate) classes: HashMap<VariableId, usize>,
}

impl AnalyserModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// True iff the analysis reported no error-severity issue.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn voi(&self) -> Option<&AnalyserVariable> {
        self.voi.as_ref()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[AnalyserVariable] {
        &self.states
    }

    pub fn state(&self, index: usize) -> Option<&AnalyserVariable> {
        self.states.get(index)
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[AnalyserVariable] {
        &self.variables
    }

    pub fn variable(&self, index: usize) -> Option<&AnalyserVariable> {
        self.variables.get(index)
    }

    pub fn equation_count(&self) -> usize {
        self.equations.len()
    }

    /// Equations in execution order.
    pub fn equations(&self) -> &[AnalyserEquation] {
        &self.equations
    }

    pub fn equation(&self, index: usize) -> Option<&AnalyserEquation> {
        self.equations.get(index)
    }

    pub fn cycles(&self) -> &[CycleGroup] {
        &self.cycles
    }

    pub fn has_external_variables(&self) -> bool {
        self.variables
            .iter()
            .any(|v| v.kind == VariableType::External)
    }

    pub fn needs(&self) -> &FunctionNeeds {
        &self.needs
    }

    /// Slot holding the value of a declared variable, equivalences applied.
    pub fn slot(&self, id: VariableId) -> Option<VariableSlot> {
        self.slots.get(&id).copied()
    }

    /// True if both declared variables are connected, directly or through a
    /// chain of connections. A variable is equivalent to itself.
    pub fn are_equivalent_variables(&self, first: VariableId, second: VariableId) -> bool {
        match (self.classes.get(&first), self.classes.get(&second)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Analysed variable behind a declared one.
    pub fn analyser_variable(&self, id: VariableId) -> Option<&AnalyserVariable> {
        self.slot_variable(self.slot(id)?)
    }

    /// Analysed variable behind a slot; a rate slot maps to its state.
    pub fn slot_variable(&self, slot: VariableSlot) -> Option<&AnalyserVariable> {
        match slot {
            VariableSlot::Voi => self.voi.as_ref(),
            VariableSlot::State(i) | VariableSlot::Rate(i) => self.states.get(i),
            VariableSlot::Variable(i) => self.variables.get(i),
        }
    }
}

//! Variables whose values are supplied by the caller.

use crate::s1_model::VariableId;

/// A variable computed outside the generated code, together with the
/// variables its value depends on. Dependencies only influence equation
/// ordering: they are computed before the external variable is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyserExternalVariable {
    variable: VariableId,
    dependencies: Vec<VariableId>,
}

impl AnalyserExternalVariable {
    pub fn new(variable: VariableId) -> Self {
        Self {
            variable,
            dependencies: Vec::new(),
        }
    }

    pub fn variable(&self) -> VariableId {
        self.variable
    }

    /// Add a dependency. The variable itself and duplicates are ignored.
    pub fn add_dependency(&mut self, dependency: VariableId) -> bool {
        if dependency == self.variable || self.dependencies.contains(&dependency) {
            return false;
        }
        self.dependencies.push(dependency);
        true
    }

    pub fn with_dependency(mut self, dependency: VariableId) -> Self {
        self.add_dependency(dependency);
        self
    }

    pub fn remove_dependency(&mut self, index: usize) -> bool {
        if index >= self.dependencies.len() {
            return false;
        }
        self.dependencies.remove(index);
        true
    }

    pub fn remove_dependency_variable(&mut self, dependency: VariableId) -> bool {
        match self.dependencies.iter().position(|d| *d == dependency) {
            Some(index) => self.remove_dependency(index),
            None => false,
        }
    }

    pub fn remove_all_dependencies(&mut self) {
        self.dependencies.clear();
    }

    pub fn contains_dependency(&self, dependency: VariableId) -> bool {
        self.dependencies.contains(&dependency)
    }

    pub fn dependency(&self, index: usize) -> Option<VariableId> {
        self.dependencies.get(index).copied()
    }

    pub fn dependencies(&self) -> &[VariableId] {
        &self.dependencies
    }

    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }
}

//! The `Analyser` object: the entry point of the analysis.

use super::analyser_model::AnalyserModel;
use super::create_analyser_model::create_analyser_model;
use super::external::AnalyserExternalVariable;
use super::issue::{Issue, IssueList, Severity};
use crate::s1_model::{Model, VariableId};

/// Analyses models and keeps the outcome of the latest analysis.
///
/// An `Analyser` is idle until [`Analyser::analyse_model`] is first called.
/// Each call replaces the previous model and issue list as a whole.
#[derive(Debug, Default, Clone)]
pub struct Analyser {
    externals: Vec<AnalyserExternalVariable>,
    issues: Vec<Issue>,
    model: Option<AnalyserModel>,
}

impl Analyser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyse `model`. The model is only read.
    pub fn analyse_model(&mut self, model: &Model) -> &AnalyserModel {
        log::debug!("analysing model '{}'", model.name);
        let mut issues = IssueList::new();
        let analysed = create_analyser_model(model, &self.externals, &mut issues);
        self.issues = issues.into_vec();
        if !self.issues.is_empty() {
            log::debug!(
                "model '{}': {} error(s), {} warning(s)",
                model.name,
                self.error_count(),
                self.warning_count()
            );
        }
        self.model.insert(analysed)
    }

    /// Result of the latest analysis, if any.
    pub fn model(&self) -> Option<&AnalyserModel> {
        self.model.as_ref()
    }

    // ===== Issues =====

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issue(&self, index: usize) -> Option<&Issue> {
        self.issues.get(index)
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    // ===== External variables =====

    /// Register a variable as supplied by the caller. Returns false if that
    /// variable is already registered.
    pub fn add_external_variable(&mut self, external: AnalyserExternalVariable) -> bool {
        if self.contains_external_variable(external.variable()) {
            return false;
        }
        self.externals.push(external);
        true
    }

    pub fn remove_external_variable(&mut self, index: usize) -> bool {
        if index >= self.externals.len() {
            return false;
        }
        self.externals.remove(index);
        true
    }

    pub fn remove_external_variable_by_name(
        &mut self,
        model: &Model,
        component: &str,
        variable: &str,
    ) -> bool {
        let Some(id) = model.variable_id(component, variable) else {
            return false;
        };
        match self.externals.iter().position(|e| e.variable() == id) {
            Some(index) => self.remove_external_variable(index),
            None => false,
        }
    }

    pub fn remove_all_external_variables(&mut self) {
        self.externals.clear();
    }

    pub fn contains_external_variable(&self, variable: VariableId) -> bool {
        self.externals.iter().any(|e| e.variable() == variable)
    }

    pub fn external_variable(&self, index: usize) -> Option<&AnalyserExternalVariable> {
        self.externals.get(index)
    }

    pub fn external_variable_count(&self) -> usize {
        self.externals.len()
    }
}

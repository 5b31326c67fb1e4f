//! Issues reported by the analyser.
//!
//! Analysis never fails with an `Err`: every problem becomes an [`Issue`] and
//! the caller decides what to do with the result by looking at the severity.

use crate::s1_model::VariableId;
use std::fmt;

/// Severity of an analysis issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The model can still be generated, e.g. an algebraic loop
    Warning,
    /// The model cannot be turned into a valid computation plan
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Entity an issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueReference {
    Variable(VariableId),
    /// Equation `index` of component `component`
    Equation { component: usize, index: usize },
    Component(usize),
    Connection(usize),
}

/// A problem found while analysing a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    pub reference: Option<IssueReference>,
}

impl Issue {
    pub fn error(message: String, reference: Option<IssueReference>) -> Self {
        Self {
            severity: Severity::Error,
            message,
            reference,
        }
    }

    pub fn warning(message: String, reference: Option<IssueReference>) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            reference,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Issues collected during one analysis
#[derive(Debug, Default, Clone)]
pub struct IssueList {
    issues: Vec<Issue>,
}

impl IssueList {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add(&mut self, issue: Issue) {
        match issue.severity {
            Severity::Error => log::debug!("analysis error: {}", issue.message),
            Severity::Warning => log::debug!("analysis warning: {}", issue.message),
        }
        self.issues.push(issue);
    }

    pub fn error(&mut self, message: String, reference: IssueReference) {
        self.add(Issue::error(message, Some(reference)));
    }

    pub fn warning(&mut self, message: String, reference: IssueReference) {
        self.add(Issue::warning(message, Some(reference)));
    }

    /// Check if there are any errors (not just warnings)
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    /// True if an error message containing `needle` was reported.
    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.issues
            .iter()
            .any(|i| i.is_error() && i.message.contains(needle))
    }

    pub fn as_slice(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_vec(self) -> Vec<Issue> {
        self.issues
    }
}

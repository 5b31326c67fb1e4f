//! Function-need collection.
//!
//! Generated code only defines the helper functions a model actually uses.
//! This module holds the fixed catalogue of such helpers and a visitor that
//! records which of them appear in a set of equations.

use super::analyser_model::AnalyserModel;
use super::ast::{AstId, AstKind, EquationAst};
use super::visitor::{walk, Visitor};
use paste::paste;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

macro_rules! helper_functions {
    ($($name:ident),*) => {
        paste! {
            /// Non-primitive functions a profile may have to define.
            ///
            /// Each variant shares its name with the `AstKind` that needs it.
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(rename_all = "snake_case")]
            pub enum HelperFunction {
                $($name,)*
            }

            impl HelperFunction {
                pub const ALL: &'static [HelperFunction] = &[$(HelperFunction::$name,)*];

                /// Helper needed by a node of the given kind, if any.
                pub fn from_kind(kind: AstKind) -> Option<Self> {
                    match kind {
                        $(AstKind::$name => Some(HelperFunction::$name),)*
                        _ => None,
                    }
                }
            }

            impl FunctionNeeds {
                $(
                    pub fn [<need_ $name:snake _function>](&self) -> bool {
                        self.contains(HelperFunction::$name)
                    }
                )*
            }

            impl AnalyserModel {
                $(
                    pub fn [<need_ $name:snake _function>](&self) -> bool {
                        self.needs().contains(HelperFunction::$name)
                    }
                )*
            }
        }
    };
}

helper_functions!(
    // Relational and logical operators
    Eq, Neq, Lt, Leq, Gt, Geq, And, Or, Xor, Not,
    // Arithmetic operators
    Min, Max,
    // Trigonometric operators
    Sec, Csc, Cot, Sech, Csch, Coth, Asec, Acsc, Acot, Asech, Acsch, Acoth
);

impl HelperFunction {
    pub fn is_relational_or_logical(self) -> bool {
        matches!(
            self,
            HelperFunction::Eq
                | HelperFunction::Neq
                | HelperFunction::Lt
                | HelperFunction::Leq
                | HelperFunction::Gt
                | HelperFunction::Geq
                | HelperFunction::And
                | HelperFunction::Or
                | HelperFunction::Xor
                | HelperFunction::Not
        )
    }
}

/// Set of helper functions used by a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionNeeds {
    needed: BTreeSet<HelperFunction>,
}

impl FunctionNeeds {
    pub fn contains(&self, function: HelperFunction) -> bool {
        self.needed.contains(&function)
    }

    pub fn insert(&mut self, function: HelperFunction) {
        self.needed.insert(function);
    }

    pub fn is_empty(&self) -> bool {
        self.needed.is_empty()
    }

    /// Needed helpers in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = HelperFunction> + '_ {
        self.needed.iter().copied()
    }
}

/// Visitor recording every helper-function tag it meets.
#[derive(Default)]
pub struct FunctionCollector {
    pub needs: FunctionNeeds,
}

impl Visitor for FunctionCollector {
    fn enter_any(&mut self, ast: &EquationAst, id: AstId) {
        if let Some(function) = HelperFunction::from_kind(ast.kind(id)) {
            self.needs.insert(function);
        }
    }
}

/// Scan all trees once and return the helpers they need.
pub fn collect_function_needs<'a, I>(asts: I) -> FunctionNeeds
where
    I: IntoIterator<Item = &'a EquationAst>,
{
    let mut collector = FunctionCollector::default();
    for ast in asts {
        walk(ast, &mut collector);
    }
    collector.needs
}

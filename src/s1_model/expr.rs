//! Equation mathematics as it arrives from the model snapshot.
//!
//! `Expr` mirrors content MathML: operator applications are n-ary and carry
//! their qualifiers (`bvar`, `degree`, `logbase`) inline. The analyser turns
//! each equation into a binary `EquationAst`.

use serde::{Deserialize, Serialize};

/// Operators that can appear in an `Expr::Apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // Relational and logical operators
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    And,
    Or,
    Xor,
    Not,

    // Arithmetic operators
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Abs,
    Exp,
    Ln,
    Ceiling,
    Floor,
    Min,
    Max,
    Rem,

    // Trigonometric operators
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Sinh,
    Cosh,
    Tanh,
    Sech,
    Csch,
    Coth,
    Asin,
    Acos,
    Atan,
    Asec,
    Acsc,
    Acot,
    Asinh,
    Acosh,
    Atanh,
    Asech,
    Acsch,
    Acoth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathConstant {
    True,
    False,
    E,
    Pi,
    Inf,
    Nan,
}

/// One `value if condition` branch of a piecewise expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub value: Expr,
    pub condition: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Reference to a variable of the enclosing component.
    Ci(String),
    /// Numeric literal.
    Cn(f64),
    Constant(MathConstant),
    Apply {
        op: Operator,
        args: Vec<Expr>,
    },
    /// Derivative of `ci` with respect to `bvar`.
    Diff {
        bvar: String,
        ci: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        degree: Option<f64>,
    },
    Root {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        degree: Option<Box<Expr>>,
        arg: Box<Expr>,
    },
    Log {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base: Option<Box<Expr>>,
        arg: Box<Expr>,
    },
    Piecewise {
        pieces: Vec<Piece>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn ci(name: &str) -> Self {
        Expr::Ci(name.to_string())
    }

    pub fn cn(value: f64) -> Self {
        Expr::Cn(value)
    }

    pub fn constant(constant: MathConstant) -> Self {
        Expr::Constant(constant)
    }

    pub fn apply(op: Operator, args: Vec<Expr>) -> Self {
        Expr::Apply { op, args }
    }

    pub fn unary(op: Operator, arg: Expr) -> Self {
        Expr::Apply {
            op,
            args: vec![arg],
        }
    }

    pub fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Self {
        Expr::Apply {
            op,
            args: vec![lhs, rhs],
        }
    }

    /// First-order derivative `d(ci)/d(bvar)`.
    pub fn diff(bvar: &str, ci: &str) -> Self {
        Expr::Diff {
            bvar: bvar.to_string(),
            ci: ci.to_string(),
            degree: None,
        }
    }

    pub fn root(degree: Option<Expr>, arg: Expr) -> Self {
        Expr::Root {
            degree: degree.map(Box::new),
            arg: Box::new(arg),
        }
    }

    pub fn log(base: Option<Expr>, arg: Expr) -> Self {
        Expr::Log {
            base: base.map(Box::new),
            arg: Box::new(arg),
        }
    }

    pub fn piecewise(pieces: Vec<(Expr, Expr)>, otherwise: Option<Expr>) -> Self {
        Expr::Piecewise {
            pieces: pieces
                .into_iter()
                .map(|(value, condition)| Piece { value, condition })
                .collect(),
            otherwise: otherwise.map(Box::new),
        }
    }
}

/// `lhs = rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    pub fn new(lhs: Expr, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }
}

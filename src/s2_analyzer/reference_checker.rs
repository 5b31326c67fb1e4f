//! Reference binding for equation mathematics.
//!
//! Converts every `Expr` of the model into an [`EquationAst`], resolving each
//! variable name against the variables declared in the equation's component.
//! Names that do not resolve are reported and left unbound (`variable()` is
//! `None`) so the rest of the analysis can carry on.
//!
//! Tree shapes produced here:
//!
//! * `lhs = rhs` becomes `Assignment(lhs, rhs)`.
//! * n-ary applications are balanced binary trees: `a+b+c` is
//!   `Plus(a, Plus(b, c))`, `a+b+c+d` is `Plus(Plus(a, b), Plus(c, d))`.
//! * relation chains are conjunctions: `a<b<c` is `And(Lt(a, b), Lt(b, c))`.
//! * unary operators only have a left child.
//! * `d(x)/d(t)` is `Diff(Bvar(Ci t [, Degree(Cn)]), Ci x)`.
//! * `Root(Degree(n), x)` or `Root(x)`, `Log(LogBase(b), x)` or `Log(x)`.
//! * piecewise is `Piecewise(Piece(value, cond), rest)` where `rest` is a
//!   nested `Piecewise`, a last `Piece`, an `Otherwise(value)` or nothing.

use super::ast::{AstId, AstKind, EquationAst};
use super::issue::{IssueList, IssueReference};
use crate::s1_model::{Component, Expr, MathConstant, Model, Operator, VariableId};

/// An equation of the model together with its bound expression tree.
#[derive(Debug, Clone)]
pub struct BoundEquation {
    /// Component owning the equation
    pub component: usize,
    /// Position of the equation within its component
    pub index: usize,
    pub ast: EquationAst,
}

impl BoundEquation {
    pub fn reference(&self) -> IssueReference {
        IssueReference::Equation {
            component: self.component,
            index: self.index,
        }
    }
}

/// Bind every equation of `model`, reporting unresolved variable names.
pub fn bind_equations(model: &Model, issues: &mut IssueList) -> Vec<BoundEquation> {
    let mut bound = Vec::with_capacity(model.equation_count());
    for (c, component) in model.components.iter().enumerate() {
        for (index, equation) in component.equations.iter().enumerate() {
            let mut builder = AstBuilder {
                ast: EquationAst::new(),
                component,
                component_index: c,
                equation_index: index,
                issues: &mut *issues,
            };
            let root = builder.ast.root();
            let lhs = builder.build(&equation.lhs);
            let rhs = builder.build(&equation.rhs);
            builder.ast.attach_left(root, lhs);
            builder.ast.attach_right(root, rhs);
            bound.push(BoundEquation {
                component: c,
                index,
                ast: builder.ast,
            });
        }
    }
    log::trace!("bound {} equations", bound.len());
    bound
}

/// Render a literal the way it appears in a `Cn` node.
pub fn number_literal(value: f64) -> String {
    format!("{:?}", value)
}

struct AstBuilder<'a> {
    ast: EquationAst,
    component: &'a Component,
    component_index: usize,
    equation_index: usize,
    issues: &'a mut IssueList,
}

impl AstBuilder<'_> {
    fn build(&mut self, expr: &Expr) -> AstId {
        match expr {
            Expr::Ci(name) => self.ci(name),
            Expr::Cn(value) => self.cn(*value),
            Expr::Constant(constant) => self.ast.add_node(constant_kind(*constant)),
            Expr::Apply { op, args } => self.apply(operator_kind(*op), args),
            Expr::Diff { bvar, ci, degree } => {
                let diff = self.ast.add_node(AstKind::Diff);
                let bvar_node = self.ast.add_node(AstKind::Bvar);
                let voi = self.ci(bvar);
                self.ast.attach_left(bvar_node, voi);
                if let Some(degree) = degree {
                    let degree_node = self.ast.add_node(AstKind::Degree);
                    let value = self.cn(*degree);
                    self.ast.attach_left(degree_node, value);
                    self.ast.attach_right(bvar_node, degree_node);
                }
                let state = self.ci(ci);
                self.ast.attach_left(diff, bvar_node);
                self.ast.attach_right(diff, state);
                diff
            }
            Expr::Root { degree, arg } => {
                self.qualified(AstKind::Root, AstKind::Degree, degree.as_deref(), arg)
            }
            Expr::Log { base, arg } => {
                self.qualified(AstKind::Log, AstKind::LogBase, base.as_deref(), arg)
            }
            Expr::Piecewise { pieces, otherwise } => {
                let mut rest = otherwise.as_deref().map(|value| {
                    let node = self.ast.add_node(AstKind::Otherwise);
                    let value = self.build(value);
                    self.ast.attach_left(node, value);
                    node
                });
                for (i, piece) in pieces.iter().enumerate().rev() {
                    let node = self.ast.add_node(AstKind::Piece);
                    let value = self.build(&piece.value);
                    let condition = self.build(&piece.condition);
                    self.ast.attach_left(node, value);
                    self.ast.attach_right(node, condition);
                    if i == 0 {
                        return self.join(AstKind::Piecewise, node, rest);
                    }
                    rest = Some(match rest {
                        Some(r) => self.join(AstKind::Piecewise, node, Some(r)),
                        None => node,
                    });
                }
                let node = self.ast.add_node(AstKind::Piecewise);
                if let Some(rest) = rest {
                    self.ast.attach_left(node, rest);
                }
                node
            }
        }
    }

    fn ci(&mut self, name: &str) -> AstId {
        let node = self.ast.add_node(AstKind::Ci);
        self.ast.set_value(node, name);
        match self.component.variable_index(name) {
            Some(v) => self
                .ast
                .set_variable(node, Some(VariableId::new(self.component_index, v))),
            None => self.issues.error(
                format!(
                    "Variable '{}' in component '{}' is referenced in an equation, but it is not defined anywhere.",
                    name, self.component.name
                ),
                IssueReference::Equation {
                    component: self.component_index,
                    index: self.equation_index,
                },
            ),
        }
        node
    }

    fn cn(&mut self, value: f64) -> AstId {
        let node = self.ast.add_node(AstKind::Cn);
        self.ast.set_value(node, &number_literal(value));
        node
    }

    /// Binary shape of an n-ary application. Operands are paired up as a
    /// balanced tree, so `a+b+c` is `Plus(a, Plus(b, c))` and the depth grows
    /// with the logarithm of the operand count. A relation over more than two
    /// operands is a chain: `a < b < c` becomes `And(Lt(a, b), Lt(b, c))`.
    fn apply(&mut self, kind: AstKind, args: &[Expr]) -> AstId {
        match args {
            [] => self.ast.add_node(kind),
            [only] => {
                let node = self.ast.add_node(kind);
                let only = self.build(only);
                self.ast.attach_left(node, only);
                node
            }
            _ if kind.is_relational() => {
                let links: Vec<AstId> = args
                    .windows(2)
                    .map(|pair| {
                        let node = self.ast.add_node(kind);
                        let lhs = self.build(&pair[0]);
                        let rhs = self.build(&pair[1]);
                        self.ast.attach_left(node, lhs);
                        self.ast.attach_right(node, rhs);
                        node
                    })
                    .collect();
                self.balanced(AstKind::And, &links)
            }
            _ => {
                let operands: Vec<AstId> = args.iter().map(|arg| self.build(arg)).collect();
                self.balanced(kind, &operands)
            }
        }
    }

    fn balanced(&mut self, kind: AstKind, operands: &[AstId]) -> AstId {
        match operands {
            [only] => *only,
            _ => {
                let (left, right) = operands.split_at(operands.len() / 2);
                let left = self.balanced(kind, left);
                let right = self.balanced(kind, right);
                self.join(kind, left, Some(right))
            }
        }
    }

    fn qualified(
        &mut self,
        kind: AstKind,
        qualifier: AstKind,
        qualifier_value: Option<&Expr>,
        arg: &Expr,
    ) -> AstId {
        let node = self.ast.add_node(kind);
        match qualifier_value {
            Some(value) => {
                let q = self.ast.add_node(qualifier);
                let value = self.build(value);
                self.ast.attach_left(q, value);
                let arg = self.build(arg);
                self.ast.attach_left(node, q);
                self.ast.attach_right(node, arg);
            }
            None => {
                let arg = self.build(arg);
                self.ast.attach_left(node, arg);
            }
        }
        node
    }

    fn join(&mut self, kind: AstKind, left: AstId, right: Option<AstId>) -> AstId {
        let node = self.ast.add_node(kind);
        self.ast.attach_left(node, left);
        if let Some(right) = right {
            self.ast.attach_right(node, right);
        }
        node
    }
}

fn constant_kind(constant: MathConstant) -> AstKind {
    match constant {
        MathConstant::True => AstKind::True,
        MathConstant::False => AstKind::False,
        MathConstant::E => AstKind::E,
        MathConstant::Pi => AstKind::Pi,
        MathConstant::Inf => AstKind::Inf,
        MathConstant::Nan => AstKind::Nan,
    }
}

fn operator_kind(op: Operator) -> AstKind {
    match op {
        Operator::Eq => AstKind::Eq,
        Operator::Neq => AstKind::Neq,
        Operator::Lt => AstKind::Lt,
        Operator::Leq => AstKind::Leq,
        Operator::Gt => AstKind::Gt,
        Operator::Geq => AstKind::Geq,
        Operator::And => AstKind::And,
        Operator::Or => AstKind::Or,
        Operator::Xor => AstKind::Xor,
        Operator::Not => AstKind::Not,
        Operator::Plus => AstKind::Plus,
        Operator::Minus => AstKind::Minus,
        Operator::Times => AstKind::Times,
        Operator::Divide => AstKind::Divide,
        Operator::Power => AstKind::Power,
        Operator::Abs => AstKind::Abs,
        Operator::Exp => AstKind::Exp,
        Operator::Ln => AstKind::Ln,
        Operator::Ceiling => AstKind::Ceiling,
        Operator::Floor => AstKind::Floor,
        Operator::Min => AstKind::Min,
        Operator::Max => AstKind::Max,
        Operator::Rem => AstKind::Rem,
        Operator::Sin => AstKind::Sin,
        Operator::Cos => AstKind::Cos,
        Operator::Tan => AstKind::Tan,
        Operator::Sec => AstKind::Sec,
        Operator::Csc => AstKind::Csc,
        Operator::Cot => AstKind::Cot,
        Operator::Sinh => AstKind::Sinh,
        Operator::Cosh => AstKind::Cosh,
        Operator::Tanh => AstKind::Tanh,
        Operator::Sech => AstKind::Sech,
        Operator::Csch => AstKind::Csch,
        Operator::Coth => AstKind::Coth,
        Operator::Asin => AstKind::Asin,
        Operator::Acos => AstKind::Acos,
        Operator::Atan => AstKind::Atan,
        Operator::Asec => AstKind::Asec,
        Operator::Acsc => AstKind::Acsc,
        Operator::Acot => AstKind::Acot,
        Operator::Asinh => AstKind::Asinh,
        Operator::Acosh => AstKind::Acosh,
        Operator::Atanh => AstKind::Atanh,
        Operator::Asech => AstKind::Asech,
        Operator::Acsch => AstKind::Acsch,
        Operator::Acoth => AstKind::Acoth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s1_model::Variable;

    fn single_equation_model(lhs: Expr, rhs: Expr) -> Model {
        Model::new("m").with_component(
            Component::new("c")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "metre"))
                .with_variable(Variable::new("a", "metre"))
                .with_variable(Variable::new("b", "metre"))
                .with_equation(lhs, rhs),
        )
    }

    #[test]
    fn test_undefined_reference() {
        let model = single_equation_model(
            Expr::ci("x"),
            Expr::binary(Operator::Plus, Expr::ci("y"), Expr::cn(1.0)),
        );
        let mut issues = IssueList::new();
        let bound = bind_equations(&model, &mut issues);

        assert_eq!(issues.error_count(), 1);
        assert!(issues.has_error_containing("Variable 'y' in component 'c'"));

        let ast = &bound[0].ast;
        let plus = ast.right_child(ast.root()).unwrap();
        let y = ast.left_child(plus).unwrap();
        assert_eq!(ast.value(y), "y");
        assert_eq!(ast.variable(y), None);
    }

    #[test]
    fn test_three_operands_nest_to_the_right() {
        let model = single_equation_model(
            Expr::ci("x"),
            Expr::apply(
                Operator::Plus,
                vec![Expr::ci("a"), Expr::ci("b"), Expr::cn(3.0)],
            ),
        );
        let mut issues = IssueList::new();
        let bound = bind_equations(&model, &mut issues);
        assert!(!issues.has_errors());

        let ast = &bound[0].ast;
        let root = ast.root();
        assert_eq!(ast.kind(root), AstKind::Assignment);
        let x = ast.left_child(root).unwrap();
        assert_eq!(ast.variable(x), Some(VariableId::new(0, 1)));

        let outer = ast.right_child(root).unwrap();
        assert_eq!(ast.kind(outer), AstKind::Plus);
        assert_eq!(ast.parent(outer), Some(root));
        let a = ast.left_child(outer).unwrap();
        assert_eq!(ast.variable(a), Some(VariableId::new(0, 2)));
        let inner = ast.right_child(outer).unwrap();
        assert_eq!(ast.kind(inner), AstKind::Plus);
        let three = ast.right_child(inner).unwrap();
        assert_eq!(ast.kind(three), AstKind::Cn);
        assert_eq!(ast.value(three), "3.0");
    }

    #[test]
    fn test_wide_sum_stays_shallow() {
        let terms: Vec<Expr> = (0..20_000).map(|i| Expr::cn(i as f64)).collect();
        let model = single_equation_model(Expr::ci("x"), Expr::apply(Operator::Plus, terms));
        let mut issues = IssueList::new();
        let bound = bind_equations(&model, &mut issues);
        assert!(!issues.has_errors());

        let ast = &bound[0].ast;
        let leaves: Vec<AstId> = ast
            .preorder()
            .into_iter()
            .filter(|id| ast.kind(*id) == AstKind::Cn)
            .collect();
        assert_eq!(leaves.len(), 20_000);
        let depth = leaves.iter().step_by(997).map(|id| ast.ancestors(*id).len()).max();
        assert!(depth.unwrap() <= 17, "depth {:?}", depth);
        assert_eq!(ast.value(leaves[0]), "0.0");
        assert_eq!(ast.value(leaves[19_999]), "19999.0");
    }

    #[test]
    fn test_relation_chain_is_a_conjunction() {
        let model = single_equation_model(
            Expr::ci("x"),
            Expr::apply(
                Operator::Lt,
                vec![Expr::ci("a"), Expr::ci("b"), Expr::cn(3.0)],
            ),
        );
        let mut issues = IssueList::new();
        let bound = bind_equations(&model, &mut issues);
        assert!(!issues.has_errors());

        let ast = &bound[0].ast;
        let and = ast.right_child(ast.root()).unwrap();
        assert_eq!(ast.kind(and), AstKind::And);
        let first = ast.left_child(and).unwrap();
        let second = ast.right_child(and).unwrap();
        assert_eq!(ast.kind(first), AstKind::Lt);
        assert_eq!(ast.kind(second), AstKind::Lt);
        let b1 = ast.right_child(first).unwrap();
        let b2 = ast.left_child(second).unwrap();
        assert_ne!(b1, b2);
        assert_eq!(ast.variable(b1), Some(VariableId::new(0, 3)));
        assert_eq!(ast.variable(b2), Some(VariableId::new(0, 3)));
        assert_eq!(ast.value(ast.right_child(second).unwrap()), "3.0");
    }

    #[test]
    fn test_diff_shape() {
        let model = single_equation_model(Expr::diff("t", "x"), Expr::ci("a"));
        let mut issues = IssueList::new();
        let bound = bind_equations(&model, &mut issues);
        let ast = &bound[0].ast;

        let diff = ast.left_child(ast.root()).unwrap();
        assert_eq!(ast.kind(diff), AstKind::Diff);
        let bvar = ast.left_child(diff).unwrap();
        assert_eq!(ast.kind(bvar), AstKind::Bvar);
        let t = ast.left_child(bvar).unwrap();
        assert_eq!(ast.variable(t), Some(VariableId::new(0, 0)));
        assert_eq!(ast.right_child(bvar), None);
        let x = ast.right_child(diff).unwrap();
        assert_eq!(ast.variable(x), Some(VariableId::new(0, 1)));
    }

    #[test]
    fn test_piecewise_shape() {
        let cond = |v: f64| Expr::binary(Operator::Lt, Expr::ci("a"), Expr::cn(v));
        let model = single_equation_model(
            Expr::ci("x"),
            Expr::piecewise(
                vec![(Expr::cn(1.0), cond(0.0)), (Expr::cn(2.0), cond(1.0))],
                None,
            ),
        );
        let mut issues = IssueList::new();
        let bound = bind_equations(&model, &mut issues);
        let ast = &bound[0].ast;

        let piecewise = ast.right_child(ast.root()).unwrap();
        assert_eq!(ast.kind(piecewise), AstKind::Piecewise);
        let first = ast.left_child(piecewise).unwrap();
        assert_eq!(ast.kind(first), AstKind::Piece);
        let second = ast.right_child(piecewise).unwrap();
        assert_eq!(ast.kind(second), AstKind::Piece);
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(number_literal(1.0), "1.0");
        assert_eq!(number_literal(0.25), "0.25");
        assert_eq!(number_literal(1e-10), "1e-10");
    }
}

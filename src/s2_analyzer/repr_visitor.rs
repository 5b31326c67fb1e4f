use super::ast::{AstId, AstKind, EquationAst};
use super::visitor::{walk, Visitor};
use std::collections::HashMap;

/// Builds a compact infix rendering of an equation for messages and logs.
#[derive(Default)]
pub struct ReprVisitor {
    pub repr: HashMap<AstId, String>,
}

impl ReprVisitor {
    fn child(&self, id: Option<AstId>) -> String {
        id.and_then(|id| self.repr.get(&id).cloned())
            .unwrap_or_default()
    }
}

impl Visitor for ReprVisitor {
    fn exit_any(&mut self, ast: &EquationAst, id: AstId) {
        let l = self.child(ast.left_child(id));
        let r = self.child(ast.right_child(id));
        let has_right = ast.right_child(id).is_some();
        let kind = ast.kind(id);
        let s = match kind {
            AstKind::Ci | AstKind::Cn => ast.value(id).to_string(),
            AstKind::Assignment => format!("{} = {}", l, r),
            AstKind::Plus | AstKind::Minus if !has_right => format!("{}{}", infix(kind), l),
            AstKind::Not => format!("not {}", l),
            AstKind::Eq
            | AstKind::Neq
            | AstKind::Lt
            | AstKind::Leq
            | AstKind::Gt
            | AstKind::Geq
            | AstKind::And
            | AstKind::Or
            | AstKind::Xor
            | AstKind::Plus
            | AstKind::Minus
            | AstKind::Times
            | AstKind::Divide
            | AstKind::Power => format!("({} {} {})", l, infix(kind), r),
            AstKind::Diff => format!("d{}/d{}", r, l),
            AstKind::Bvar | AstKind::Degree | AstKind::LogBase | AstKind::Otherwise => l,
            AstKind::Piece => format!("{} if {}", l, r),
            AstKind::Piecewise if has_right => format!("{{{}, {}}}", l, r),
            AstKind::Piecewise => format!("{{{}}}", l),
            AstKind::True => "true".to_string(),
            AstKind::False => "false".to_string(),
            AstKind::E => "e".to_string(),
            AstKind::Pi => "pi".to_string(),
            AstKind::Inf => "inf".to_string(),
            AstKind::Nan => "nan".to_string(),
            _ if has_right => format!("{}({}, {})", function_name(kind), l, r),
            _ => format!("{}({})", function_name(kind), l),
        };
        self.repr.insert(id, s);
    }
}

fn infix(kind: AstKind) -> &'static str {
    match kind {
        AstKind::Eq => "==",
        AstKind::Neq => "!=",
        AstKind::Lt => "<",
        AstKind::Leq => "<=",
        AstKind::Gt => ">",
        AstKind::Geq => ">=",
        AstKind::And => "and",
        AstKind::Or => "or",
        AstKind::Xor => "xor",
        AstKind::Plus => "+",
        AstKind::Minus => "-",
        AstKind::Times => "*",
        AstKind::Divide => "/",
        AstKind::Power => "^",
        _ => "?",
    }
}

fn function_name(kind: AstKind) -> String {
    format!("{:?}", kind).to_lowercase()
}

/// Infix text of the whole equation.
pub fn repr(ast: &EquationAst) -> String {
    let mut visitor = ReprVisitor::default();
    walk(ast, &mut visitor);
    visitor.repr.remove(&ast.root()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s1_model::{Component, Expr, Model, Operator, Variable};
    use crate::s2_analyzer::issue::IssueList;
    use crate::s2_analyzer::reference_checker::bind_equations;

    fn repr_of(lhs: Expr, rhs: Expr) -> String {
        let model = Model::new("m").with_component(
            Component::new("c")
                .with_variable(Variable::new("t", "second"))
                .with_variable(Variable::new("x", "metre"))
                .with_variable(Variable::new("a", "metre"))
                .with_equation(lhs, rhs),
        );
        let bound = bind_equations(&model, &mut IssueList::new());
        repr(&bound[0].ast)
    }

    #[test]
    fn test_repr_arithmetic() {
        let s = repr_of(
            Expr::ci("x"),
            Expr::apply(
                Operator::Times,
                vec![Expr::ci("a"), Expr::cn(2.0), Expr::ci("t")],
            ),
        );
        assert_eq!(s, "x = (a * (2.0 * t))");
    }

    #[test]
    fn test_repr_diff_and_functions() {
        let s = repr_of(
            Expr::diff("t", "x"),
            Expr::unary(Operator::Sin, Expr::unary(Operator::Minus, Expr::ci("a"))),
        );
        assert_eq!(s, "dx/dt = sin(-a)");
    }
}

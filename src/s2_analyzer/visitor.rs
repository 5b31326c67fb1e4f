//! Read-only traversal of an [`EquationAst`].
//!
//! `walk` visits every node reachable from the root in pre-order and calls
//! `enter_any`, the kind specific `enter_*` hook, recurses into the left then
//! right child, and finally calls `exit_*` and `exit_any`. Hooks default to
//! no-ops so visitors only implement what they need.

use super::ast::{for_each_ast_kind, AstId, AstKind, EquationAst};
use paste::paste;

macro_rules! define_visitor {
    ($($name:ident),*) => {
        paste! {
            #[allow(unused_variables)]
            pub trait Visitor {
                fn enter_any(&mut self, ast: &EquationAst, id: AstId) {}
                fn exit_any(&mut self, ast: &EquationAst, id: AstId) {}
                $(
                    fn [<enter_ $name:snake>](&mut self, ast: &EquationAst, id: AstId) {}
                    fn [<exit_ $name:snake>](&mut self, ast: &EquationAst, id: AstId) {}
                )*
            }

            fn enter_kind<V: Visitor + ?Sized>(visitor: &mut V, ast: &EquationAst, id: AstId) {
                match ast.kind(id) {
                    $(AstKind::$name => visitor.[<enter_ $name:snake>](ast, id),)*
                }
            }

            fn exit_kind<V: Visitor + ?Sized>(visitor: &mut V, ast: &EquationAst, id: AstId) {
                match ast.kind(id) {
                    $(AstKind::$name => visitor.[<exit_ $name:snake>](ast, id),)*
                }
            }
        }
    };
}

for_each_ast_kind!(define_visitor);

/// Walk the tree reachable from the root of `ast`.
pub fn walk<V: Visitor + ?Sized>(ast: &EquationAst, visitor: &mut V) {
    let mut seen = vec![false; ast.node_count()];
    walk_node(ast, ast.root(), visitor, &mut seen);
}

fn walk_node<V: Visitor + ?Sized>(
    ast: &EquationAst,
    id: AstId,
    visitor: &mut V,
    seen: &mut [bool],
) {
    // child links edited into a loop would otherwise recurse forever
    if seen[id.index()] {
        return;
    }
    seen[id.index()] = true;

    visitor.enter_any(ast, id);
    enter_kind(visitor, ast, id);
    if let Some(left) = ast.left_child(id) {
        walk_node(ast, left, visitor, seen);
    }
    if let Some(right) = ast.right_child(id) {
        walk_node(ast, right, visitor, seen);
    }
    exit_kind(visitor, ast, id);
    visitor.exit_any(ast, id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
    }

    impl Visitor for Trace {
        fn enter_ci(&mut self, ast: &EquationAst, id: AstId) {
            self.events.push(format!("ci {}", ast.value(id)));
        }

        fn exit_plus(&mut self, _ast: &EquationAst, _id: AstId) {
            self.events.push("exit plus".to_string());
        }

        fn enter_log_base(&mut self, _ast: &EquationAst, _id: AstId) {
            self.events.push("logbase".to_string());
        }
    }

    #[test]
    fn test_walk_order() {
        let mut ast = EquationAst::new();
        let root = ast.root();
        ast.set_kind(root, AstKind::Plus);
        let a = ast.add_node(AstKind::Ci);
        ast.set_value(a, "a");
        let b = ast.add_node(AstKind::Ci);
        ast.set_value(b, "b");
        ast.attach_left(root, a);
        ast.attach_right(root, b);

        let mut trace = Trace::default();
        walk(&ast, &mut trace);
        assert_eq!(trace.events, vec!["ci a", "ci b", "exit plus"]);
    }

    #[test]
    fn test_snake_case_hooks() {
        let mut ast = EquationAst::new();
        let root = ast.root();
        ast.set_kind(root, AstKind::Log);
        let base = ast.add_node(AstKind::LogBase);
        ast.attach_left(root, base);

        let mut trace = Trace::default();
        walk(&ast, &mut trace);
        assert_eq!(trace.events, vec!["logbase"]);
    }
}

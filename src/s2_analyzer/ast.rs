//! Expression tree for one equation.
//!
//! Nodes live in an arena owned by their `EquationAst` and are addressed by
//! `AstId`. Children are owning links in the sense that a node is part of the
//! equation iff it is reachable from the root through left/right links.
//! Parent links are plain indices used for navigation only, so reassigning
//! them can never keep a subtree alive or form an ownership cycle.
//!
//! A node may be made its own parent. This is accepted as a structurally
//! inert self-reference: nothing in the analyser walks parent links, and
//! [`EquationAst::ancestors`] stops as soon as it revisits a node.

use crate::s1_model::VariableId;
use serde::{Deserialize, Serialize};

/// Invokes `$m!` with every node kind, grouped the same way the enum is.
macro_rules! for_each_ast_kind {
    ($m:ident) => {
        $m!(
            // Equation
            Assignment,
            // Relational and logical operators
            Eq, Neq, Lt, Leq, Gt, Geq, And, Or, Xor, Not,
            // Arithmetic operators
            Plus, Minus, Times, Divide, Power, Root, Abs, Exp, Ln, Log, Ceiling, Floor, Min,
            Max, Rem,
            // Calculus elements
            Diff,
            // Trigonometric operators
            Sin, Cos, Tan, Sec, Csc, Cot, Sinh, Cosh, Tanh, Sech, Csch, Coth, Asin, Acos, Atan,
            Asec, Acsc, Acot, Asinh, Acosh, Atanh, Asech, Acsch, Acoth,
            // Piecewise statement
            Piecewise, Piece, Otherwise,
            // Token elements
            Ci, Cn,
            // Qualifier elements
            Degree, LogBase, Bvar,
            // Constants
            True, False, E, Pi, Inf, Nan
        );
    };
}

pub(crate) use for_each_ast_kind;

macro_rules! define_ast_kind {
    ($($name:ident),*) => {
        /// Tag of an expression tree node.
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum AstKind {
            #[default]
            $($name,)*
        }

        impl AstKind {
            pub const ALL: &'static [AstKind] = &[$(AstKind::$name,)*];
        }
    };
}

for_each_ast_kind!(define_ast_kind);

impl AstKind {
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            AstKind::Eq | AstKind::Neq | AstKind::Lt | AstKind::Leq | AstKind::Gt | AstKind::Geq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(
            self,
            AstKind::And | AstKind::Or | AstKind::Xor | AstKind::Not
        )
    }
}

/// Handle of a node inside one `EquationAst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AstId(usize);

impl AstId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AstNode {
    kind: AstKind,
    value: String,
    variable: Option<VariableId>,
    parent: Option<AstId>,
    left: Option<AstId>,
    right: Option<AstId>,
}

/// Arena-backed binary expression tree of one equation.
///
/// All accessors panic when handed an `AstId` minted by another tree.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationAst {
    nodes: Vec<AstNode>,
    root: AstId,
}

impl Default for EquationAst {
    fn default() -> Self {
        Self::new()
    }
}

impl EquationAst {
    /// A tree made of a single default node: an `Assignment` with an empty
    /// value, no variable, no parent and no children.
    pub fn new() -> Self {
        Self {
            nodes: vec![AstNode::default()],
            root: AstId(0),
        }
    }

    pub fn root(&self) -> AstId {
        self.root
    }

    pub fn set_root(&mut self, id: AstId) {
        self.check(id);
        self.root = id;
    }

    /// Add a detached node of the given kind and return its handle.
    pub fn add_node(&mut self, kind: AstKind) -> AstId {
        self.nodes.push(AstNode {
            kind,
            ..Default::default()
        });
        AstId(self.nodes.len() - 1)
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: AstId) -> AstKind {
        self.nodes[id.0].kind
    }

    pub fn set_kind(&mut self, id: AstId, kind: AstKind) {
        self.nodes[id.0].kind = kind;
    }

    pub fn value(&self, id: AstId) -> &str {
        &self.nodes[id.0].value
    }

    pub fn set_value(&mut self, id: AstId, value: &str) {
        self.nodes[id.0].value = value.to_string();
    }

    pub fn variable(&self, id: AstId) -> Option<VariableId> {
        self.nodes[id.0].variable
    }

    pub fn set_variable(&mut self, id: AstId, variable: Option<VariableId>) {
        self.nodes[id.0].variable = variable;
    }

    pub fn parent(&self, id: AstId) -> Option<AstId> {
        self.nodes[id.0].parent
    }

    /// Set the parent link of `id`. `Some(id)` itself is accepted.
    pub fn set_parent(&mut self, id: AstId, parent: Option<AstId>) {
        if let Some(parent) = parent {
            self.check(parent);
        }
        self.nodes[id.0].parent = parent;
    }

    pub fn left_child(&self, id: AstId) -> Option<AstId> {
        self.nodes[id.0].left
    }

    /// Set or clear the left child of `id`. Clearing drops the subtree from
    /// the equation: it stays in the arena but is no longer reachable.
    pub fn set_left_child(&mut self, id: AstId, child: Option<AstId>) {
        if let Some(child) = child {
            self.check(child);
        }
        self.nodes[id.0].left = child;
    }

    pub fn right_child(&self, id: AstId) -> Option<AstId> {
        self.nodes[id.0].right
    }

    /// Set or clear the right child of `id`, see [`Self::set_left_child`].
    pub fn set_right_child(&mut self, id: AstId, child: Option<AstId>) {
        if let Some(child) = child {
            self.check(child);
        }
        self.nodes[id.0].right = child;
    }

    /// Attach `child` as the left child of `parent` and point it back.
    pub fn attach_left(&mut self, parent: AstId, child: AstId) {
        self.set_left_child(parent, Some(child));
        self.set_parent(child, Some(parent));
    }

    /// Attach `child` as the right child of `parent` and point it back.
    pub fn attach_right(&mut self, parent: AstId, child: AstId) {
        self.set_right_child(parent, Some(child));
        self.set_parent(child, Some(parent));
    }

    /// Parent chain of `id`, nearest first. Stops on the first revisited
    /// node so self-parenting and parent loops terminate.
    pub fn ancestors(&self, id: AstId) -> Vec<AstId> {
        let mut seen = vec![false; self.nodes.len()];
        seen[id.0] = true;
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            if seen[p.0] {
                break;
            }
            seen[p.0] = true;
            chain.push(p);
            current = self.parent(p);
        }
        chain
    }

    /// Nodes reachable from the root, in pre-order (node, left, right).
    /// Each node is yielded at most once even if child links were edited
    /// into a loop.
    pub fn preorder(&self) -> Vec<AstId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if seen[id.0] {
                continue;
            }
            seen[id.0] = true;
            order.push(id);
            if let Some(right) = self.right_child(id) {
                stack.push(right);
            }
            if let Some(left) = self.left_child(id) {
                stack.push(left);
            }
        }
        order
    }

    fn check(&self, id: AstId) {
        assert!(
            id.0 < self.nodes.len(),
            "node {:?} does not belong to this tree",
            id
        );
    }
}

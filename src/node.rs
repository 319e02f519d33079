use crate::reference::ExprId;
use crate::types::ExprKind;
use crate::utils::{pairing3, zigzag, MyHash};

/// A node of the expression DAG, as stored in the unique table.
///
/// Children are handles into the same table. `Stripe::factor` and `Sum::rhs`
/// always refer to `Constant` nodes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExprNode {
    Constant(i64),
    Dim(u32),
    Symbol(u32),
    Stripe { var: ExprId, factor: ExprId },
    Neg { var: ExprId },
    Sum { lhs: ExprId, rhs: ExprId },
    Diff { lhs: ExprId, rhs: ExprId },
}

impl ExprNode {
    pub fn kind(&self) -> ExprKind {
        match self {
            ExprNode::Constant(_) => ExprKind::Constant,
            ExprNode::Dim(_) => ExprKind::Dim,
            ExprNode::Symbol(_) => ExprKind::Symbol,
            ExprNode::Stripe { .. } => ExprKind::Stripe,
            ExprNode::Neg { .. } => ExprKind::Neg,
            ExprNode::Sum { .. } => ExprKind::Sum,
            ExprNode::Diff { .. } => ExprKind::Diff,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.kind().is_positive()
    }
    pub fn is_varying(&self) -> bool {
        self.kind().is_varying()
    }
    pub fn is_input(&self) -> bool {
        self.kind().is_input()
    }
}

impl MyHash for ExprNode {
    fn hash(&self) -> u64 {
        let tag = self.kind().tag();
        let (a, b) = match *self {
            ExprNode::Constant(value) => (zigzag(value), 0),
            ExprNode::Dim(position) | ExprNode::Symbol(position) => (position as u64, 0),
            ExprNode::Stripe { var, factor } => (var.hash(), factor.hash()),
            ExprNode::Neg { var } => (var.hash(), 0),
            ExprNode::Sum { lhs, rhs } | ExprNode::Diff { lhs, rhs } => (lhs.hash(), rhs.hash()),
        };
        pairing3(tag, a, b)
    }
}

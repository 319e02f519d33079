//! Debug utilities for inspecting expressions.
//!
//! Rendering conventions: dimensions print as `d0`, symbols as `s0`, stripes
//! as `x # C`, and sums with negative constants as `x - C`. These strings are
//! meant for logs and test failure messages, not for parsing.

use std::collections::HashSet;
use std::fmt;

use crate::manager::SdbmManager;
use crate::node::ExprNode;
use crate::reference::ExprId;
use crate::types::ExprKind;

/// Display adapter for an expression, see [`SdbmManager::display`].
pub struct ExprDisplay<'a> {
    mgr: &'a SdbmManager,
    expr: ExprId,
}

impl ExprDisplay<'_> {
    fn operand(&self, f: &mut fmt::Formatter<'_>, e: ExprId) -> fmt::Result {
        let needs_parens = matches!(self.mgr.kind(e), ExprKind::Sum | ExprKind::Diff);
        if needs_parens {
            write!(f, "({})", self.mgr.display(e))
        } else {
            write!(f, "{}", self.mgr.display(e))
        }
    }
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mgr.node(self.expr) {
            ExprNode::Constant(value) => write!(f, "{}", value),
            ExprNode::Dim(position) => write!(f, "d{}", position),
            ExprNode::Symbol(position) => write!(f, "s{}", position),
            ExprNode::Stripe { var, factor } => {
                write!(f, "{} # {}", self.mgr.display(var), self.mgr.display(factor))
            }
            ExprNode::Neg { var } => match self.mgr.kind(var) {
                ExprKind::Stripe => write!(f, "-({})", self.mgr.display(var)),
                _ => write!(f, "-{}", self.mgr.display(var)),
            },
            ExprNode::Sum { lhs, rhs } => {
                let value = self.mgr.constant_value(rhs);
                if value < 0 {
                    write!(f, "{} - {}", self.mgr.display(lhs), value.unsigned_abs())
                } else {
                    write!(f, "{} + {}", self.mgr.display(lhs), value)
                }
            }
            ExprNode::Diff { lhs, rhs } => {
                write!(f, "{} - ", self.mgr.display(lhs))?;
                self.operand(f, rhs)
            }
        }
    }
}

impl SdbmManager {
    pub fn display(&self, e: ExprId) -> ExprDisplay<'_> {
        ExprDisplay { mgr: self, expr: e }
    }

    /// Render an expression as a human-readable string.
    pub fn format_expr(&self, e: ExprId) -> String {
        self.display(e).to_string()
    }

    /// All expressions reachable from `root`, children before parents.
    pub fn descendants(&self, root: ExprId) -> Vec<ExprId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.collect_descendants(root, &mut visited, &mut order);
        order
    }

    fn collect_descendants(&self, e: ExprId, visited: &mut HashSet<ExprId>, order: &mut Vec<ExprId>) {
        if !visited.insert(e) {
            return;
        }
        match self.node(e) {
            ExprNode::Constant(_) | ExprNode::Dim(_) | ExprNode::Symbol(_) => {}
            ExprNode::Neg { var } => self.collect_descendants(var, visited, order),
            ExprNode::Stripe { var: lhs, factor: rhs } | ExprNode::Sum { lhs, rhs } | ExprNode::Diff { lhs, rhs } => {
                self.collect_descendants(lhs, visited, order);
                self.collect_descendants(rhs, visited, order);
            }
        }
        order.push(e);
    }
}

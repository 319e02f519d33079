//! The expression manager: owner of the unique table.
//!
//! Every expression lives in the [`SdbmManager`] that created it. The manager hands out
//! lightweight [`ExprId`] handles; since the table stores each structurally distinct node
//! exactly once, comparing two handles is the same as comparing the expressions.
//!
//! This module contains the store itself, the raw variant constructors and the
//! capability/narrowing queries. The folding arithmetic lives in [`builder`][crate::builder].
//!
//! # Raw constructors
//!
//! The `mk_*` constructors intern a node exactly as requested, after checking the
//! capability preconditions of its fields. They do **not** fold. Client code should prefer
//! [`add`][SdbmManager::add], [`subtract`][SdbmManager::subtract],
//! [`negate`][SdbmManager::negate] and [`stripe`][SdbmManager::stripe], which always return
//! normal forms.

use std::cell::RefCell;
use std::fmt::Debug;

use log::debug;

use crate::node::ExprNode;
use crate::reference::ExprId;
use crate::table::Table;
use crate::types::ExprKind;

/// Configuration of the unique table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdbmConfig {
    /// Initial number of buckets, as a power of two.
    pub table_bits: usize,
    /// Average chain length that triggers a rehash.
    pub max_load: usize,
}

impl Default for SdbmConfig {
    fn default() -> Self {
        Self {
            table_bits: 12,
            max_load: 2,
        }
    }
}

impl SdbmConfig {
    pub fn with_table_bits(mut self, table_bits: usize) -> Self {
        self.table_bits = table_bits.min(24);
        self
    }

    pub fn with_max_load(mut self, max_load: usize) -> Self {
        self.max_load = max_load.max(1);
        self
    }
}

pub struct SdbmManager {
    table: RefCell<Table<ExprNode>>,
}

impl SdbmManager {
    pub fn new() -> Self {
        Self::with_config(SdbmConfig::default())
    }

    pub fn with_config(config: SdbmConfig) -> Self {
        debug!("SdbmManager::with_config({:?})", config);
        Self {
            table: RefCell::new(Table::new(config.table_bits, config.max_load)),
        }
    }
}

impl Default for SdbmManager {
    fn default() -> Self {
        SdbmManager::new()
    }
}

impl Debug for SdbmManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.borrow();
        f.debug_struct("SdbmManager")
            .field("nodes", &table.len())
            .field("buckets", &table.num_buckets())
            .finish()
    }
}

// Store
impl SdbmManager {
    /// Return the canonical handle for `node`, creating it on first request.
    pub fn intern(&self, node: ExprNode) -> ExprId {
        let (index, fresh) = self.table.borrow_mut().put(node);
        let id = ExprId::new(index as u32);
        if fresh {
            debug!("intern: {:?} -> {}", node, id);
        }
        id
    }

    /// Number of distinct expressions created so far.
    pub fn num_nodes(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn node(&self, e: ExprId) -> ExprNode {
        assert!(e.is_valid(), "Invalid expression handle");
        self.table.borrow()[e.index()]
    }

    pub fn kind(&self, e: ExprId) -> ExprKind {
        self.node(e).kind()
    }
}

// Leaf constructors
impl SdbmManager {
    pub fn constant(&self, value: i64) -> ExprId {
        self.intern(ExprNode::Constant(value))
    }

    pub fn zero(&self) -> ExprId {
        self.constant(0)
    }

    pub fn dim(&self, position: u32) -> ExprId {
        self.intern(ExprNode::Dim(position))
    }

    pub fn symbol(&self, position: u32) -> ExprId {
        self.intern(ExprNode::Symbol(position))
    }
}

// Raw constructors
impl SdbmManager {
    /// Intern `Stripe(var, factor)` without folding.
    ///
    /// # Panics
    ///
    /// Panics if `var` is not positive, if `factor` is not a constant, or if the factor is not
    /// strictly positive.
    pub fn mk_stripe(&self, var: ExprId, factor: ExprId) -> ExprId {
        let value = match self.as_constant(factor) {
            Some(value) => value,
            None => panic!("Stripe factor must be a constant, got {}", self.kind(factor)),
        };
        assert!(value > 0, "non-positive stripe factor: {}", value);
        assert!(self.is_positive(var), "Stripe variable must be positive, got {}", self.kind(var));
        self.intern(ExprNode::Stripe { var, factor })
    }

    /// Intern `Neg(var)` without folding.
    pub fn mk_neg(&self, var: ExprId) -> ExprId {
        assert!(self.is_positive(var), "Negated expression must be positive, got {}", self.kind(var));
        self.intern(ExprNode::Neg { var })
    }

    /// Intern `Sum(lhs, rhs)` without folding.
    pub fn mk_sum(&self, lhs: ExprId, rhs: ExprId) -> ExprId {
        assert!(self.is_varying(lhs), "Sum lhs must be varying, got {}", self.kind(lhs));
        assert_eq!(self.kind(rhs), ExprKind::Constant, "Sum rhs must be a constant");
        self.intern(ExprNode::Sum { lhs, rhs })
    }

    /// Intern `Diff(lhs, rhs)` without folding.
    pub fn mk_diff(&self, lhs: ExprId, rhs: ExprId) -> ExprId {
        assert!(self.is_varying(lhs), "Diff lhs must be varying, got {}", self.kind(lhs));
        assert!(self.is_varying(rhs), "Diff rhs must be varying, got {}", self.kind(rhs));
        self.intern(ExprNode::Diff { lhs, rhs })
    }
}

// Capability and narrowing queries
impl SdbmManager {
    pub fn is_positive(&self, e: ExprId) -> bool {
        self.kind(e).is_positive()
    }
    pub fn is_varying(&self, e: ExprId) -> bool {
        self.kind(e).is_varying()
    }
    pub fn is_input(&self, e: ExprId) -> bool {
        self.kind(e).is_input()
    }

    pub fn as_constant(&self, e: ExprId) -> Option<i64> {
        match self.node(e) {
            ExprNode::Constant(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_dim(&self, e: ExprId) -> Option<u32> {
        match self.node(e) {
            ExprNode::Dim(position) => Some(position),
            _ => None,
        }
    }

    pub fn as_symbol(&self, e: ExprId) -> Option<u32> {
        match self.node(e) {
            ExprNode::Symbol(position) => Some(position),
            _ => None,
        }
    }

    /// Returns `(var, factor)` of a stripe, where `factor` is a constant expression.
    pub fn as_stripe(&self, e: ExprId) -> Option<(ExprId, ExprId)> {
        match self.node(e) {
            ExprNode::Stripe { var, factor } => Some((var, factor)),
            _ => None,
        }
    }

    pub fn as_neg(&self, e: ExprId) -> Option<ExprId> {
        match self.node(e) {
            ExprNode::Neg { var } => Some(var),
            _ => None,
        }
    }

    /// Returns `(lhs, rhs)` of a sum, where `rhs` is a constant expression.
    pub fn as_sum(&self, e: ExprId) -> Option<(ExprId, ExprId)> {
        match self.node(e) {
            ExprNode::Sum { lhs, rhs } => Some((lhs, rhs)),
            _ => None,
        }
    }

    pub fn as_diff(&self, e: ExprId) -> Option<(ExprId, ExprId)> {
        match self.node(e) {
            ExprNode::Diff { lhs, rhs } => Some((lhs, rhs)),
            _ => None,
        }
    }

    /// Value of a stripe factor or sum constant.
    pub(crate) fn constant_value(&self, e: ExprId) -> i64 {
        match self.as_constant(e) {
            Some(value) => value,
            None => panic!("Expected a constant, got {}", self.kind(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_constant() {
        let mgr = SdbmManager::default();
        let c = mgr.constant(42);
        assert_eq!(mgr.as_constant(c), Some(42));
        assert_eq!(c, mgr.constant(42));
        assert_ne!(c, mgr.constant(43));
        assert_eq!(mgr.kind(c), ExprKind::Constant);
    }

    #[test]
    fn test_dim() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        assert_eq!(mgr.as_dim(d0), Some(0));
        assert_eq!(d0, mgr.dim(0));
        assert!(mgr.is_input(d0));
        assert!(mgr.is_positive(d0));
        assert!(mgr.is_varying(d0));

        let s0 = mgr.symbol(0);
        assert_ne!(d0, s0);
        assert_eq!(mgr.as_symbol(d0), None);
    }

    #[test]
    fn test_symbol() {
        let mgr = SdbmManager::default();
        let s0 = mgr.symbol(0);
        assert_eq!(mgr.as_symbol(s0), Some(0));
        assert_eq!(s0, mgr.symbol(0));
        assert!(mgr.is_input(s0));
        assert_eq!(mgr.as_dim(s0), None);
    }

    #[test]
    fn test_stripe() {
        let mgr = SdbmManager::default();
        let var = mgr.symbol(0);
        let cst2 = mgr.constant(2);
        let stripe = mgr.mk_stripe(var, cst2);
        assert_eq!(mgr.as_stripe(stripe), Some((var, cst2)));
        assert_eq!(stripe, mgr.mk_stripe(mgr.symbol(0), cst2));
        assert!(mgr.is_positive(stripe));
        assert!(mgr.is_varying(stripe));
        assert!(!mgr.is_input(stripe));

        // Stripes can be nested.
        let nested = mgr.mk_stripe(stripe, mgr.constant(4));
        assert_ne!(nested, stripe);
    }

    #[test]
    #[should_panic(expected = "non-positive stripe factor")]
    fn test_stripe_zero_factor() {
        let mgr = SdbmManager::default();
        mgr.mk_stripe(mgr.symbol(0), mgr.constant(0));
    }

    #[test]
    #[should_panic(expected = "Stripe variable must be positive")]
    fn test_stripe_of_neg() {
        let mgr = SdbmManager::default();
        let neg = mgr.mk_neg(mgr.dim(0));
        mgr.mk_stripe(neg, mgr.constant(2));
    }

    #[test]
    fn test_neg_sum_diff() {
        let mgr = SdbmManager::default();
        let var = mgr.symbol(0);
        let cst2 = mgr.constant(2);
        let stripe = mgr.mk_stripe(var, cst2);

        let neg = mgr.mk_neg(stripe);
        assert_eq!(mgr.as_neg(neg), Some(stripe));
        assert_eq!(neg, mgr.mk_neg(stripe));
        assert!(mgr.is_varying(neg));
        assert!(!mgr.is_positive(neg));

        let sum = mgr.mk_sum(stripe, cst2);
        assert_eq!(mgr.as_sum(sum), Some((stripe, cst2)));
        assert_eq!(sum, mgr.mk_sum(stripe, cst2));

        let diff = mgr.mk_diff(var, stripe);
        assert_eq!(mgr.as_diff(diff), Some((var, stripe)));
        assert_ne!(diff, mgr.mk_diff(stripe, var));
    }

    #[test]
    fn test_num_nodes() {
        let mgr = SdbmManager::with_config(SdbmConfig::default().with_table_bits(0));
        assert_eq!(mgr.num_nodes(), 0);
        for i in 0..50 {
            mgr.dim(i);
            mgr.dim(i);
        }
        assert_eq!(mgr.num_nodes(), 50);
    }
}

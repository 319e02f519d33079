//! Canonicalizing arithmetic on expressions.
//!
//! Every result is in normal form. Folding is eager and follows these rules,
//! tried in order:
//!
//! ```text
//! C1 + C2             => (C1 + C2)
//! C + x               => x + C
//! x + 0               => x
//! (x + C1) + C2       => x + (C1 + C2)
//! (x + C) + y         => (x + y) + C
//! x + (y + C)         => (x + y) + C
//! x + -x              => 0
//! x + -y  |  -y + x   => x - y
//! (x - y) + y         => x
//! x - x               => 0
//! x - y               => x + (-y)
//! ```
//!
//! Constants are therefore always hoisted to the top of an expression, and a
//! sum never nests more than one level deep. Combinations without a normal
//! form (for example `d0 + d1`, or `-d0 + -d1`) are not representable: the
//! `try_*` operations return `None` for them, while the plain operations treat
//! them as a contract violation.

use log::debug;

use crate::manager::SdbmManager;
use crate::node::ExprNode;
use crate::reference::ExprId;

impl SdbmManager {
    /// Add two expressions, returning `None` if the sum has no normal form.
    pub fn try_add(&self, lhs: ExprId, rhs: ExprId) -> Option<ExprId> {
        debug!("try_add(lhs = {}, rhs = {})", lhs, rhs);

        match (self.node(lhs), self.node(rhs)) {
            (ExprNode::Constant(a), ExprNode::Constant(b)) => {
                debug!("C1 + C2 => (C1 + C2)");
                Some(self.constant(a.checked_add(b)?))
            }
            (ExprNode::Constant(_), _) => {
                debug!("C + x => x + C");
                self.try_add(rhs, lhs)
            }
            (_, ExprNode::Constant(0)) => {
                debug!("x + 0 => x");
                Some(lhs)
            }
            (ExprNode::Sum { lhs: x, rhs: c1 }, ExprNode::Constant(c2)) => {
                debug!("(x + C1) + C2 => x + (C1 + C2)");
                let c = self.constant_value(c1).checked_add(c2)?;
                self.try_add(x, self.constant(c))
            }
            (_, ExprNode::Constant(_)) => Some(self.mk_sum(lhs, rhs)),
            (ExprNode::Sum { lhs: x, rhs: c }, _) => {
                debug!("(x + C) + y => (x + y) + C");
                let inner = self.try_add(x, rhs)?;
                self.try_add(inner, c)
            }
            (_, ExprNode::Sum { lhs: y, rhs: c }) => {
                debug!("x + (y + C) => (x + y) + C");
                let inner = self.try_add(lhs, y)?;
                self.try_add(inner, c)
            }
            (ExprNode::Neg { .. }, ExprNode::Neg { .. }) => {
                debug!("-x + -y is not representable");
                None
            }
            (_, ExprNode::Neg { var: y }) => Some(self.fold_difference(lhs, y)),
            (ExprNode::Neg { var: y }, _) => Some(self.fold_difference(rhs, y)),
            (ExprNode::Diff { lhs: x, rhs: y }, _) if y == rhs => {
                debug!("(x - y) + y => x");
                Some(x)
            }
            (_, ExprNode::Diff { lhs: x, rhs: y }) if y == lhs => {
                debug!("y + (x - y) => x");
                Some(x)
            }
            _ => {
                debug!("sum of two varying terms is not representable");
                None
            }
        }
    }

    /// `x - y`, where `y` is the variable of a negation.
    fn fold_difference(&self, x: ExprId, y: ExprId) -> ExprId {
        if x == y {
            debug!("x + -x => 0");
            self.zero()
        } else {
            debug!("x + -y => x - y");
            self.mk_diff(x, y)
        }
    }

    /// Add two expressions.
    ///
    /// # Panics
    ///
    /// Panics if the sum is not representable, see [`try_add`][Self::try_add].
    pub fn add(&self, lhs: ExprId, rhs: ExprId) -> ExprId {
        match self.try_add(lhs, rhs) {
            Some(res) => res,
            None if self.constant_part(lhs).checked_add(self.constant_part(rhs)).is_none() => panic!(
                "constant overflow in sum: {} + {}",
                self.format_expr(lhs),
                self.format_expr(rhs)
            ),
            None => panic!(
                "unsupported sum: {} + {} has no normal form",
                self.format_expr(lhs),
                self.format_expr(rhs)
            ),
        }
    }

    /// Add a constant to an expression.
    pub fn add_constant(&self, lhs: ExprId, value: i64) -> ExprId {
        self.add(lhs, self.constant(value))
    }

    /// Negate an expression, returning `None` if the result has no normal form.
    pub fn try_negate(&self, e: ExprId) -> Option<ExprId> {
        debug!("try_negate(e = {})", e);

        match self.node(e) {
            ExprNode::Constant(value) => Some(self.constant(value.checked_neg()?)),
            ExprNode::Dim(_) | ExprNode::Symbol(_) | ExprNode::Stripe { .. } => Some(self.mk_neg(e)),
            ExprNode::Neg { var } => {
                debug!("-(-x) => x");
                Some(var)
            }
            ExprNode::Sum { lhs, rhs } => {
                debug!("-(x + C) => -x + (-C)");
                let neg_lhs = self.try_negate(lhs)?;
                let neg_rhs = self.try_negate(rhs)?;
                self.try_add(neg_lhs, neg_rhs)
            }
            ExprNode::Diff { lhs, rhs } => {
                debug!("-(x - y) => -x + y");
                let neg_lhs = self.try_negate(lhs)?;
                self.try_add(neg_lhs, rhs)
            }
        }
    }

    /// Negate an expression.
    ///
    /// # Panics
    ///
    /// Panics if the negation is not representable, see [`try_negate`][Self::try_negate].
    pub fn negate(&self, e: ExprId) -> ExprId {
        match self.try_negate(e) {
            Some(res) => res,
            None if self.constant_part(e).checked_neg().is_none() => {
                panic!("constant overflow in negation: -({})", self.format_expr(e))
            }
            None => panic!("unsupported negation: -({}) has no normal form", self.format_expr(e)),
        }
    }

    /// Subtract two expressions, returning `None` if the difference has no normal form.
    pub fn try_subtract(&self, lhs: ExprId, rhs: ExprId) -> Option<ExprId> {
        debug!("try_subtract(lhs = {}, rhs = {})", lhs, rhs);

        if lhs == rhs {
            debug!("x - x => 0");
            return Some(self.zero());
        }
        let neg_rhs = self.try_negate(rhs)?;
        self.try_add(lhs, neg_rhs)
    }

    /// Subtract two expressions.
    ///
    /// # Panics
    ///
    /// Panics if the difference is not representable.
    pub fn subtract(&self, lhs: ExprId, rhs: ExprId) -> ExprId {
        let overflows = self
            .constant_part(rhs)
            .checked_neg()
            .and_then(|c| self.constant_part(lhs).checked_add(c))
            .is_none();
        match self.try_subtract(lhs, rhs) {
            Some(res) => res,
            None if overflows => panic!(
                "constant overflow in difference: {} - ({})",
                self.format_expr(lhs),
                self.format_expr(rhs)
            ),
            None => panic!(
                "unsupported difference: {} - ({}) has no normal form",
                self.format_expr(lhs),
                self.format_expr(rhs)
            ),
        }
    }

    /// The constant summand of a normal form: `C` for `C` and `x + C`, zero otherwise.
    fn constant_part(&self, e: ExprId) -> i64 {
        match self.node(e) {
            ExprNode::Constant(value) => value,
            ExprNode::Sum { rhs, .. } => self.constant_value(rhs),
            _ => 0,
        }
    }

    /// Round `var` down to the nearest multiple of `factor`.
    ///
    /// Nested stripes are not collapsed: `x # a # b` stays a two-level stripe.
    ///
    /// # Panics
    ///
    /// Panics if `factor <= 0` or if `var` is not positive.
    pub fn stripe(&self, var: ExprId, factor: i64) -> ExprId {
        assert!(factor > 0, "non-positive stripe factor: {}", factor);
        self.mk_stripe(var, self.constant(factor))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_add() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let e = mgr.add_constant(d0, 42);
        let (lhs, rhs) = mgr.as_sum(e).unwrap();
        assert_eq!(lhs, d0);
        assert_eq!(mgr.as_constant(rhs), Some(42));
    }

    #[test]
    fn test_add_constants() {
        let mgr = SdbmManager::default();
        let e = mgr.add_constant(mgr.constant(2), 42);
        assert_eq!(mgr.as_constant(e), Some(44));
    }

    #[test]
    fn test_add_flattens_sums() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let e = mgr.add_constant(mgr.add_constant(d0, 10), 32);
        let (lhs, rhs) = mgr.as_sum(e).unwrap();
        assert_eq!(lhs, d0);
        assert_eq!(mgr.as_constant(rhs), Some(42));
    }

    #[test]
    fn test_add_zero() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        assert_eq!(mgr.add(d0, mgr.zero()), d0);
        assert_eq!(mgr.add(mgr.zero(), d0), d0);

        // Constants that cancel out drop the sum altogether.
        let e = mgr.add_constant(mgr.add_constant(d0, 5), -5);
        assert_eq!(e, d0);
    }

    #[test]
    fn test_add_commutes_constant() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let c = mgr.constant(7);
        assert_eq!(mgr.add(c, d0), mgr.add(d0, c));
    }

    #[test]
    fn test_add_neg_is_diff() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let d1 = mgr.dim(1);
        let neg = mgr.mk_neg(d1);

        let e = mgr.add(d0, neg);
        assert_eq!(mgr.as_diff(e), Some((d0, d1)));

        let inverted = mgr.add(neg, d0);
        assert_eq!(inverted, e);
    }

    #[test]
    fn test_add_hoists_constants() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let d1 = mgr.dim(1);
        let e = mgr.add(mgr.add_constant(d0, 3), mgr.negate(d1));
        let (lhs, rhs) = mgr.as_sum(e).unwrap();
        assert_eq!(mgr.as_diff(lhs), Some((d0, d1)));
        assert_eq!(mgr.as_constant(rhs), Some(3));
    }

    #[test]
    fn test_add_cancels_diff() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let s0 = mgr.symbol(0);
        let diff = mgr.subtract(d0, s0);
        assert_eq!(mgr.add(diff, s0), d0);
        assert_eq!(mgr.add(s0, diff), d0);
    }

    #[test]
    fn test_add_unrepresentable() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let d1 = mgr.dim(1);
        assert_eq!(mgr.try_add(d0, d1), None);
        assert_eq!(mgr.try_add(mgr.mk_neg(d0), mgr.mk_neg(d1)), None);
        assert_eq!(mgr.try_add(mgr.constant(i64::MAX), mgr.constant(1)), None);
    }

    #[test]
    #[should_panic(expected = "unsupported sum")]
    fn test_add_panics() {
        let mgr = SdbmManager::default();
        mgr.add(mgr.dim(0), mgr.dim(1));
    }

    #[test]
    #[should_panic(expected = "constant overflow in sum")]
    fn test_add_overflow_panics() {
        let mgr = SdbmManager::default();
        let e = mgr.add_constant(mgr.dim(0), i64::MAX);
        mgr.add_constant(e, 1);
    }

    #[test]
    #[should_panic(expected = "constant overflow in negation")]
    fn test_negate_overflow_panics() {
        let mgr = SdbmManager::default();
        mgr.negate(mgr.add_constant(mgr.dim(0), i64::MIN));
    }

    #[test]
    #[should_panic(expected = "constant overflow in difference")]
    fn test_subtract_overflow_panics() {
        let mgr = SdbmManager::default();
        mgr.subtract(mgr.constant(0), mgr.constant(i64::MIN));
    }

    #[test]
    fn test_diff() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let d1 = mgr.dim(1);
        let e = mgr.subtract(d0, d1);
        assert_eq!(mgr.as_diff(e), Some((d0, d1)));
    }

    #[test]
    fn test_diff_folding() {
        let mgr = SdbmManager::default();
        let e = mgr.subtract(mgr.constant(10), mgr.constant(3));
        assert_eq!(mgr.as_constant(e), Some(7));

        let d0 = mgr.dim(0);
        let e = mgr.subtract(d0, mgr.constant(3));
        let (lhs, rhs) = mgr.as_sum(e).unwrap();
        assert_eq!(lhs, d0);
        assert_eq!(mgr.as_constant(rhs), Some(-3));

        let zero = mgr.subtract(d0, d0);
        assert_eq!(mgr.as_constant(zero), Some(0));
    }

    #[test]
    fn test_subtract_same_sum() {
        let mgr = SdbmManager::default();
        let e = mgr.add_constant(mgr.dim(0), 4);
        assert_eq!(mgr.subtract(e, e), mgr.zero());
    }

    #[test]
    fn test_constant_minus_var() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let e = mgr.subtract(mgr.constant(5), d0);
        let (lhs, rhs) = mgr.as_sum(e).unwrap();
        assert_eq!(mgr.as_neg(lhs), Some(d0));
        assert_eq!(mgr.as_constant(rhs), Some(5));
    }

    #[test]
    fn test_negate() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let d1 = mgr.dim(1);

        assert_eq!(mgr.as_constant(mgr.negate(mgr.constant(3))), Some(-3));
        assert_eq!(mgr.negate(mgr.negate(d0)), d0);

        let diff = mgr.subtract(d0, d1);
        assert_eq!(mgr.negate(diff), mgr.subtract(d1, d0));

        let sum = mgr.add_constant(d0, 2);
        let neg = mgr.negate(sum);
        let (lhs, rhs) = mgr.as_sum(neg).unwrap();
        assert_eq!(mgr.as_neg(lhs), Some(d0));
        assert_eq!(mgr.as_constant(rhs), Some(-2));
    }

    #[test]
    fn test_stripe() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let e = mgr.stripe(d0, 3);
        let (var, factor) = mgr.as_stripe(e).unwrap();
        assert_eq!(var, d0);
        assert_eq!(mgr.as_constant(factor), Some(3));

        let nested = mgr.stripe(e, 5);
        assert_eq!(mgr.as_stripe(nested).map(|(var, _)| var), Some(e));
        assert_ne!(nested, mgr.stripe(d0, 15));
    }

    #[test]
    #[should_panic(expected = "non-positive stripe factor")]
    fn test_stripe_zero() {
        let mgr = SdbmManager::default();
        mgr.stripe(mgr.dim(0), 0);
    }

    #[test]
    #[should_panic(expected = "non-positive stripe factor")]
    fn test_stripe_negative() {
        let mgr = SdbmManager::default();
        mgr.stripe(mgr.dim(0), -4);
    }
}

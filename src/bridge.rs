//! Translation between expressions and general affine expressions.
//!
//! The forward direction is total and purely structural:
//!
//! ```text
//! C        ↦ C
//! d_i      ↦ d_i
//! s_i      ↦ s_i
//! -x       ↦ -1 * x
//! x + C    ↦ x + C
//! x - y    ↦ x + (-1 * y)
//! x # C    ↦ (x floordiv C) * C
//! ```
//!
//! The backward direction is a best-effort pattern matcher. It recovers stripes
//! from the multiplicative pattern `C * (x floordiv C)` (in either operand order),
//! negations from multiplication by `-1`, and differences from sums whose converted
//! operands fold through the builder. Anything else, in particular sums of two
//! variables, other coefficients, lone divisions, `ceildiv` and `mod`, is not
//! representable and yields `None`.

use log::debug;

use crate::affine::AffineExpr;
use crate::manager::SdbmManager;
use crate::node::ExprNode;
use crate::reference::ExprId;

impl SdbmManager {
    /// Convert an expression into an affine expression.
    pub fn to_affine(&self, e: ExprId) -> AffineExpr {
        match self.node(e) {
            ExprNode::Constant(value) => AffineExpr::constant(value),
            ExprNode::Dim(position) => AffineExpr::dim(position),
            ExprNode::Symbol(position) => AffineExpr::symbol(position),
            ExprNode::Neg { var } => AffineExpr::neg(self.to_affine(var)),
            ExprNode::Sum { lhs, rhs } => AffineExpr::add(self.to_affine(lhs), self.to_affine(rhs)),
            ExprNode::Diff { lhs, rhs } => AffineExpr::sub(self.to_affine(lhs), self.to_affine(rhs)),
            ExprNode::Stripe { var, factor } => {
                let factor = self.to_affine(factor);
                AffineExpr::mul(AffineExpr::floor_div(self.to_affine(var), factor.clone()), factor)
            }
        }
    }

    /// Try to convert an affine expression into an expression.
    ///
    /// Returns `None` if the affine expression is outside the representable fragment.
    pub fn try_from_affine(&self, affine: &AffineExpr) -> Option<ExprId> {
        let res = self.convert_affine(affine);
        if res.is_none() {
            debug!("try_from_affine: {} is not representable", affine);
        }
        res
    }

    fn convert_affine(&self, affine: &AffineExpr) -> Option<ExprId> {
        match affine {
            AffineExpr::Constant(value) => Some(self.constant(*value)),
            AffineExpr::Dim(position) => Some(self.dim(*position)),
            AffineExpr::Symbol(position) => Some(self.symbol(*position)),
            AffineExpr::Add(lhs, rhs) => {
                let lhs = self.convert_affine(lhs)?;
                let rhs = self.convert_affine(rhs)?;
                self.try_add(lhs, rhs)
            }
            AffineExpr::Mul(lhs, rhs) => {
                if let Some(stripe) = self.match_stripe(lhs, rhs).or_else(|| self.match_stripe(rhs, lhs)) {
                    return Some(stripe);
                }
                // Either side may be the unit coefficient, including when both are constants.
                let unit = |e: &AffineExpr| matches!(e.as_constant(), Some(1 | -1));
                if unit(lhs) {
                    if let Some(res) = self.convert_scaled(rhs, lhs.as_constant()?) {
                        return Some(res);
                    }
                }
                if unit(rhs) {
                    return self.convert_scaled(lhs, rhs.as_constant()?);
                }
                None
            }
            AffineExpr::FloorDiv(..) | AffineExpr::CeilDiv(..) | AffineExpr::Mod(..) => None,
        }
    }

    /// Match `factor * (inner floordiv factor)`.
    fn match_stripe(&self, factor: &AffineExpr, other: &AffineExpr) -> Option<ExprId> {
        let factor = factor.as_constant()?;
        let AffineExpr::FloorDiv(inner, divisor) = other else {
            return None;
        };
        if divisor.as_constant() != Some(factor) || factor <= 0 {
            return None;
        }
        let var = self.convert_affine(inner)?;
        if !self.is_positive(var) {
            return None;
        }
        debug!("matched stripe pattern with factor {}", factor);
        Some(self.stripe(var, factor))
    }

    /// Convert `coefficient * operand`, where only unit coefficients are representable.
    fn convert_scaled(&self, operand: &AffineExpr, coefficient: i64) -> Option<ExprId> {
        match coefficient {
            1 => self.convert_affine(operand),
            -1 => {
                let var = self.convert_affine(operand)?;
                if self.is_positive(var) {
                    Some(self.mk_neg(var))
                } else if let Some(value) = self.as_constant(var) {
                    Some(self.constant(value.checked_neg()?))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_to_affine_leaves() {
        let mgr = SdbmManager::default();
        assert_eq!(mgr.to_affine(mgr.constant(5)), AffineExpr::constant(5));
        assert_eq!(mgr.to_affine(mgr.dim(1)), AffineExpr::dim(1));
        assert_eq!(mgr.to_affine(mgr.symbol(2)), AffineExpr::symbol(2));
    }

    #[test]
    fn test_to_affine_stripe() {
        let mgr = SdbmManager::default();
        let e = mgr.stripe(mgr.dim(0), 4);
        let affine = mgr.to_affine(e);
        assert_eq!(affine.to_string(), "d0 floordiv 4 * 4");
        assert_eq!(affine.eval(&[9], &[]), Some(8));
        assert_eq!(affine.eval(&[-1], &[]), Some(-4));
    }

    #[test]
    fn test_to_affine_diff() {
        let mgr = SdbmManager::default();
        let e = mgr.add_constant(mgr.subtract(mgr.dim(0), mgr.symbol(0)), 3);
        let affine = mgr.to_affine(e);
        assert_eq!(affine.eval(&[10], &[4]), Some(9));
    }

    #[test]
    fn test_round_trip() {
        let mgr = SdbmManager::default();
        let s0 = mgr.symbol(0);
        let stripe = mgr.stripe(s0, 2);
        let expr = mgr.subtract(s0, stripe);
        assert_eq!(mgr.try_from_affine(&mgr.to_affine(expr)), Some(expr));

        let outer = mgr.stripe(stripe, 5);
        assert_eq!(mgr.try_from_affine(&mgr.to_affine(outer)), Some(outer));

        let sum = mgr.add_constant(mgr.subtract(outer, stripe), 2);
        assert_eq!(mgr.try_from_affine(&mgr.to_affine(sum)), Some(sum));
    }

    #[test]
    fn test_round_trip_negations() {
        let mgr = SdbmManager::default();
        let d0 = mgr.dim(0);
        let neg = mgr.negate(mgr.stripe(d0, 3));
        assert_eq!(mgr.try_from_affine(&mgr.to_affine(neg)), Some(neg));

        let shifted = mgr.add_constant(neg, -7);
        assert_eq!(mgr.try_from_affine(&mgr.to_affine(shifted)), Some(shifted));
    }

    #[test]
    fn test_match_stripe_mul_pattern() {
        let mgr = SdbmManager::default();
        let cst = AffineExpr::constant(42);
        let floor = AffineExpr::floor_div(AffineExpr::dim(0), cst.clone());

        let converted = mgr.try_from_affine(&AffineExpr::mul(cst.clone(), floor.clone())).unwrap();
        let (var, factor) = mgr.as_stripe(converted).unwrap();
        assert_eq!(var, mgr.dim(0));
        assert_eq!(mgr.as_constant(factor), Some(42));

        // Operand order does not matter.
        assert_eq!(mgr.try_from_affine(&AffineExpr::mul(floor, cst)), Some(converted));
    }

    #[test]
    fn test_stripe_pattern_mismatch() {
        let mgr = SdbmManager::default();
        let floor = AffineExpr::floor_div(AffineExpr::dim(0), AffineExpr::constant(4));
        let mul = AffineExpr::mul(AffineExpr::constant(8), floor.clone());
        assert_eq!(mgr.try_from_affine(&mul), None);
        assert_eq!(mgr.try_from_affine(&floor), None);

        let negative = AffineExpr::mul(
            AffineExpr::constant(-4),
            AffineExpr::floor_div(AffineExpr::dim(0), AffineExpr::constant(-4)),
        );
        assert_eq!(mgr.try_from_affine(&negative), None);
    }

    #[test]
    fn test_non_sdbm() {
        let mgr = SdbmManager::default();
        let d0 = AffineExpr::dim(0);
        let d1 = AffineExpr::dim(1);
        let c2 = AffineExpr::constant(2);

        // a sum of two variables
        assert_eq!(mgr.try_from_affine(&AffineExpr::add(d0.clone(), d1.clone())), None);
        // a variable with coefficient other than 1 or -1
        assert_eq!(mgr.try_from_affine(&AffineExpr::mul(d0.clone(), c2.clone())), None);
        // a ceildiv expression
        assert_eq!(mgr.try_from_affine(&AffineExpr::ceil_div(d1.clone(), c2.clone())), None);
        // a mod expression
        assert_eq!(mgr.try_from_affine(&AffineExpr::modulo(d1, c2)), None);
        // a negated sum
        let neg_sum = AffineExpr::neg(AffineExpr::add(d0, AffineExpr::constant(1)));
        assert_eq!(mgr.try_from_affine(&neg_sum), None);
    }

    #[test]
    fn test_unit_coefficients() {
        let mgr = SdbmManager::default();
        let d0 = AffineExpr::dim(0);
        let one = AffineExpr::mul(AffineExpr::constant(1), d0.clone());
        assert_eq!(mgr.try_from_affine(&one), Some(mgr.dim(0)));
        let minus = AffineExpr::mul(d0, AffineExpr::constant(-1));
        assert_eq!(mgr.try_from_affine(&minus), Some(mgr.negate(mgr.dim(0))));
    }

    #[test]
    fn test_constant_times_constant() {
        let mgr = SdbmManager::default();
        let c = AffineExpr::constant;
        assert_eq!(mgr.try_from_affine(&AffineExpr::mul(c(2), c(1))), Some(mgr.constant(2)));
        assert_eq!(mgr.try_from_affine(&AffineExpr::mul(c(1), c(2))), Some(mgr.constant(2)));
        assert_eq!(mgr.try_from_affine(&AffineExpr::mul(c(-1), c(1))), Some(mgr.constant(-1)));
        assert_eq!(mgr.try_from_affine(&AffineExpr::mul(c(1), c(-1))), Some(mgr.constant(-1)));
        assert_eq!(mgr.try_from_affine(&AffineExpr::mul(c(3), c(-1))), Some(mgr.constant(-3)));
        assert_eq!(mgr.try_from_affine(&AffineExpr::mul(c(2), c(3))), None);
    }
}

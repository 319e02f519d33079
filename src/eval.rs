use std::ops::{Add, Neg, Sub};

use crate::manager::SdbmManager;
use crate::reference::ExprId;

pub struct ExprAddOp {
    lhs: ExprId,
    rhs: ExprId,
}

impl Add for ExprId {
    type Output = ExprAddOp;

    fn add(self, rhs: Self) -> Self::Output {
        ExprAddOp { lhs: self, rhs }
    }
}

pub struct ExprSubOp {
    lhs: ExprId,
    rhs: ExprId,
}

impl Sub for ExprId {
    type Output = ExprSubOp;

    fn sub(self, rhs: Self) -> Self::Output {
        ExprSubOp { lhs: self, rhs }
    }
}

pub struct ExprNegOp {
    e: ExprId,
}

impl Neg for ExprId {
    type Output = ExprNegOp;

    fn neg(self) -> Self::Output {
        ExprNegOp { e: self }
    }
}

pub struct ExprShiftOp {
    e: ExprId,
    value: i64,
}

impl Add<i64> for ExprId {
    type Output = ExprShiftOp;

    fn add(self, rhs: i64) -> Self::Output {
        ExprShiftOp { e: self, value: rhs }
    }
}

impl Sub<i64> for ExprId {
    type Output = ExprShiftOp;

    fn sub(self, rhs: i64) -> Self::Output {
        match rhs.checked_neg() {
            Some(value) => ExprShiftOp { e: self, value },
            None => panic!("unsupported difference: cannot negate {}", rhs),
        }
    }
}

/// Deferred arithmetic, evaluated by the manager into a normal form.
pub trait Eval {
    fn eval(&self, mgr: &SdbmManager) -> ExprId;
}

impl SdbmManager {
    pub fn eval(&self, value: impl Eval) -> ExprId {
        value.eval(self)
    }
}

impl Eval for ExprId {
    fn eval(&self, _mgr: &SdbmManager) -> ExprId {
        *self
    }
}

impl Eval for ExprAddOp {
    fn eval(&self, mgr: &SdbmManager) -> ExprId {
        mgr.add(self.lhs, self.rhs)
    }
}

impl Eval for ExprSubOp {
    fn eval(&self, mgr: &SdbmManager) -> ExprId {
        mgr.subtract(self.lhs, self.rhs)
    }
}

impl Eval for ExprNegOp {
    fn eval(&self, mgr: &SdbmManager) -> ExprId {
        mgr.negate(self.e)
    }
}

impl Eval for ExprShiftOp {
    fn eval(&self, mgr: &SdbmManager) -> ExprId {
        mgr.add_constant(self.e, self.value)
    }
}

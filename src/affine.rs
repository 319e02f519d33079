//! General affine expressions.
//!
//! This is the representation on the other side of the [affine bridge][crate::bridge]:
//! an immutable tree over dimensions, symbols and constants with addition,
//! multiplication, floor/ceiling division and modulo. Subtrees are shared through
//! [`Arc`], so cloning an expression is cheap.
//!
//! Constructors do not simplify. `a - b` is spelled `a + (-1 * b)`, the way affine
//! libraries usually canonicalize subtraction.

use std::fmt;
use std::sync::Arc;

use crate::utils::{ceil_div, floor_div};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AffineExpr {
    Constant(i64),
    Dim(u32),
    Symbol(u32),
    Add(Arc<AffineExpr>, Arc<AffineExpr>),
    Mul(Arc<AffineExpr>, Arc<AffineExpr>),
    FloorDiv(Arc<AffineExpr>, Arc<AffineExpr>),
    CeilDiv(Arc<AffineExpr>, Arc<AffineExpr>),
    Mod(Arc<AffineExpr>, Arc<AffineExpr>),
}

impl AffineExpr {
    pub fn constant(value: i64) -> Self {
        AffineExpr::Constant(value)
    }

    pub fn dim(position: u32) -> Self {
        AffineExpr::Dim(position)
    }

    pub fn symbol(position: u32) -> Self {
        AffineExpr::Symbol(position)
    }

    pub fn add(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        AffineExpr::Add(Arc::new(lhs), Arc::new(rhs))
    }

    pub fn mul(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        AffineExpr::Mul(Arc::new(lhs), Arc::new(rhs))
    }

    pub fn floor_div(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        AffineExpr::FloorDiv(Arc::new(lhs), Arc::new(rhs))
    }

    pub fn ceil_div(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        AffineExpr::CeilDiv(Arc::new(lhs), Arc::new(rhs))
    }

    pub fn modulo(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        AffineExpr::Mod(Arc::new(lhs), Arc::new(rhs))
    }

    /// `-1 * e`
    pub fn neg(e: AffineExpr) -> Self {
        AffineExpr::mul(AffineExpr::constant(-1), e)
    }

    /// `lhs + (-1 * rhs)`
    pub fn sub(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        AffineExpr::add(lhs, AffineExpr::neg(rhs))
    }

    pub fn as_constant(&self) -> Option<i64> {
        match self {
            AffineExpr::Constant(value) => Some(*value),
            _ => None,
        }
    }

    /// Evaluate the expression for concrete dimension and symbol values.
    ///
    /// Returns `None` if a position is out of range, on division by zero, or on overflow.
    pub fn eval(&self, dims: &[i64], symbols: &[i64]) -> Option<i64> {
        match self {
            AffineExpr::Constant(value) => Some(*value),
            AffineExpr::Dim(position) => dims.get(*position as usize).copied(),
            AffineExpr::Symbol(position) => symbols.get(*position as usize).copied(),
            AffineExpr::Add(lhs, rhs) => lhs.eval(dims, symbols)?.checked_add(rhs.eval(dims, symbols)?),
            AffineExpr::Mul(lhs, rhs) => lhs.eval(dims, symbols)?.checked_mul(rhs.eval(dims, symbols)?),
            AffineExpr::FloorDiv(lhs, rhs) => floor_div(lhs.eval(dims, symbols)?, rhs.eval(dims, symbols)?),
            AffineExpr::CeilDiv(lhs, rhs) => ceil_div(lhs.eval(dims, symbols)?, rhs.eval(dims, symbols)?),
            AffineExpr::Mod(lhs, rhs) => {
                let (a, b) = (lhs.eval(dims, symbols)?, rhs.eval(dims, symbols)?);
                a.checked_rem_euclid(b)
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            AffineExpr::Add(..) => 1,
            AffineExpr::Mul(..) | AffineExpr::FloorDiv(..) | AffineExpr::CeilDiv(..) | AffineExpr::Mod(..) => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for AffineExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operand = |f: &mut fmt::Formatter<'_>, e: &AffineExpr, min: u8| {
            if e.precedence() < min {
                write!(f, "({})", e)
            } else {
                write!(f, "{}", e)
            }
        };
        let binop = |f: &mut fmt::Formatter<'_>, lhs: &AffineExpr, op: &str, rhs: &AffineExpr| {
            let p = self.precedence();
            operand(f, lhs, p)?;
            write!(f, " {} ", op)?;
            operand(f, rhs, p + 1)
        };
        match self {
            AffineExpr::Constant(value) => write!(f, "{}", value),
            AffineExpr::Dim(position) => write!(f, "d{}", position),
            AffineExpr::Symbol(position) => write!(f, "s{}", position),
            AffineExpr::Add(lhs, rhs) => binop(f, lhs, "+", rhs),
            AffineExpr::Mul(lhs, rhs) => binop(f, lhs, "*", rhs),
            AffineExpr::FloorDiv(lhs, rhs) => binop(f, lhs, "floordiv", rhs),
            AffineExpr::CeilDiv(lhs, rhs) => binop(f, lhs, "ceildiv", rhs),
            AffineExpr::Mod(lhs, rhs) => binop(f, lhs, "mod", rhs),
        }
    }
}

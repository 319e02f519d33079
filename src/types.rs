//! Type-safe wrappers for expression kinds and matrix positions.
//!
//! Capability classes cut across the concrete expression variants:
//!
//! | Kind     | Positive | Varying | Input |
//! |----------|----------|---------|-------|
//! | Constant |          |         |       |
//! | Dim      | ✓        | ✓       | ✓     |
//! | Symbol   | ✓        | ✓       | ✓     |
//! | Stripe   | ✓        | ✓       |       |
//! | Neg      |          | ✓       |       |
//! | Sum      |          | ✓       |       |
//! | Diff     |          | ✓       |       |
//!
//! Algorithms are written against these classes rather than against the variants.
use std::fmt;

/// Tag of an expression variant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ExprKind {
    Constant,
    Dim,
    Symbol,
    Stripe,
    Neg,
    Sum,
    Diff,
}

impl ExprKind {
    /// Expressions that can stand on a non-negated matrix axis: `Dim`, `Symbol` and `Stripe`.
    pub const fn is_positive(self) -> bool {
        matches!(self, ExprKind::Dim | ExprKind::Symbol | ExprKind::Stripe)
    }

    /// Anything but a constant.
    pub const fn is_varying(self) -> bool {
        !matches!(self, ExprKind::Constant)
    }

    /// Leaf variable references: `Dim` and `Symbol`.
    pub const fn is_input(self) -> bool {
        matches!(self, ExprKind::Dim | ExprKind::Symbol)
    }

    pub(crate) const fn tag(self) -> u64 {
        self as u64
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExprKind::Constant => "constant",
            ExprKind::Dim => "dim",
            ExprKind::Symbol => "symbol",
            ExprKind::Stripe => "stripe",
            ExprKind::Neg => "neg",
            ExprKind::Sum => "sum",
            ExprKind::Diff => "diff",
        };
        write!(f, "{}", name)
    }
}

/// A row/column index in a difference-bound matrix.
///
/// # Invariants
///
/// - Position 0 is the distinguished zero axis (the constant `0`)
/// - Every other position stands for a dimension, a symbol or a stripe temporary
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Position(u32);

impl Position {
    /// The zero axis.
    pub const ZERO: Position = Position(0);

    pub fn new(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "Position index overflow");
        Position(index as u32)
    }

    /// Returns the raw index as a `usize`.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl From<Position> for usize {
    fn from(position: Position) -> Self {
        position.index()
    }
}

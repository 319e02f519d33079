use std::fmt::{Display, Formatter};

use crate::utils::MyHash;

/// A handle to a hash-consed expression.
///
/// Handles are only meaningful relative to the [`SdbmManager`][crate::manager::SdbmManager]
/// that produced them. Since every structurally distinct expression is stored exactly once,
/// two handles from the same manager are equal iff the expressions are equal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    /// Sentinel for invalid references.
    pub const INVALID: ExprId = ExprId(0);

    /// Creates a handle from a raw table index.
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    /// Returns the raw index value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the index for array access.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for ExprId {
    fn default() -> Self {
        ExprId::INVALID
    }
}

impl Display for ExprId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl MyHash for ExprId {
    fn hash(&self) -> u64 {
        self.0 as u64
    }
}

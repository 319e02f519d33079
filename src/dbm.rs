//! Striped difference-bound matrices.
//!
//! An [`Sdbm`] is a sparse square matrix of bounds `bound[i][j] = c`, read as
//! `x_i - x_j <= c`. Its positions are:
//!
//! ```text
//! P0                    the constant zero
//! P1 ..                 dimensions in use, by increasing position
//! ..                    symbols in use, by increasing position
//! .. Pn                 one temporary per distinct stripe subexpression
//! ```
//!
//! A temporary `t = x # C` is bound to its variable by the stripe-induced bounds
//! `t - x <= 0` and `x - t <= C - 1`, and the stripe expression itself is kept in
//! the position table. Extraction substitutes temporaries back by their stripes,
//! so temporaries never show up in the returned expressions.
//!
//! # Constraint conventions
//!
//! - an inequality expression `e` stands for `e <= 0`;
//! - an equality expression `e` stands for `e = 0`.
//!
//! Every expression must reduce to `a - b + c` where each of `a` and `b` is a
//! dimension, a symbol, a stripe, or absent. Cells are only ever tightened, so
//! the result does not depend on the order of the input constraints.
//!
//! # Example
//!
//! ```
//! use sdbm_rs::dbm::Sdbm;
//! use sdbm_rs::manager::SdbmManager;
//!
//! let mgr = SdbmManager::default();
//! let s = mgr.stripe(mgr.symbol(0), 4);
//! let eq = mgr.subtract(s, mgr.dim(0));
//!
//! let sdbm = Sdbm::build(&mgr, &[], &[eq]);
//! let (inequalities, equalities) = sdbm.get_expressions(&mgr);
//! assert!(inequalities.is_empty());
//! assert_eq!(equalities.len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::{debug, warn};

use crate::manager::SdbmManager;
use crate::node::ExprNode;
use crate::reference::ExprId;
use crate::types::Position;

/// What a matrix position stands for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Axis {
    /// The constant zero.
    Zero,
    /// A dimension or a symbol.
    Input(ExprId),
    /// A temporary standing for `stripe = var # factor`.
    Temporary { stripe: ExprId, var: Position, factor: i64 },
}

/// A constraint reduced to `plus - minus + value`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Difference {
    plus: Position,
    minus: Position,
    value: i64,
}

#[derive(Debug, Clone)]
pub struct Sdbm {
    axes: Vec<Axis>,
    positions: HashMap<ExprId, Position>,
    bounds: BTreeMap<(Position, Position), i64>,
    infeasible: bool,
}

impl Sdbm {
    /// Build a matrix from inequalities (`e <= 0`) and equalities (`e = 0`).
    ///
    /// # Panics
    ///
    /// Panics if some expression does not reduce to a difference of at most two
    /// positive terms plus a constant, or if its constant part overflows.
    pub fn build(mgr: &SdbmManager, inequalities: &[ExprId], equalities: &[ExprId]) -> Self {
        debug!(
            "Sdbm::build(inequalities = {}, equalities = {})",
            inequalities.len(),
            equalities.len()
        );

        let mut sdbm = Sdbm {
            axes: vec![Axis::Zero],
            positions: HashMap::new(),
            bounds: BTreeMap::new(),
            infeasible: false,
        };
        sdbm.allocate_positions(mgr, inequalities.iter().chain(equalities));

        for &e in inequalities {
            let d = sdbm.decompose(mgr, e);
            sdbm.add_inequality(d);
        }
        for &e in equalities {
            let d = sdbm.decompose(mgr, e);
            sdbm.add_equality(d);
        }

        sdbm
    }

    /// First sweep: collect inputs and stripes, then lay out the positions.
    fn allocate_positions<'a>(&mut self, mgr: &SdbmManager, exprs: impl Iterator<Item = &'a ExprId>) {
        let mut dims = BTreeSet::new();
        let mut symbols = BTreeSet::new();
        let mut stripes = Vec::new();
        let mut seen_stripes = HashSet::new();

        for &e in exprs {
            // Children come before parents, so inner stripes precede outer ones.
            for sub in mgr.descendants(e) {
                match mgr.node(sub) {
                    ExprNode::Dim(position) => {
                        dims.insert(position);
                    }
                    ExprNode::Symbol(position) => {
                        symbols.insert(position);
                    }
                    ExprNode::Stripe { .. } => {
                        if seen_stripes.insert(sub) {
                            stripes.push(sub);
                        }
                    }
                    _ => {}
                }
            }
        }

        for position in dims {
            self.push_axis(mgr.dim(position), Axis::Input(mgr.dim(position)));
        }
        for position in symbols {
            self.push_axis(mgr.symbol(position), Axis::Input(mgr.symbol(position)));
        }
        for stripe in stripes {
            let (var, factor) = match mgr.as_stripe(stripe) {
                Some(parts) => parts,
                None => unreachable!("collected a non-stripe expression"),
            };
            let factor = mgr.constant_value(factor);
            let var = match self.position_of(var) {
                Some(position) => position,
                None => unreachable!("stripe variable is allocated before the stripe"),
            };
            let t = self.push_axis(stripe, Axis::Temporary { stripe, var, factor });
            // t <= var < t + factor
            self.tighten(t, var, 0);
            self.tighten(var, t, factor - 1);
        }
    }

    fn push_axis(&mut self, e: ExprId, axis: Axis) -> Position {
        let position = Position::new(self.axes.len());
        debug!("position {} := {:?}", position, axis);
        self.axes.push(axis);
        self.positions.insert(e, position);
        position
    }

    /// Reduce `e` to `plus - minus + value`.
    fn decompose(&self, mgr: &SdbmManager, e: ExprId) -> Difference {
        let mut plus = Vec::new();
        let mut minus = Vec::new();
        let value = match self.collect_terms(mgr, e, &mut plus, &mut minus) {
            Some(value) => value,
            None => panic!("constant overflow in difference-bound constraint: {}", mgr.format_expr(e)),
        };

        // Cancel terms that appear on both sides.
        plus.retain(|p| match minus.iter().position(|m| m == p) {
            Some(i) => {
                minus.swap_remove(i);
                false
            }
            None => true,
        });

        match (plus.as_slice(), minus.as_slice()) {
            ([] | [_], [] | [_]) => Difference {
                plus: plus.first().copied().unwrap_or(Position::ZERO),
                minus: minus.first().copied().unwrap_or(Position::ZERO),
                value,
            },
            _ => panic!(
                "expression is not a difference-bound constraint: {}",
                mgr.format_expr(e)
            ),
        }
    }

    /// Accumulate positive and negative terms of `e`, returning its constant part.
    ///
    /// Returns `None` if the constant part overflows.
    fn collect_terms(
        &self,
        mgr: &SdbmManager,
        e: ExprId,
        plus: &mut Vec<Position>,
        minus: &mut Vec<Position>,
    ) -> Option<i64> {
        match mgr.node(e) {
            ExprNode::Constant(value) => Some(value),
            ExprNode::Dim(_) | ExprNode::Symbol(_) | ExprNode::Stripe { .. } => {
                plus.push(self.allocated(e));
                Some(0)
            }
            ExprNode::Neg { var } => {
                minus.push(self.allocated(var));
                Some(0)
            }
            ExprNode::Sum { lhs, rhs } => {
                let value = self.collect_terms(mgr, lhs, plus, minus)?;
                value.checked_add(mgr.constant_value(rhs))
            }
            ExprNode::Diff { lhs, rhs } => {
                let lhs_value = self.collect_terms(mgr, lhs, plus, minus)?;
                let rhs_value = self.collect_terms(mgr, rhs, minus, plus)?;
                lhs_value.checked_sub(rhs_value)
            }
        }
    }

    fn allocated(&self, e: ExprId) -> Position {
        match self.position_of(e) {
            Some(position) => position,
            None => unreachable!("every input and stripe is allocated before decomposition"),
        }
    }

    fn tighten(&mut self, row: Position, col: Position, bound: i64) {
        // Cells never hold i64::MIN, so every bound can be negated on extraction.
        let bound = if bound == i64::MIN {
            warn!("weakening bound[{}][{}] = {} by one", row, col, bound);
            bound + 1
        } else {
            bound
        };
        let cell = self.bounds.entry((row, col)).or_insert(bound);
        if bound < *cell {
            *cell = bound;
        }
        debug!("bound[{}][{}] = {}", row, col, cell);
    }

    fn add_inequality(&mut self, d: Difference) {
        debug!("add_inequality({:?})", d);
        if d.plus == d.minus {
            self.check_constant(d.value <= 0, d.value, "<=");
            return;
        }
        self.tighten_negated(d.plus, d.minus, d.value);
    }

    fn add_equality(&mut self, d: Difference) {
        debug!("add_equality({:?})", d);
        if d.plus == d.minus {
            self.check_constant(d.value == 0, d.value, "=");
            return;
        }
        self.tighten_negated(d.plus, d.minus, d.value);
        self.tighten(d.minus, d.plus, d.value);
    }

    /// Tighten `bound[row][col]` to `-value`.
    ///
    /// For `value == i64::MIN` the bound is `2^63`, which every pair of `i64` values satisfies.
    fn tighten_negated(&mut self, row: Position, col: Position, value: i64) {
        match value.checked_neg() {
            Some(bound) => self.tighten(row, col, bound),
            None => debug!("dropping trivial bound {} - {} <= 2^63", row, col),
        }
    }

    fn check_constant(&mut self, holds: bool, value: i64, op: &str) {
        if holds {
            debug!("dropping trivial constraint {} {} 0", value, op);
        } else {
            warn!("infeasible constraint {} {} 0", value, op);
            self.infeasible = true;
        }
    }
}

// Queries
impl Sdbm {
    /// Number of positions, including the zero position.
    pub fn num_positions(&self) -> usize {
        self.axes.len()
    }

    /// What a position stands for; `None` if the position is out of range.
    pub fn axis(&self, position: Position) -> Option<Axis> {
        self.axes.get(position.index()).copied()
    }

    /// Upper bound on `x_row - x_col`, if any.
    pub fn bound(&self, row: Position, col: Position) -> Option<i64> {
        self.bounds.get(&(row, col)).copied()
    }

    /// Number of finite cells.
    pub fn num_bounds(&self) -> usize {
        self.bounds.len()
    }

    /// Position of a dimension, symbol or stripe expression.
    pub fn position_of(&self, e: ExprId) -> Option<Position> {
        self.positions.get(&e).copied()
    }

    /// Expression standing at a position; `None` for the zero position.
    pub fn expr_at(&self, position: Position) -> Option<ExprId> {
        match self.axis(position)? {
            Axis::Zero => None,
            Axis::Input(e) => Some(e),
            Axis::Temporary { stripe, .. } => Some(stripe),
        }
    }

    /// Defining stripe of a temporary position.
    pub fn stripe_at(&self, position: Position) -> Option<ExprId> {
        match self.axis(position)? {
            Axis::Temporary { stripe, .. } => Some(stripe),
            _ => None,
        }
    }

    /// Whether a constant-only constraint was violated during assembly.
    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    /// Bound implied by a stripe definition for the cell `(row, col)`, if any.
    fn stripe_bound(&self, row: Position, col: Position) -> Option<i64> {
        match (self.axis(row)?, self.axis(col)?) {
            (Axis::Temporary { var, .. }, _) if var == col => Some(0),
            (_, Axis::Temporary { var, factor, .. }) if var == row => Some(factor - 1),
            _ => None,
        }
    }

    fn is_stripe_bound(&self, row: Position, col: Position, bound: i64) -> bool {
        self.stripe_bound(row, col) == Some(bound)
    }
}

// Extraction
impl Sdbm {
    /// Decompose the matrix into `(inequalities, equalities)`.
    ///
    /// A pair of cells `bound[i][j] = c` and `bound[j][i] = -c` yields the single equality
    /// `x_i - x_j - c = 0`; every other cell yields the inequality `x_i - x_j - c <= 0`.
    /// Cells that only restate a stripe definition are not emitted.
    pub fn get_expressions(&self, mgr: &SdbmManager) -> (Vec<ExprId>, Vec<ExprId>) {
        let mut inequalities = Vec::new();
        let mut equalities = Vec::new();

        if self.infeasible {
            debug!("get_expressions: infeasible matrix");
            equalities.push(mgr.constant(1));
            return (inequalities, equalities);
        }

        let mut consumed = HashSet::new();
        for (&(row, col), &bound) in &self.bounds {
            if consumed.contains(&(row, col)) {
                continue;
            }

            if let Some(back) = self.bound(col, row) {
                let implied = self.is_stripe_bound(row, col, bound) && self.is_stripe_bound(col, row, back);
                if Some(back) == bound.checked_neg() && !implied {
                    consumed.insert((row, col));
                    consumed.insert((col, row));
                    let e = if row.is_zero() {
                        self.difference_expr(mgr, col, row, back)
                    } else {
                        self.difference_expr(mgr, row, col, bound)
                    };
                    debug!("equality: {} = 0", mgr.format_expr(e));
                    equalities.push(e);
                    continue;
                }
            }

            if self.is_stripe_bound(row, col, bound) {
                continue;
            }
            let e = self.difference_expr(mgr, row, col, bound);
            debug!("inequality: {} <= 0", mgr.format_expr(e));
            inequalities.push(e);
        }

        (inequalities, equalities)
    }

    /// Build `x_row - x_col - bound`.
    fn difference_expr(&self, mgr: &SdbmManager, row: Position, col: Position, bound: i64) -> ExprId {
        let diff = match (self.expr_at(row), self.expr_at(col)) {
            (Some(x), Some(y)) => mgr.subtract(x, y),
            (Some(x), None) => x,
            (None, Some(y)) => mgr.negate(y),
            (None, None) => mgr.zero(),
        };
        mgr.add_constant(diff, -bound)
    }

    /// Render the positions and finite cells.
    pub fn dump(&self, mgr: &SdbmManager) -> String {
        let mut lines = Vec::new();
        lines.push(format!("SDBM ({} positions, {} bounds):", self.num_positions(), self.num_bounds()));
        for (index, axis) in self.axes.iter().enumerate() {
            let position = Position::new(index);
            let line = match *axis {
                Axis::Zero => format!("  {} := 0", position),
                Axis::Input(e) => format!("  {} := {}", position, mgr.format_expr(e)),
                Axis::Temporary { stripe, var, factor } => {
                    format!("  {} := {} # {} ({})", position, var, factor, mgr.format_expr(stripe))
                }
            };
            lines.push(line);
        }
        for (&(row, col), &bound) in &self.bounds {
            lines.push(format!("  {} - {} <= {}", row, col, bound));
        }
        if self.infeasible {
            lines.push("  infeasible".to_string());
        }
        lines.join("\n")
    }
}

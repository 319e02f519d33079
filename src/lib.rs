//! # sdbm-rs: Striped Difference-Bound Matrices in Rust
//!
//! **`sdbm-rs`** is a manager-centric library for **striped difference-bound matrices (SDBMs)**,
//! a restricted but cheap form of integer set constraints used by polyhedral analyses.
//!
//! ## What is an SDBM?
//!
//! A difference-bound matrix stores constraints of the form `x_i - x_j <= c`.
//! An SDBM extends it with **stripes**: `x # C` denotes `x` rounded down to the nearest
//! multiple of `C`, which lets the matrix describe tiled and strided iteration spaces.
//! Stripes are modeled as extra temporary variables, so all usual DBM algorithms still apply.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All expressions are created through the
//!   [`SdbmManager`][crate::manager::SdbmManager]. It hash-conses every node, so two handles are
//!   equal exactly when the expressions are structurally equal.
//! - **Canonical Forms**: Arithmetic in [`builder`] folds eagerly, keeping every expression in a
//!   unique normal form (constants hoisted to the top, double negations removed, ...).
//! - **Affine Bridge**: Lossless conversion into [`AffineExpr`][crate::affine::AffineExpr] and
//!   best-effort recognition of the representable fragment on the way back.
//! - **Matrix Form**: [`Sdbm`][crate::dbm::Sdbm] assembles constraint systems into a sparse bound
//!   matrix and extracts them back as equalities and inequalities.
//!
//! ## Basic Usage
//!
//! ```rust
//! use sdbm_rs::dbm::Sdbm;
//! use sdbm_rs::manager::SdbmManager;
//!
//! // 1. Initialize the manager
//! let mgr = SdbmManager::default();
//!
//! // 2. Create inputs
//! let d0 = mgr.dim(0);
//! let s0 = mgr.symbol(0);
//!
//! // 3. Build `s0 # 4 - d0`, i.e. `d0` is `s0` rounded down to a multiple of 4
//! let tile = mgr.stripe(s0, 4);
//! let eq = mgr.eval(tile - d0);
//! assert_eq!(mgr.format_expr(eq), "s0 # 4 - d0");
//!
//! // 4. Go through the matrix form and back
//! let sdbm = Sdbm::build(&mgr, &[], &[eq]);
//! let (inequalities, equalities) = sdbm.get_expressions(&mgr);
//! assert!(inequalities.is_empty());
//! assert_eq!(equalities.len(), 1);
//!
//! // 5. Convert to a general affine expression
//! let affine = mgr.to_affine(tile);
//! assert_eq!(affine.to_string(), "s0 floordiv 4 * 4");
//! assert_eq!(mgr.try_from_affine(&affine), Some(tile));
//! ```
//!
//! ## Core Components
//!
//! - **[`manager`]**: The unique table, raw constructors and capability queries.
//! - **[`builder`]**: Canonicalizing arithmetic.
//! - **[`bridge`]**: Conversion to and from [`affine`] expressions.
//! - **[`dbm`]**: Assembly and extraction of striped difference-bound matrices.
//!
//! The manager uses interior mutability and is not `Sync`. Share it across threads by wrapping
//! it in a `Mutex`.

pub mod affine;
pub mod bridge;
pub mod builder;
pub mod dbm;
pub mod debug;
pub mod eval;
pub mod manager;
pub mod node;
pub mod reference;
pub mod table;
pub mod types;
pub mod utils;

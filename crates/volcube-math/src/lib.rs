//! # volcube-math
//!
//! Mathematical utilities: matrix/array newtypes (over nalgebra), the
//! normal distribution (via statrs), 1D/2D interpolation including the SABR
//! smile, and the optimizers used to calibrate it.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `Array` — one-dimensional vector of reals.
pub mod array;

/// Standard normal distribution functions.
pub mod distributions;

/// 1D and 2D interpolation schemes, SABR interpolation.
pub mod interpolations;

/// `Matrix` — two-dimensional matrix of reals with row/column insertion.
pub mod matrix;

/// Cost functions, constraints, end criteria and optimizers.
pub mod optimization;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use distributions::{normal_cdf, normal_pdf};
pub use matrix::Matrix;

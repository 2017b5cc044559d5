//! Error types for volcube-rs.
//!
//! Every fallible operation in the workspace reports one of the variants of
//! [`Error`]. Data errors are raised eagerly, either while a cube is being
//! built or by the mutating call that received inconsistent data. Queries on
//! a built cube only fail when a collaborator they consult does, e.g. an ATM
//! strike requested for a non-positive swap length.

use crate::{Real, Time};
use thiserror::Error;

/// The top-level error type used throughout volcube-rs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A grid was given fewer than two points on one of its axes.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// An input sequence that must be strictly increasing is not.
    #[error("{what} not strictly increasing at index {index}: {previous} >= {value}")]
    NonMonotonicInput {
        /// Name of the offending sequence.
        what: String,
        /// Index of the first element breaking monotonicity.
        index: usize,
        /// The element preceding `index`.
        previous: Real,
        /// The element at `index`.
        value: Real,
    },

    /// A matrix or vector shape is inconsistent with the grid axes.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Index out of range.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// A SABR fit did not reach the required accuracy.
    #[error(
        "accuracy not reached at option time {option_time}, swap length {swap_length}: \
         rms error {error:e} >= tolerance {tolerance:e}"
    )]
    CalibrationAccuracy {
        /// Option time of the failing node.
        option_time: Time,
        /// Swap length of the failing node.
        swap_length: Time,
        /// RMS fit error reached by the optimizer.
        error: Real,
        /// Required accuracy.
        tolerance: Real,
    },

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Shorthand `Result` type used throughout volcube-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use volcube_core::{ensure, errors::Error};
/// fn positive(x: f64) -> volcube_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Check that `values` is strictly increasing.
///
/// Nothing is sorted: out-of-order data is reported as
/// [`Error::NonMonotonicInput`] naming `what` and the first offending index.
pub fn check_strictly_increasing(values: &[Real], what: &str) -> Result<()> {
    for (i, pair) in values.windows(2).enumerate() {
        // written as a negation so that NaN is rejected too
        if !(pair[0] < pair[1]) {
            return Err(Error::NonMonotonicInput {
                what: what.to_string(),
                index: i + 1,
                previous: pair[0],
                value: pair[1],
            });
        }
    }
    Ok(())
}

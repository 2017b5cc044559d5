//! # volcube-time
//!
//! Calendar periods and the conventions that turn them into year fractions.
//!
//! The cube is quoted on calendar tenors (`1Y`, `6M`, ...) but all of its
//! interpolation happens in time; [`TimeConvention`] is the seam where the
//! conversion is plugged in.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Payment frequencies.
pub mod frequency;

/// `Period` — a length expressed in a `TimeUnit`.
pub mod period;

/// Period-to-time conversion conventions.
pub mod time_convention;

/// Units of time.
pub mod time_unit;

pub use frequency::Frequency;
pub use period::Period;
pub use time_convention::{TimeConvention, YearFractionConvention};
pub use time_unit::TimeUnit;

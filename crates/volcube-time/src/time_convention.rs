//! Period-to-time conventions.
//!
//! Calendar adjustment and day counting are outside the scope of the cube;
//! the cube only needs to know, for each quoted tenor, the option time and
//! the swap length in years. [`TimeConvention`] is that interface and
//! [`YearFractionConvention`] is the plain Actual/365-style implementation
//! used when no calendar is involved.

use crate::period::Period;
use crate::time_unit::TimeUnit;
use volcube_core::{Real, Time};

/// Converts quoted tenors to year fractions.
pub trait TimeConvention: std::fmt::Debug + Send + Sync {
    /// Time from the reference date to the expiry of an option quoted with
    /// tenor `expiry`.
    fn option_time(&self, expiry: &Period) -> Time;

    /// Length in years of a swap quoted with tenor `tenor`.
    fn swap_length(&self, tenor: &Period) -> Time;
}

/// Converts days and weeks with a fixed day basis and months/years exactly.
///
/// `1Y → 1.0`, `6M → 0.5`, `1W → 7/365`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearFractionConvention {
    days_per_year: Real,
}

impl YearFractionConvention {
    /// Create a convention with the given day basis.
    pub fn new(days_per_year: Real) -> Self {
        Self { days_per_year }
    }

    /// Year fraction of `p`.
    pub fn year_fraction(&self, p: &Period) -> Time {
        let length = Real::from(p.length);
        match p.unit {
            TimeUnit::Days => length / self.days_per_year,
            TimeUnit::Weeks => 7.0 * length / self.days_per_year,
            TimeUnit::Months => length / 12.0,
            TimeUnit::Years => length,
        }
    }
}

impl Default for YearFractionConvention {
    fn default() -> Self {
        Self::new(365.0)
    }
}

impl TimeConvention for YearFractionConvention {
    fn option_time(&self, expiry: &Period) -> Time {
        self.year_fraction(expiry)
    }

    fn swap_length(&self, tenor: &Period) -> Time {
        self.year_fraction(tenor)
    }
}

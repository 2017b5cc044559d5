//! `Period` — a time span expressed in a [`TimeUnit`].

use crate::frequency::Frequency;
use crate::time_unit::TimeUnit;

/// A time span made up of an integer length and a [`TimeUnit`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    /// Number of units.
    pub length: i32,
    /// The unit of time.
    pub unit: TimeUnit,
}

impl Period {
    /// Create a new period.
    pub fn new(length: i32, unit: TimeUnit) -> Self {
        Self { length, unit }
    }

    /// A period of `n` years.
    pub fn years(n: i32) -> Self {
        Self::new(n, TimeUnit::Years)
    }

    /// A period of `n` months.
    pub fn months(n: i32) -> Self {
        Self::new(n, TimeUnit::Months)
    }

    /// The accrual period of a leg paying with frequency `freq`.
    pub fn from_frequency(freq: Frequency) -> Self {
        match freq {
            Frequency::Annual => Period::new(1, TimeUnit::Years),
            Frequency::Semiannual => Period::new(6, TimeUnit::Months),
            Frequency::EveryFourthMonth => Period::new(4, TimeUnit::Months),
            Frequency::Quarterly => Period::new(3, TimeUnit::Months),
            Frequency::Bimonthly => Period::new(2, TimeUnit::Months),
            Frequency::Monthly => Period::new(1, TimeUnit::Months),
        }
    }

    /// Normalise the period: weeks become days, whole-year months become years.
    pub fn normalized(self) -> Self {
        let (length, unit) = match self.unit {
            TimeUnit::Weeks => (self.length * 7, TimeUnit::Days),
            TimeUnit::Months if self.length % 12 == 0 => (self.length / 12, TimeUnit::Years),
            _ => (self.length, self.unit),
        };
        Period { length, unit }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let abbr = match self.unit {
            TimeUnit::Days => "D",
            TimeUnit::Weeks => "W",
            TimeUnit::Months => "M",
            TimeUnit::Years => "Y",
        };
        write!(f, "{}{abbr}", self.length)
    }
}

impl std::fmt::Debug for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Period({self})")
    }
}

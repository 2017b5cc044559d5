//! `Frequency` — how often swap-leg payments recur.

/// Payment frequency of a swap leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// Annual (once per year).
    Annual = 1,
    /// Semi-annual (twice per year).
    Semiannual = 2,
    /// Every fourth month (three times per year).
    EveryFourthMonth = 3,
    /// Quarterly (four times per year).
    Quarterly = 4,
    /// Bi-monthly (six times per year).
    Bimonthly = 6,
    /// Monthly (twelve times per year).
    Monthly = 12,
}

impl Frequency {
    /// Number of periods per year.
    pub fn periods_per_year(&self) -> u32 {
        *self as u32
    }

    /// Length in years of one accrual period.
    pub fn accrual_period(&self) -> f64 {
        1.0 / f64::from(self.periods_per_year())
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Frequency::Annual => "Annual",
            Frequency::Semiannual => "Semiannual",
            Frequency::EveryFourthMonth => "Every-Fourth-Month",
            Frequency::Quarterly => "Quarterly",
            Frequency::Bimonthly => "Bimonthly",
            Frequency::Monthly => "Monthly",
        };
        write!(f, "{s}")
    }
}

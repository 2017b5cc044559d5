//! `FlatForward` — a yield curve with a constant forward rate.

use crate::yield_term_structure::YieldTermStructure;
use volcube_core::{ensure, errors::Result, DiscountFactor, Rate, Time};
use volcube_time::Frequency;

/// A flat (constant) forward-rate curve.
///
/// Discount factors are `P(t) = exp(-r·t)` with `r` the continuously
/// compounded equivalent of the quoted rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatForward {
    rate: Rate,
}

impl FlatForward {
    /// A curve quoted with continuous compounding.
    pub fn continuous(rate: Rate) -> Self {
        Self { rate }
    }

    /// A curve quoted with compounding at `frequency`.
    ///
    /// Fails if `1 + rate / n` is not positive.
    pub fn compounded(rate: Rate, frequency: Frequency) -> Result<Self> {
        let n = Rate::from(frequency.periods_per_year());
        ensure!(
            1.0 + rate / n > 0.0,
            "rate {rate} is below -100% at {frequency} compounding"
        );
        Ok(Self {
            rate: n * (1.0 + rate / n).ln(),
        })
    }

    /// The continuously-compounded flat rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl YieldTermStructure for FlatForward {
    fn discount(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn zero_rate(&self, _t: Time) -> Rate {
        self.rate
    }

    fn forward_rate(&self, _t1: Time, _t2: Time) -> Rate {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn continuous_discounting() {
        let curve = FlatForward::continuous(0.05);
        assert_abs_diff_eq!(curve.discount(2.0), (-0.1_f64).exp(), epsilon = 1e-15);
        assert_eq!(curve.discount(0.0), 1.0);
        assert_eq!(curve.zero_rate(7.0), 0.05);
    }

    #[test]
    fn annual_compounding_matches_quote() {
        let curve = FlatForward::compounded(0.05, Frequency::Annual).unwrap();
        assert_abs_diff_eq!(1.0 / curve.discount(1.0), 1.05, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.rate(), 1.05_f64.ln(), epsilon = 1e-15);
    }

    #[test]
    fn default_rate_methods_agree_with_flat_rate() {
        #[derive(Debug)]
        struct Wrapped(FlatForward);
        impl YieldTermStructure for Wrapped {
            fn discount(&self, t: Time) -> DiscountFactor {
                self.0.discount(t)
            }
        }
        let curve = Wrapped(FlatForward::continuous(0.03));
        assert_abs_diff_eq!(curve.zero_rate(5.0), 0.03, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.forward_rate(1.0, 3.0), 0.03, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.forward_rate(2.0, 2.0), 0.03, epsilon = 1e-8);
    }

    #[test]
    fn rejects_impossible_rate() {
        assert!(FlatForward::compounded(-1.5, Frequency::Annual).is_err());
    }
}

//! ATM strikes from vanilla swaps.
//!
//! The ATM strike of a swaption is the par rate of its underlying swap:
//! floating leg value over fixed leg annuity. With a single curve used for
//! both forwarding and discounting the floating leg is worth
//! `P(start) − P(end)`, whatever its frequency.

use std::sync::Arc;

use crate::yield_term_structure::YieldTermStructure;
use volcube_core::{ensure, errors::Result, Rate, Real, Time};
use volcube_time::Frequency;

/// Anything that can provide the ATM forward swap rate for an
/// `(option_time, swap_length)` pair.
pub trait AtmStrikeProvider: std::fmt::Debug + Send + Sync {
    /// Par rate of the swap starting at the option's settlement and running
    /// for `swap_length` years.
    fn atm_strike(&self, option_time: Time, swap_length: Time) -> Result<Rate>;
}

/// Conventions of the underlying vanilla swap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapConventions {
    /// Fixed-leg payment frequency.
    pub fixed_leg_frequency: Frequency,
    /// Time between option expiry and swap start.
    pub settlement_lag: Time,
    /// Swaps this long or shorter are forwarded on the short-tenor curve.
    pub short_tenor: Time,
}

impl Default for SwapConventions {
    /// Annual fixed leg, two-day settlement, no short-tenor switch.
    fn default() -> Self {
        Self {
            fixed_leg_frequency: Frequency::Annual,
            settlement_lag: 2.0 / 365.0,
            short_tenor: 0.0,
        }
    }
}

/// Par swap rate calculator over one or two curves.
#[derive(Debug, Clone)]
pub struct SwapRateCalculator {
    curve: Arc<dyn YieldTermStructure>,
    short_tenor_curve: Option<Arc<dyn YieldTermStructure>>,
    conventions: SwapConventions,
}

impl SwapRateCalculator {
    /// A calculator pricing every swap on `curve`.
    pub fn new(curve: Arc<dyn YieldTermStructure>, conventions: SwapConventions) -> Self {
        Self {
            curve,
            short_tenor_curve: None,
            conventions,
        }
    }

    /// Price swaps no longer than `conventions.short_tenor` on `curve`.
    pub fn with_short_tenor_curve(mut self, curve: Arc<dyn YieldTermStructure>) -> Self {
        self.short_tenor_curve = Some(curve);
        self
    }

    /// The swap conventions.
    pub fn conventions(&self) -> &SwapConventions {
        &self.conventions
    }

    fn curve_for(&self, swap_length: Time) -> &dyn YieldTermStructure {
        match &self.short_tenor_curve {
            Some(short) if swap_length <= self.conventions.short_tenor => short.as_ref(),
            _ => self.curve.as_ref(),
        }
    }

    /// Fixed-leg payment times between `start` and `end`.
    ///
    /// Generated backwards from `end`, so any broken period is the first one.
    /// `start` itself is included as the first entry.
    pub fn fixed_schedule(&self, start: Time, end: Time) -> Vec<Time> {
        let step = self.conventions.fixed_leg_frequency.accrual_period();
        let mut times = vec![end];
        let mut i = 1;
        loop {
            let t = end - step * i as Real;
            // a stub shorter than a day is merged into its neighbour
            if t <= start + 1.0 / 365.0 {
                break;
            }
            times.push(t);
            i += 1;
        }
        times.push(start);
        times.reverse();
        times
    }

    /// Fixed-leg annuity `Σ τᵢ P(tᵢ)` on the curve used for `swap_length`.
    pub fn annuity(&self, start: Time, swap_length: Time) -> Real {
        let curve = self.curve_for(swap_length);
        self.fixed_schedule(start, start + swap_length)
            .windows(2)
            .map(|w| (w[1] - w[0]) * curve.discount(w[1]))
            .sum()
    }
}

impl AtmStrikeProvider for SwapRateCalculator {
    fn atm_strike(&self, option_time: Time, swap_length: Time) -> Result<Rate> {
        ensure!(swap_length > 0.0, "swap length must be positive, got {swap_length}");
        ensure!(option_time >= 0.0, "option time must not be negative, got {option_time}");
        let start = option_time + self.conventions.settlement_lag;
        let end = start + swap_length;
        let curve = self.curve_for(swap_length);
        let annuity = self.annuity(start, swap_length);
        ensure!(annuity > 0.0, "non-positive annuity {annuity}");
        Ok((curve.discount(start) - curve.discount(end)) / annuity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_forward::FlatForward;
    use approx::assert_abs_diff_eq;

    fn calculator(rate: Rate) -> SwapRateCalculator {
        let conventions = SwapConventions {
            settlement_lag: 0.0,
            ..SwapConventions::default()
        };
        SwapRateCalculator::new(Arc::new(FlatForward::continuous(rate)), conventions)
    }

    #[test]
    fn schedule_has_front_stub() {
        let calc = calculator(0.05);
        let times = calc.fixed_schedule(1.0, 3.5);
        assert_eq!(times.len(), 4);
        assert_abs_diff_eq!(times[0], 1.0);
        assert_abs_diff_eq!(times[1], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(times[2], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(times[3], 3.5);
    }

    #[test]
    fn annual_par_rate_on_annually_compounded_curve() {
        let curve = FlatForward::compounded(0.04, Frequency::Annual).unwrap();
        let calc = SwapRateCalculator::new(
            Arc::new(curve),
            SwapConventions {
                settlement_lag: 0.0,
                ..SwapConventions::default()
            },
        );
        // a flat annually compounded curve reprices an annual swap at its rate
        assert_abs_diff_eq!(calc.atm_strike(1.0, 5.0).unwrap(), 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(calc.atm_strike(3.0, 2.0).unwrap(), 0.04, epsilon = 1e-12);
    }

    #[test]
    fn settlement_lag_moves_start() {
        let lagged = SwapRateCalculator::new(
            Arc::new(FlatForward::continuous(0.03)),
            SwapConventions::default(),
        );
        let start = 1.0 + SwapConventions::default().settlement_lag;
        let expected = (lagged.curve.discount(start) - lagged.curve.discount(start + 2.0))
            / lagged.annuity(start, 2.0);
        assert_abs_diff_eq!(lagged.atm_strike(1.0, 2.0).unwrap(), expected, epsilon = 1e-15);
    }

    #[test]
    fn short_tenor_curve_used_up_to_threshold() {
        let conventions = SwapConventions {
            short_tenor: 1.0,
            settlement_lag: 0.0,
            ..SwapConventions::default()
        };
        let calc = SwapRateCalculator::new(Arc::new(FlatForward::continuous(0.05)), conventions)
            .with_short_tenor_curve(Arc::new(FlatForward::continuous(0.01)));
        let short = calc.atm_strike(1.0, 1.0).unwrap();
        let long = calc.atm_strike(1.0, 2.0).unwrap();
        assert!(short < 0.02);
        assert!(long > 0.04);
    }

    #[test]
    fn rejects_empty_swap() {
        assert!(calculator(0.05).atm_strike(1.0, 0.0).is_err());
    }
}

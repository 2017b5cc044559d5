//! `SmileSection` — the volatility smile of one (option time, swap length).
//!
//! Two concrete sections back the cubes: [`SabrSmileSection`], fitted to
//! quotes or built from known parameters, and [`InterpolatedSmileSection`],
//! a linear smile through quoted points.

use volcube_core::{errors::Result, Error, Rate, Real, Time, Volatility};
use volcube_math::distributions::{normal_cdf, normal_pdf};
use volcube_math::interpolations::{
    Interpolation1D, LinearInterpolation, SabrInterpolation, SabrParameters,
};

use crate::sabr_calibration::SabrCalibrationConfig;

/// Option type for smile section pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmileOptionType {
    /// Call (payer swaption).
    Call,
    /// Put (receiver swaption).
    Put,
}

/// A volatility smile at a single expiry.
pub trait SmileSection: std::fmt::Debug + Send + Sync {
    /// Time to expiry in years.
    fn exercise_time(&self) -> Time;

    /// ATM level (forward swap rate).
    fn atm_level(&self) -> Rate;

    /// Smallest strike the section was built on.
    fn min_strike(&self) -> Rate;

    /// Largest strike the section was built on.
    fn max_strike(&self) -> Rate;

    /// Black implied volatility at `strike`.
    fn volatility(&self, strike: Rate) -> Volatility;

    /// Total variance `σ²·T` at `strike`.
    fn variance(&self, strike: Rate) -> Real {
        let vol = self.volatility(strike);
        vol * vol * self.exercise_time()
    }

    /// Black price per unit annuity.
    fn option_price(&self, strike: Rate, option_type: SmileOptionType, discount: Real) -> Real {
        black_formula(
            self.atm_level(),
            strike,
            self.volatility(strike) * self.exercise_time().sqrt(),
            discount,
            option_type,
        )
    }

    /// Black vega per unit annuity for a one-point (1%) vol move.
    fn vega(&self, strike: Rate, discount: Real) -> Real {
        let t = self.exercise_time();
        let std_dev = self.volatility(strike) * t.sqrt();
        let forward = self.atm_level();
        if std_dev < 1e-15 || forward <= 0.0 || strike <= 0.0 {
            return 0.0;
        }
        let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
        discount * forward * normal_pdf(d1) * t.sqrt() * 0.01
    }
}

/// Black formula for a call or put with total standard deviation `std_dev`.
pub fn black_formula(
    forward: Rate,
    strike: Rate,
    std_dev: Real,
    discount: Real,
    option_type: SmileOptionType,
) -> Real {
    let intrinsic = match option_type {
        SmileOptionType::Call => (forward - strike).max(0.0),
        SmileOptionType::Put => (strike - forward).max(0.0),
    };
    if std_dev <= 0.0 || forward <= 0.0 || strike <= 0.0 {
        return discount * intrinsic;
    }
    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    match option_type {
        SmileOptionType::Call => discount * (forward * normal_cdf(d1) - strike * normal_cdf(d2)),
        SmileOptionType::Put => discount * (strike * normal_cdf(-d2) - forward * normal_cdf(-d1)),
    }
}

// ── SabrSmileSection ──────────────────────────────────────────────────────────

/// How a [`SabrSmileSection`] gets its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum SabrSmileInput {
    /// Fit to quoted `(strike, volatility)` samples around `forward`.
    Samples {
        /// ATM forward.
        forward: Rate,
        /// Strictly increasing strikes.
        strikes: Vec<Rate>,
        /// Quoted volatilities, one per strike.
        volatilities: Vec<Volatility>,
    },
    /// Known parameters; no fitting.
    Parameters {
        /// SABR parameters.
        params: SabrParameters,
        /// ATM forward.
        forward: Rate,
        /// Strikes spanning the section's domain.
        strikes: Vec<Rate>,
    },
}

/// A SABR smile for one (option time, swap length).
///
/// Built from samples, the fit must reach the configured accuracy or
/// construction fails with [`Error::CalibrationAccuracy`].
#[derive(Debug, Clone)]
pub struct SabrSmileSection {
    option_time: Time,
    swap_length: Time,
    interpolation: SabrInterpolation,
}

impl SabrSmileSection {
    /// Build the section for `(option_time, swap_length)` from `input`.
    pub fn new(
        option_time: Time,
        swap_length: Time,
        input: SabrSmileInput,
        config: &SabrCalibrationConfig,
    ) -> Result<Self> {
        let interpolation = match input {
            SabrSmileInput::Samples {
                forward,
                strikes,
                volatilities,
            } => {
                let method = config.method.build();
                let fit = SabrInterpolation::calibrate(
                    &strikes,
                    &volatilities,
                    option_time,
                    forward,
                    config.initial_parameters(),
                    method.as_ref(),
                    &config.end_criteria(),
                )?;
                // written as a negation so that a NaN error fails too
                if !(fit.rms_error() < config.accuracy_tolerance) {
                    tracing::warn!(
                        option_time,
                        swap_length,
                        rms_error = fit.rms_error(),
                        tolerance = config.accuracy_tolerance,
                        "SABR calibration accuracy not reached"
                    );
                    return Err(Error::CalibrationAccuracy {
                        option_time,
                        swap_length,
                        error: fit.rms_error(),
                        tolerance: config.accuracy_tolerance,
                    });
                }
                fit
            }
            SabrSmileInput::Parameters {
                params,
                forward,
                strikes,
            } => SabrInterpolation::with_parameters(&strikes, option_time, forward, params),
        };
        Ok(Self {
            option_time,
            swap_length,
            interpolation,
        })
    }

    /// Swap length of the underlying.
    pub fn swap_length(&self) -> Time {
        self.swap_length
    }

    /// The SABR parameters in use.
    pub fn params(&self) -> &SabrParameters {
        self.interpolation.params()
    }

    /// The underlying interpolation, with its fit diagnostics.
    pub fn interpolation(&self) -> &SabrInterpolation {
        &self.interpolation
    }
}

impl SmileSection for SabrSmileSection {
    fn exercise_time(&self) -> Time {
        self.option_time
    }

    fn atm_level(&self) -> Rate {
        self.interpolation.forward()
    }

    fn min_strike(&self) -> Rate {
        self.interpolation.x_min()
    }

    fn max_strike(&self) -> Rate {
        self.interpolation.x_max()
    }

    fn volatility(&self, strike: Rate) -> Volatility {
        self.interpolation.operator(strike)
    }
}

// ── InterpolatedSmileSection ──────────────────────────────────────────────────

/// A smile linear in strike through quoted points, extrapolated linearly.
#[derive(Debug, Clone)]
pub struct InterpolatedSmileSection {
    exercise_time: Time,
    forward: Rate,
    strikes: Vec<Rate>,
    interpolation: LinearInterpolation,
}

impl InterpolatedSmileSection {
    /// Build from strictly increasing `strikes` and their volatilities.
    pub fn new(
        exercise_time: Time,
        forward: Rate,
        strikes: Vec<Rate>,
        volatilities: &[Volatility],
    ) -> Result<Self> {
        let interpolation = LinearInterpolation::new(&strikes, volatilities)?;
        Ok(Self {
            exercise_time,
            forward,
            strikes,
            interpolation,
        })
    }
}

impl SmileSection for InterpolatedSmileSection {
    fn exercise_time(&self) -> Time {
        self.exercise_time
    }

    fn atm_level(&self) -> Rate {
        self.forward
    }

    fn min_strike(&self) -> Rate {
        self.strikes[0]
    }

    fn max_strike(&self) -> Rate {
        self.strikes[self.strikes.len() - 1]
    }

    fn volatility(&self, strike: Rate) -> Volatility {
        self.interpolation.operator(strike)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use volcube_math::interpolations::sabr_volatility;

    #[test]
    fn put_call_parity() {
        let (f, k, sd, df) = (0.04, 0.045, 0.2, 0.9);
        let call = black_formula(f, k, sd, df, SmileOptionType::Call);
        let put = black_formula(f, k, sd, df, SmileOptionType::Put);
        assert_abs_diff_eq!(call - put, df * (f - k), epsilon = 1e-14);
    }

    #[test]
    fn zero_vol_is_intrinsic() {
        assert_abs_diff_eq!(
            black_formula(0.05, 0.04, 0.0, 1.0, SmileOptionType::Call),
            0.01,
            epsilon = 1e-15
        );
        assert_eq!(black_formula(0.05, 0.04, 0.0, 1.0, SmileOptionType::Put), 0.0);
    }

    #[test]
    fn linear_section() {
        let s = InterpolatedSmileSection::new(2.0, 0.05, vec![0.04, 0.05, 0.06], &[0.22, 0.2, 0.19])
            .unwrap();
        assert_abs_diff_eq!(s.volatility(0.045), 0.21, epsilon = 1e-12);
        assert_abs_diff_eq!(s.variance(0.05), 0.2 * 0.2 * 2.0, epsilon = 1e-12);
        assert_eq!(s.min_strike(), 0.04);
        assert_eq!(s.max_strike(), 0.06);
        // extrapolation keeps the outer slope
        assert_abs_diff_eq!(s.volatility(0.07), 0.18, epsilon = 1e-12);
    }

    #[test]
    fn vega_matches_price_difference() {
        let s = InterpolatedSmileSection::new(1.0, 0.05, vec![0.04, 0.06], &[0.2, 0.2]).unwrap();
        let bumped = InterpolatedSmileSection::new(1.0, 0.05, vec![0.04, 0.06], &[0.21, 0.21]).unwrap();
        let diff = bumped.option_price(0.05, SmileOptionType::Call, 1.0)
            - s.option_price(0.05, SmileOptionType::Call, 1.0);
        assert_abs_diff_eq!(s.vega(0.05, 1.0), diff, epsilon = 1e-6);
    }

    #[test]
    fn sabr_from_parameters() {
        let params = SabrParameters::new(0.03, 0.5, 0.4, -0.2);
        let strikes: Vec<Rate> = (0..3).map(|i| 0.05 * i as Real + 0.01).collect();
        let s = SabrSmileSection::new(
            2.0,
            5.0,
            SabrSmileInput::Parameters {
                params,
                forward: 0.04,
                strikes,
            },
            &SabrCalibrationConfig::default(),
        )
        .unwrap();
        assert_eq!(s.swap_length(), 5.0);
        assert_eq!(s.atm_level(), 0.04);
        assert_eq!(s.min_strike(), 0.01);
        assert_abs_diff_eq!(s.max_strike(), 0.11, epsilon = 1e-15);
        assert_abs_diff_eq!(s.volatility(0.05), sabr_volatility(0.04, 0.05, 2.0, &params));
    }

    #[test]
    fn sabr_from_consistent_samples() {
        let truth = SabrParameters::new(0.025, 0.6, 0.35, 0.1);
        let strikes = vec![0.03, 0.04, 0.05, 0.06, 0.07];
        let volatilities = strikes.iter().map(|&k| sabr_volatility(0.05, k, 1.0, &truth)).collect();
        let s = SabrSmileSection::new(
            1.0,
            10.0,
            SabrSmileInput::Samples {
                forward: 0.05,
                strikes,
                volatilities,
            },
            &SabrCalibrationConfig::default(),
        )
        .unwrap();
        assert!(s.interpolation().rms_error() < 1e-4);
        assert_abs_diff_eq!(
            s.volatility(0.05),
            sabr_volatility(0.05, 0.05, 1.0, &truth),
            epsilon = 1e-4
        );
    }

    #[test]
    fn sabr_rejects_inconsistent_samples() {
        // a zigzag no SABR smile can follow
        let s = SabrSmileSection::new(
            1.0,
            2.0,
            SabrSmileInput::Samples {
                forward: 0.05,
                strikes: vec![0.03, 0.04, 0.05, 0.06, 0.07],
                volatilities: vec![0.30, 0.10, 0.30, 0.10, 0.30],
            },
            &SabrCalibrationConfig::default(),
        );
        match s {
            Err(Error::CalibrationAccuracy {
                option_time,
                swap_length,
                error,
                tolerance,
            }) => {
                assert_eq!(option_time, 1.0);
                assert_eq!(swap_length, 2.0);
                assert!(error >= tolerance);
            }
            other => panic!("expected CalibrationAccuracy, got {other:?}"),
        }
    }
}

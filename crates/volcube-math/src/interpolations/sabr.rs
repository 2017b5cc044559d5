//! SABR smile: the Hagan et al. (2002) implied Black volatility and a
//! least-squares fit of (α, β, ν, ρ) to a quoted smile.
//!
//! The fit runs in an unconstrained space: α and ν are squared (plus a small
//! floor), β is `exp(-y²)` and ρ is `0.9999·sin(y)`. Any optimizer step
//! therefore maps back to an admissible parameter set.

use tracing::trace;

use super::Interpolation1D;
use crate::array::Array;
use crate::optimization::{
    CostFunction, EndCriteria, EndCriteriaType, NoConstraint, OptimizationMethod,
};
use volcube_core::{check_strictly_increasing, ensure, errors::Error, errors::Result, Real, Time};

/// SABR model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SabrParameters {
    /// Alpha (initial vol-of-vol backbone)
    pub alpha: Real,
    /// Beta (CEV exponent: 0 = normal, 1 = log-normal)
    pub beta: Real,
    /// Nu (vol-of-vol)
    pub nu: Real,
    /// Rho (correlation between asset and vol increments)
    pub rho: Real,
}

impl SabrParameters {
    /// Bundle four parameters without validation.
    pub fn new(alpha: Real, beta: Real, nu: Real, rho: Real) -> Self {
        Self {
            alpha,
            beta,
            nu,
            rho,
        }
    }

    /// Fail with [`Error::InvalidArgument`] unless `α > 0`, `0 ≤ β ≤ 1`,
    /// `ν ≥ 0` and `-1 < ρ < 1`.
    pub fn validate(&self) -> Result<()> {
        let ok = self.alpha > 0.0
            && (0.0..=1.0).contains(&self.beta)
            && self.nu >= 0.0
            && self.rho > -1.0
            && self.rho < 1.0;
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "inadmissible SABR parameters {self:?}"
            )))
        }
    }

    /// Project onto the admissible region.
    ///
    /// Used for parameters produced by extrapolation, which may leave it.
    pub fn clamped(&self) -> Self {
        Self {
            alpha: self.alpha.max(MIN_ALPHA),
            beta: self.beta.clamp(0.0, 1.0),
            nu: self.nu.max(0.0),
            rho: self.rho.clamp(-MAX_RHO, MAX_RHO),
        }
    }
}

const MIN_ALPHA: Real = 1e-7;
const MAX_RHO: Real = 0.9999;
const MIN_STRIKE: Real = 1e-5;

/// Compute the SABR implied Black volatility.
///
/// # Arguments
/// * `f` — forward rate
/// * `k` — strike
/// * `t` — time to expiry (years)
/// * `p` — SABR parameters
///
/// `f` and `k` must be positive. At or very near the money the `z / x(z)`
/// factor is replaced by its expansion, so the formula is continuous in `k`.
pub fn sabr_volatility(f: Real, k: Real, t: Time, p: &SabrParameters) -> Real {
    let SabrParameters {
        alpha,
        beta,
        nu,
        rho,
    } = *p;
    let one_minus_beta = 1.0 - beta;
    let fk = f * k;
    let fk_beta = fk.powf(one_minus_beta);
    let fk_half_beta = fk.powf(one_minus_beta / 2.0);
    let log_fk = (f / k).ln();

    let z = (nu / alpha) * fk_half_beta * log_fk;
    let ratio = if z.abs() < 1e-8 {
        1.0 - 0.5 * rho * z
    } else {
        let root = (1.0 - 2.0 * rho * z + z * z).max(0.0).sqrt();
        let xz = ((root + z - rho) / (1.0 - rho)).ln();
        z / xz
    };

    let a = one_minus_beta * one_minus_beta;
    let log_sq = log_fk * log_fk;
    let denom = fk_half_beta * (1.0 + a / 24.0 * log_sq + a * a / 1920.0 * log_sq * log_sq);
    let correction = 1.0
        + (a / 24.0 * alpha * alpha / fk_beta
            + 0.25 * rho * beta * nu * alpha / fk_half_beta
            + (2.0 - 3.0 * rho * rho) / 24.0 * nu * nu)
            * t;

    alpha / denom * ratio * correction
}

// ── Parameter transformation ──────────────────────────────────────────────────

fn to_params(y: &Array) -> SabrParameters {
    let positive = |v: Real| {
        if v.abs() < 5.0 {
            v * v + MIN_ALPHA
        } else {
            10.0 * v.abs() - 25.0 + MIN_ALPHA
        }
    };
    let beta_cut = (-MIN_ALPHA.ln()).sqrt();
    SabrParameters {
        alpha: positive(y[0]),
        beta: if y[1].abs() < beta_cut {
            (-y[1] * y[1]).exp()
        } else {
            MIN_ALPHA
        },
        nu: positive(y[2]),
        rho: if y[3].abs() < 2.5 * std::f64::consts::PI {
            MAX_RHO * y[3].sin()
        } else {
            MAX_RHO * y[3].signum()
        },
    }
}

fn from_params(p: &SabrParameters) -> Array {
    Array::from_slice(&[
        (p.alpha - MIN_ALPHA).max(0.0).sqrt(),
        (-p.beta.max(MIN_ALPHA).ln()).max(0.0).sqrt(),
        (p.nu - MIN_ALPHA).max(0.0).sqrt(),
        (p.rho / MAX_RHO).clamp(-1.0, 1.0).asin(),
    ])
}

struct SmileResiduals<'a> {
    strikes: &'a [Real],
    volatilities: &'a [Real],
    expiry: Time,
    forward: Real,
}

impl CostFunction for SmileResiduals<'_> {
    fn values(&self, y: &Array) -> Array {
        let p = to_params(y);
        self.strikes
            .iter()
            .zip(self.volatilities)
            .map(|(&k, &vol)| sabr_volatility(self.forward, k, self.expiry, &p) - vol)
            .collect::<Vec<_>>()
            .into()
    }
}

// ── SabrInterpolation ─────────────────────────────────────────────────────────

/// A SABR smile over a set of strikes, either fitted to quoted volatilities
/// or built directly from known parameters.
#[derive(Debug, Clone)]
pub struct SabrInterpolation {
    strikes: Vec<Real>,
    volatilities: Vec<Real>,
    expiry: Time,
    forward: Real,
    params: SabrParameters,
    rms_error: Real,
    max_error: Real,
    end_type: Option<EndCriteriaType>,
    iterations: usize,
}

impl SabrInterpolation {
    /// Fit SABR parameters to `(strikes, volatilities)` starting from `guess`.
    ///
    /// Strikes must be positive and strictly increasing. The fit itself never
    /// fails on poor accuracy; callers inspect [`Self::rms_error`].
    pub fn calibrate(
        strikes: &[Real],
        volatilities: &[Real],
        expiry: Time,
        forward: Real,
        guess: SabrParameters,
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
    ) -> Result<Self> {
        if strikes.len() != volatilities.len() {
            return Err(Error::DimensionMismatch(format!(
                "{} strikes but {} volatilities",
                strikes.len(),
                volatilities.len()
            )));
        }
        ensure!(strikes.len() >= 2, "at least 2 strikes required, got {}", strikes.len());
        check_strictly_increasing(strikes, "strikes")?;
        ensure!(forward > 0.0, "forward must be positive, got {forward}");
        ensure!(strikes[0] > 0.0, "strikes must be positive, got {}", strikes[0]);
        ensure!(expiry >= 0.0, "negative expiry {expiry}");
        guess.validate()?;

        let residuals = SmileResiduals {
            strikes,
            volatilities,
            expiry,
            forward,
        };
        let result = method.minimize(&residuals, &NoConstraint, &from_params(&guess), end_criteria)?;
        let params = to_params(&result.x);

        let mut fitted = Self {
            strikes: strikes.to_vec(),
            volatilities: volatilities.to_vec(),
            expiry,
            forward,
            params,
            rms_error: 0.0,
            max_error: 0.0,
            end_type: Some(result.end_type),
            iterations: result.iterations,
        };
        let errors: Vec<Real> = strikes
            .iter()
            .zip(volatilities)
            .map(|(&k, &vol)| (fitted.operator(k) - vol).abs())
            .collect();
        fitted.rms_error =
            (errors.iter().map(|e| e * e).sum::<Real>() / errors.len() as Real).sqrt();
        fitted.max_error = errors.iter().copied().fold(0.0, Real::max);
        trace!(
            expiry,
            forward,
            rms_error = fitted.rms_error,
            iterations = fitted.iterations,
            "SABR fit"
        );
        Ok(fitted)
    }

    /// Build a smile from known parameters; nothing is fitted.
    ///
    /// `strikes` only define the reported domain. Parameters outside the
    /// admissible region are clamped onto it.
    pub fn with_parameters(
        strikes: &[Real],
        expiry: Time,
        forward: Real,
        params: SabrParameters,
    ) -> Self {
        let params = params.clamped();
        let forward = forward.max(MIN_STRIKE);
        let volatilities = strikes
            .iter()
            .map(|&k| sabr_volatility(forward, k.max(MIN_STRIKE), expiry, &params))
            .collect();
        Self {
            strikes: strikes.to_vec(),
            volatilities,
            expiry,
            forward,
            params,
            rms_error: 0.0,
            max_error: 0.0,
            end_type: None,
            iterations: 0,
        }
    }

    /// The model parameters.
    pub fn params(&self) -> &SabrParameters {
        &self.params
    }
    /// Alpha.
    pub fn alpha(&self) -> Real {
        self.params.alpha
    }
    /// Beta.
    pub fn beta(&self) -> Real {
        self.params.beta
    }
    /// Nu.
    pub fn nu(&self) -> Real {
        self.params.nu
    }
    /// Rho.
    pub fn rho(&self) -> Real {
        self.params.rho
    }
    /// Forward the smile is centred on.
    pub fn forward(&self) -> Real {
        self.forward
    }
    /// Time to expiry.
    pub fn expiry(&self) -> Time {
        self.expiry
    }
    /// Strikes of the smile.
    pub fn strikes(&self) -> &[Real] {
        &self.strikes
    }
    /// Quoted volatilities (model values for a directly built smile).
    pub fn volatilities(&self) -> &[Real] {
        &self.volatilities
    }

    /// Root-mean-square fit error over the quoted strikes.
    pub fn rms_error(&self) -> Real {
        self.rms_error
    }

    /// Largest absolute fit error over the quoted strikes.
    pub fn max_error(&self) -> Real {
        self.max_error
    }

    /// Why the optimizer stopped; `None` when nothing was fitted.
    pub fn end_type(&self) -> Option<EndCriteriaType> {
        self.end_type
    }

    /// Optimizer iterations spent on the fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl Interpolation1D for SabrInterpolation {
    fn operator(&self, strike: Real) -> Real {
        sabr_volatility(self.forward, strike.max(MIN_STRIKE), self.expiry, &self.params)
    }

    fn x_min(&self) -> Real {
        self.strikes.first().copied().unwrap_or(self.forward)
    }

    fn x_max(&self) -> Real {
        self.strikes.last().copied().unwrap_or(self.forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{LevenbergMarquardt, Simplex};
    use approx::assert_abs_diff_eq;

    fn tight() -> EndCriteria {
        EndCriteria::new(1000, 100, 1e-16, 1e-16, 1e-16)
    }

    #[test]
    fn continuous_through_the_money() {
        let p = SabrParameters::new(0.04, 0.5, 0.4, -0.3);
        let f = 0.05;
        let atm = sabr_volatility(f, f, 1.0, &p);
        let near = sabr_volatility(f, f * (1.0 + 1e-10), 1.0, &p);
        assert!(atm.is_finite() && atm > 0.0);
        assert_abs_diff_eq!(atm, near, epsilon = 1e-9);
    }

    #[test]
    fn lognormal_without_vol_of_vol_is_flat() {
        let p = SabrParameters::new(0.2, 1.0, 0.0, 0.0);
        for k in [0.02, 0.05, 0.09] {
            assert_abs_diff_eq!(sabr_volatility(0.05, k, 2.0, &p), 0.2, epsilon = 1e-12);
        }
    }

    #[test]
    fn negative_rho_skews_down() {
        let p = SabrParameters::new(0.03, 0.5, 0.5, -0.5);
        let low = sabr_volatility(0.05, 0.03, 1.0, &p);
        let high = sabr_volatility(0.05, 0.07, 1.0, &p);
        assert!(low > high);
    }

    #[test]
    fn transformation_round_trip() {
        let p = SabrParameters::new(0.03, 0.6, 0.35, -0.4);
        let back = to_params(&from_params(&p));
        assert_abs_diff_eq!(back.alpha, p.alpha, epsilon = 1e-12);
        assert_abs_diff_eq!(back.beta, p.beta, epsilon = 1e-12);
        assert_abs_diff_eq!(back.nu, p.nu, epsilon = 1e-12);
        assert_abs_diff_eq!(back.rho, p.rho, epsilon = 1e-12);
    }

    #[test]
    fn fit_recovers_consistent_smile() {
        let truth = SabrParameters::new(0.035, 0.5, 0.45, -0.25);
        let f = 0.04;
        let strikes: Vec<Real> = (0..7).map(|i| 0.02 + 0.005 * i as Real).collect();
        let vols: Vec<Real> = strikes.iter().map(|&k| sabr_volatility(f, k, 3.0, &truth)).collect();
        let guess = SabrParameters::new(0.02, 0.36, 0.4, 0.2);
        let fit = SabrInterpolation::calibrate(
            &strikes,
            &vols,
            3.0,
            f,
            guess,
            &LevenbergMarquardt::default(),
            &tight(),
        )
        .unwrap();
        assert!(fit.rms_error() < 1e-5, "rms {}", fit.rms_error());
        assert!(fit.max_error() >= fit.rms_error() * 0.999);
        for &k in &strikes {
            assert_abs_diff_eq!(fit.operator(k), sabr_volatility(f, k, 3.0, &truth), epsilon = 1e-5);
        }
    }

    #[test]
    fn fit_flat_smile() {
        let strikes = [0.04, 0.05, 0.06];
        let vols = [0.01; 3];
        let fit = SabrInterpolation::calibrate(
            &strikes,
            &vols,
            1.0,
            0.05,
            SabrParameters::new(0.02, 0.36, 0.4, 0.2),
            &LevenbergMarquardt::default(),
            &tight(),
        )
        .unwrap();
        assert!(fit.rms_error() < 1e-6, "rms {}", fit.rms_error());
        assert_abs_diff_eq!(fit.operator(0.05), 0.01, epsilon = 1e-6);
    }

    #[test]
    fn fit_with_simplex() {
        let strikes = [0.03, 0.04, 0.05, 0.06, 0.07];
        let vols = [0.25, 0.22, 0.2, 0.19, 0.185];
        let fit = SabrInterpolation::calibrate(
            &strikes,
            &vols,
            1.0,
            0.05,
            SabrParameters::new(0.05, 0.5, 0.4, 0.0),
            &Simplex::new(0.1),
            &EndCriteria::new(5000, 500, 1e-14, 1e-14, 1e-14),
        )
        .unwrap();
        assert!(fit.rms_error() < 1e-2);
        assert!(fit.iterations() > 0);
    }

    #[test]
    fn rejects_bad_input() {
        let lm = LevenbergMarquardt::default();
        let guess = SabrParameters::new(0.02, 0.36, 0.4, 0.2);
        let ec = EndCriteria::default();
        assert!(matches!(
            SabrInterpolation::calibrate(&[0.04, 0.05], &[0.2], 1.0, 0.05, guess, &lm, &ec),
            Err(Error::DimensionMismatch(_))
        ));
        assert!(matches!(
            SabrInterpolation::calibrate(&[0.05, 0.04], &[0.2, 0.2], 1.0, 0.05, guess, &lm, &ec),
            Err(Error::NonMonotonicInput { .. })
        ));
        assert!(matches!(
            SabrInterpolation::calibrate(&[-0.01, 0.04], &[0.2, 0.2], 1.0, 0.05, guess, &lm, &ec),
            Err(Error::Precondition(_))
        ));
        let bad_guess = SabrParameters::new(0.02, 0.36, 0.4, 1.5);
        assert!(matches!(
            SabrInterpolation::calibrate(&[0.04, 0.05], &[0.2, 0.2], 1.0, 0.05, bad_guess, &lm, &ec),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn direct_smile_clamps_extrapolated_parameters() {
        let smile = SabrInterpolation::with_parameters(
            &[0.01, 0.06, 0.11],
            2.0,
            0.05,
            SabrParameters::new(0.03, 1.2, -0.1, 1.3),
        );
        assert_eq!(smile.beta(), 1.0);
        assert_eq!(smile.nu(), 0.0);
        assert!(smile.rho() < 1.0);
        assert!(smile.end_type().is_none());
        assert!(smile.operator(0.05).is_finite());
        assert!(smile.operator(-0.02).is_finite());
    }
}

//! Per-node SABR calibration of a market volatility cube.
//!
//! A market cube has one layer per strike spread, holding absolute
//! volatilities. Calibration fits a SABR smile at every node and returns a
//! parameter cube with the five layers named by [`ALPHA`], [`BETA`], [`NU`],
//! [`RHO`] and [`FORWARD`].

use volcube_core::{errors::Result, Error, Real, Spread};
use volcube_math::interpolations::SabrParameters;
use volcube_math::optimization::{
    ConjugateGradient, EndCriteria, LevenbergMarquardt, OptimizationMethod, Simplex,
};
use volcube_math::Matrix;

use crate::cube::Cube;
use crate::smile_section::{SabrSmileInput, SabrSmileSection};
use crate::swap_rate::AtmStrikeProvider;

/// Alpha layer of a parameter cube.
pub const ALPHA: usize = 0;
/// Beta layer of a parameter cube.
pub const BETA: usize = 1;
/// Nu layer of a parameter cube.
pub const NU: usize = 2;
/// Rho layer of a parameter cube.
pub const RHO: usize = 3;
/// ATM forward layer of a parameter cube.
pub const FORWARD: usize = 4;
/// Number of layers in a parameter cube.
pub const PARAMETER_LAYERS: usize = 5;

/// Starting point of every SABR fit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SabrInitialGuess {
    /// Alpha.
    pub alpha: Real,
    /// Beta.
    pub beta: Real,
    /// Nu.
    pub nu: Real,
    /// Rho.
    pub rho: Real,
}

impl Default for SabrInitialGuess {
    fn default() -> Self {
        Self {
            alpha: 0.02,
            beta: 0.36,
            nu: 0.4,
            rho: 0.2,
        }
    }
}

/// Optimizer used for SABR fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationMethod {
    /// Levenberg–Marquardt on the residual vector.
    #[default]
    LevenbergMarquardt,
    /// Conjugate gradient with an Armijo line search.
    ConjugateGradient,
    /// Nelder–Mead simplex.
    Simplex,
}

impl CalibrationMethod {
    /// Instantiate the optimizer with its default settings.
    pub fn build(&self) -> Box<dyn OptimizationMethod> {
        match self {
            Self::LevenbergMarquardt => Box::new(LevenbergMarquardt::default()),
            Self::ConjugateGradient => Box::new(ConjugateGradient::default()),
            Self::Simplex => Box::new(Simplex::default()),
        }
    }
}

/// Settings of a SABR calibration, passed explicitly to every fit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SabrCalibrationConfig {
    /// Starting parameters.
    pub initial_guess: SabrInitialGuess,
    /// Upper bound on the starting beta.
    pub beta_start_cap: Real,
    /// A fit whose RMS error is not below this fails.
    pub accuracy_tolerance: Real,
    /// Optimizer iteration limit.
    pub max_iterations: usize,
    /// Optimizer limit on consecutive non-improving iterations.
    pub max_stationary_iterations: usize,
    /// Cost and improvement threshold of the optimizer.
    pub function_epsilon: Real,
    /// Optimizer.
    pub method: CalibrationMethod,
}

impl Default for SabrCalibrationConfig {
    fn default() -> Self {
        Self {
            initial_guess: SabrInitialGuess::default(),
            beta_start_cap: 0.7,
            accuracy_tolerance: 1e-4,
            max_iterations: 2000,
            max_stationary_iterations: 100,
            function_epsilon: 1e-16,
            method: CalibrationMethod::default(),
        }
    }
}

impl SabrCalibrationConfig {
    /// The initial guess with beta capped at `beta_start_cap`.
    pub fn initial_parameters(&self) -> SabrParameters {
        let g = &self.initial_guess;
        SabrParameters::new(g.alpha, g.beta.min(self.beta_start_cap), g.nu, g.rho)
    }

    /// Optimizer end criteria.
    pub fn end_criteria(&self) -> EndCriteria {
        EndCriteria::new(
            self.max_iterations,
            self.max_stationary_iterations,
            self.function_epsilon,
            self.function_epsilon,
            self.function_epsilon,
        )
    }
}

/// Fit a SABR smile at every node of `market` and collect the parameters.
///
/// Strikes at a node are its ATM forward plus each of `strike_spreads`;
/// layer `i` of `market` holds the volatility quoted at spread `i`. The
/// first node that misses the accuracy tolerance aborts the whole
/// calibration.
pub fn calibrate_cube(
    market: &Cube,
    strike_spreads: &[Spread],
    atm: &dyn AtmStrikeProvider,
    config: &SabrCalibrationConfig,
) -> Result<Cube> {
    if market.n_layers() != strike_spreads.len() {
        return Err(Error::DimensionMismatch(format!(
            "market cube has {} layers for {} strike spreads",
            market.n_layers(),
            strike_spreads.len()
        )));
    }
    let expiries = market.expiries();
    let lengths = market.lengths();
    let mut layers = vec![Matrix::zeros(expiries.len(), lengths.len()); PARAMETER_LAYERS];

    for (j, &option_time) in expiries.iter().enumerate() {
        for (k, &swap_length) in lengths.iter().enumerate() {
            let forward = atm.atm_strike(option_time, swap_length)?;
            let strikes = strike_spreads.iter().map(|s| forward + s).collect();
            let volatilities = market.points().iter().map(|m| m[(j, k)]).collect();
            let smile = SabrSmileSection::new(
                option_time,
                swap_length,
                SabrSmileInput::Samples {
                    forward,
                    strikes,
                    volatilities,
                },
                config,
            )?;
            let p = smile.params();
            tracing::debug!(
                option_time,
                swap_length,
                rms_error = smile.interpolation().rms_error(),
                iterations = smile.interpolation().iterations(),
                "calibrated SABR node"
            );
            for (layer, value) in [
                (ALPHA, p.alpha),
                (BETA, p.beta),
                (NU, p.nu),
                (RHO, p.rho),
                (FORWARD, forward),
            ] {
                layers[layer][(j, k)] = value;
            }
        }
    }

    let mut parameters = Cube::new(expiries.to_vec(), lengths.to_vec(), PARAMETER_LAYERS)?;
    parameters.set_points(layers)?;
    parameters.update_interpolators()?;
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_forward::FlatForward;
    use crate::swap_rate::{SwapConventions, SwapRateCalculator};
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn provider() -> SwapRateCalculator {
        SwapRateCalculator::new(Arc::new(FlatForward::continuous(0.04)), SwapConventions::default())
    }

    #[test]
    fn defaults_reproduce_reference_constants() {
        let config = SabrCalibrationConfig::default();
        let p = config.initial_parameters();
        assert_eq!((p.alpha, p.beta, p.nu, p.rho), (0.02, 0.36, 0.4, 0.2));
        assert_eq!(config.accuracy_tolerance, 1e-4);
        assert_eq!(config.beta_start_cap, 0.7);
        assert_eq!(config.method, CalibrationMethod::LevenbergMarquardt);
    }

    #[test]
    fn beta_start_is_capped() {
        let config = SabrCalibrationConfig {
            initial_guess: SabrInitialGuess {
                beta: 0.95,
                ..SabrInitialGuess::default()
            },
            ..SabrCalibrationConfig::default()
        };
        assert_eq!(config.initial_parameters().beta, 0.7);
    }

    #[test]
    fn end_criteria_follow_config() {
        let ec = SabrCalibrationConfig::default().end_criteria();
        assert_eq!(ec.max_iterations, 2000);
        assert_eq!(ec.max_stationary_state_iterations, 100);
        assert_eq!(ec.root_epsilon, 1e-16);
    }

    #[test]
    fn flat_market_calibrates_to_flat_smiles() {
        let spreads = [-0.01, 0.0, 0.01];
        let mut market = Cube::new(vec![1.0, 5.0], vec![2.0, 10.0], spreads.len()).unwrap();
        for i in 0..spreads.len() {
            market.set_layer(i, Matrix::from_element(2, 2, 0.2)).unwrap();
        }
        market.update_interpolators().unwrap();

        let atm = provider();
        let params = calibrate_cube(&market, &spreads, &atm, &SabrCalibrationConfig::default()).unwrap();
        assert_eq!(params.n_layers(), PARAMETER_LAYERS);
        assert_eq!(params.expiries(), market.expiries());
        for (j, &t) in params.expiries().iter().enumerate() {
            for (k, &l) in params.lengths().iter().enumerate() {
                let forward = params.points()[FORWARD][(j, k)];
                assert_abs_diff_eq!(forward, atm.atm_strike(t, l).unwrap(), epsilon = 1e-15);
                let p = SabrParameters::new(
                    params.points()[ALPHA][(j, k)],
                    params.points()[BETA][(j, k)],
                    params.points()[NU][(j, k)],
                    params.points()[RHO][(j, k)],
                );
                let vol = volcube_math::interpolations::sabr_volatility(forward, forward, t, &p);
                assert_abs_diff_eq!(vol, 0.2, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn layer_count_must_match_spreads() {
        let market = Cube::new(vec![1.0, 5.0], vec![2.0, 10.0], 2).unwrap();
        assert!(matches!(
            calibrate_cube(&market, &[-0.01, 0.0, 0.01], &provider(), &SabrCalibrationConfig::default()),
            Err(Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn inconsistent_node_fails_the_whole_calibration() {
        let spreads = [-0.02, -0.01, 0.0, 0.01, 0.02];
        let mut market = Cube::new(vec![1.0, 5.0], vec![2.0, 10.0], spreads.len()).unwrap();
        for i in 0..spreads.len() {
            market.set_layer(i, Matrix::from_element(2, 2, 0.2)).unwrap();
        }
        for (i, v) in [0.3, 0.1, 0.3, 0.1, 0.3].into_iter().enumerate() {
            market.set_element(i, 1, 1, v).unwrap();
        }
        let result = calibrate_cube(&market, &spreads, &provider(), &SabrCalibrationConfig::default());
        assert!(matches!(
            result,
            Err(Error::CalibrationAccuracy { option_time, swap_length, .. })
                if option_time == 5.0 && swap_length == 10.0
        ));
    }
}

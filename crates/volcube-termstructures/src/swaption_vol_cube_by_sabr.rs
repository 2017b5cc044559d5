//! The SABR volatility cube.
//!
//! Construction runs four stages:
//!
//! 1. market cube: ATM volatility plus quoted spread, one layer per strike;
//! 2. sparse calibration: a SABR fit at every quoted node;
//! 3. dense expansion: nodes of the ATM grid missing from the quotes are
//!    synthesised from the neighbouring sparse smiles;
//! 4. dense calibration: a SABR fit at every node of the expanded cube.
//!
//! Queries interpolate the dense parameters and evaluate the SABR formula.
//! The cube is immutable once built.

use std::sync::Arc;

use volcube_core::{errors::Result, Rate, Spread, Time, Volatility};
use volcube_math::Matrix;
use volcube_time::TimeConvention;

use crate::cube::Cube;
use crate::dense_expansion::{expand_volatility_cube, parameter_smile};
use crate::sabr_calibration::{calibrate_cube, SabrCalibrationConfig};
use crate::smile_section::{SabrSmileSection, SmileSection};
use crate::swap_rate::AtmStrikeProvider;
use crate::swaption_vol_cube::VolCubeQuotes;
use crate::swaption_volatility_structure::SwaptionVolatilityStructure;

/// Swaption volatility cube with a SABR smile at every node.
#[derive(Debug, Clone)]
pub struct SwaptionVolatilityCubeBySabr {
    atm_structure: Arc<dyn SwaptionVolatilityStructure>,
    atm: Arc<dyn AtmStrikeProvider>,
    option_times: Vec<Time>,
    swap_lengths: Vec<Time>,
    strike_spreads: Vec<Spread>,
    vol_spreads: Matrix,
    config: SabrCalibrationConfig,
    market_cube: Cube,
    sparse_parameters: Cube,
    dense_cube: Cube,
    dense_parameters: Cube,
}

impl SwaptionVolatilityCubeBySabr {
    /// Build and calibrate the cube.
    ///
    /// Fails on malformed quotes, on ATM nodes outside the quoted grid, and
    /// with [`volcube_core::Error::CalibrationAccuracy`] if any node's fit
    /// misses `config.accuracy_tolerance`.
    pub fn new(
        atm_structure: Arc<dyn SwaptionVolatilityStructure>,
        quotes: VolCubeQuotes,
        convention: &dyn TimeConvention,
        atm: Arc<dyn AtmStrikeProvider>,
        config: SabrCalibrationConfig,
    ) -> Result<Self> {
        let grid = quotes.resolve(convention)?;
        let n_strikes = grid.strike_spreads.len();
        tracing::info!(
            n_option_times = grid.option_times.len(),
            n_swap_lengths = grid.swap_lengths.len(),
            n_strikes,
            "building SABR swaption volatility cube"
        );

        let mut market_cube = Cube::new(grid.option_times.clone(), grid.swap_lengths.clone(), n_strikes)?;
        let n_lengths = grid.swap_lengths.len();
        for (j, &option_time) in grid.option_times.iter().enumerate() {
            for (k, &swap_length) in grid.swap_lengths.iter().enumerate() {
                let forward = atm.atm_strike(option_time, swap_length)?;
                let atm_vol = atm_structure.volatility(option_time, swap_length, forward)?;
                for i in 0..n_strikes {
                    let vol = atm_vol + grid.vol_spreads[(j * n_lengths + k, i)];
                    market_cube.set_element(i, j, k, vol)?;
                }
            }
        }
        market_cube.update_interpolators()?;

        let sparse_parameters =
            calibrate_cube(&market_cube, &grid.strike_spreads, atm.as_ref(), &config)?;
        let dense_cube = expand_volatility_cube(
            &market_cube,
            &sparse_parameters,
            &grid.strike_spreads,
            atm_structure.as_ref(),
            atm.as_ref(),
            &config,
        )?;
        let dense_parameters = calibrate_cube(&dense_cube, &grid.strike_spreads, atm.as_ref(), &config)?;

        tracing::info!(
            n_option_times = dense_parameters.expiries().len(),
            n_swap_lengths = dense_parameters.lengths().len(),
            "SABR swaption volatility cube built"
        );
        Ok(Self {
            atm_structure,
            atm,
            option_times: grid.option_times,
            swap_lengths: grid.swap_lengths,
            strike_spreads: grid.strike_spreads,
            vol_spreads: grid.vol_spreads,
            config,
            market_cube,
            sparse_parameters,
            dense_cube,
            dense_parameters,
        })
    }

    /// The SABR smile at `(option_time, swap_length)` from the dense
    /// parameters.
    pub fn smile_section(&self, option_time: Time, swap_length: Time) -> Result<SabrSmileSection> {
        self.smile_section_from(&self.dense_parameters, option_time, swap_length)
    }

    /// The SABR smile at `(option_time, swap_length)` from any parameter
    /// cube, e.g. [`Self::sparse_parameters`].
    pub fn smile_section_from(
        &self,
        parameters: &Cube,
        option_time: Time,
        swap_length: Time,
    ) -> Result<SabrSmileSection> {
        parameter_smile(parameters, option_time, swap_length, self.strike_spreads.len(), &self.config)
    }

    /// ATM forward of the underlying swap.
    pub fn atm_strike(&self, option_time: Time, swap_length: Time) -> Result<Rate> {
        self.atm.atm_strike(option_time, swap_length)
    }

    /// ATM structure the cube is built around.
    pub fn atm_structure(&self) -> &dyn SwaptionVolatilityStructure {
        self.atm_structure.as_ref()
    }

    /// Quoted option times.
    pub fn quoted_option_times(&self) -> &[Time] {
        &self.option_times
    }

    /// Quoted swap lengths.
    pub fn quoted_swap_lengths(&self) -> &[Time] {
        &self.swap_lengths
    }

    /// Strike offsets from ATM.
    pub fn strike_spreads(&self) -> &[Spread] {
        &self.strike_spreads
    }

    /// Quoted volatility spreads.
    pub fn vol_spreads(&self) -> &Matrix {
        &self.vol_spreads
    }

    /// Calibration settings.
    pub fn config(&self) -> &SabrCalibrationConfig {
        &self.config
    }

    /// Absolute volatilities on the quoted grid, one layer per strike.
    pub fn market_vol_cube(&self) -> &Cube {
        &self.market_cube
    }

    /// SABR parameters fitted on the quoted grid.
    pub fn sparse_parameters(&self) -> &Cube {
        &self.sparse_parameters
    }

    /// Absolute volatilities on the expanded grid.
    pub fn dense_vol_cube(&self) -> &Cube {
        &self.dense_cube
    }

    /// SABR parameters fitted on the expanded grid.
    pub fn dense_parameters(&self) -> &Cube {
        &self.dense_parameters
    }
}

impl SwaptionVolatilityStructure for SwaptionVolatilityCubeBySabr {
    fn volatility(&self, option_time: Time, swap_length: Time, strike: Rate) -> Result<Volatility> {
        Ok(self.smile_section(option_time, swap_length)?.volatility(strike))
    }

    /// Option times of the expanded grid.
    fn option_times(&self) -> &[Time] {
        self.dense_parameters.expiries()
    }

    /// Swap lengths of the expanded grid.
    fn swap_lengths(&self) -> &[Time] {
        self.dense_parameters.lengths()
    }
}

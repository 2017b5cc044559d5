//! Swaption volatility cube quoted as spreads over an ATM structure, and the
//! single-stage cube that interpolates those spreads directly.

use std::sync::Arc;

use volcube_core::{check_strictly_increasing, ensure, errors::Result, Error, Rate, Spread, Time, Volatility};
use volcube_math::interpolations::{BilinearInterpolation, Interpolation2D};
use volcube_math::Matrix;
use volcube_time::{Period, TimeConvention};

use crate::sabr_calibration::SabrCalibrationConfig;
use crate::smile_section::{InterpolatedSmileSection, SabrSmileInput, SabrSmileSection, SmileSection};
use crate::swap_rate::AtmStrikeProvider;
use crate::swaption_volatility_structure::{check_time_axis, SwaptionVolatilityStructure};

/// Market quotes of a volatility cube.
///
/// Row `j·n_swap_tenors + k` of `vol_spreads` holds the smile of option
/// tenor `j` and swap tenor `k`, one column per strike spread.
#[derive(Debug, Clone, PartialEq)]
pub struct VolCubeQuotes {
    /// Option expiries.
    pub option_tenors: Vec<Period>,
    /// Underlying swap tenors.
    pub swap_tenors: Vec<Period>,
    /// Strike offsets from the ATM forward, strictly increasing.
    pub strike_spreads: Vec<Spread>,
    /// Volatility spreads over ATM.
    pub vol_spreads: Matrix,
}

/// Quotes checked and converted to times.
#[derive(Debug, Clone)]
pub(crate) struct QuoteGrid {
    pub option_times: Vec<Time>,
    pub swap_lengths: Vec<Time>,
    pub strike_spreads: Vec<Spread>,
    pub vol_spreads: Matrix,
}

impl VolCubeQuotes {
    pub(crate) fn resolve(self, convention: &dyn TimeConvention) -> Result<QuoteGrid> {
        let option_times: Vec<Time> =
            self.option_tenors.iter().map(|p| convention.option_time(p)).collect();
        let swap_lengths: Vec<Time> =
            self.swap_tenors.iter().map(|p| convention.swap_length(p)).collect();
        check_time_axis(&option_times, "option time")?;
        check_time_axis(&swap_lengths, "swap length")?;

        let n_strikes = self.strike_spreads.len();
        ensure!(n_strikes > 1, "too few strike spreads ({n_strikes})");
        check_strictly_increasing(&self.strike_spreads, "strike spreads")?;

        let expected = (option_times.len() * swap_lengths.len(), n_strikes);
        if self.vol_spreads.shape() != expected {
            return Err(Error::DimensionMismatch(format!(
                "vol spreads are {:?}, expected {expected:?} (option x swap tenors, strikes)",
                self.vol_spreads.shape()
            )));
        }
        Ok(QuoteGrid {
            option_times,
            swap_lengths,
            strike_spreads: self.strike_spreads,
            vol_spreads: self.vol_spreads,
        })
    }
}

impl QuoteGrid {
    /// The quoted spreads of strike `i` as an (option × swap) matrix.
    pub fn spread_layer(&self, i: usize) -> Matrix {
        let n_lengths = self.swap_lengths.len();
        let mut layer = Matrix::zeros(self.option_times.len(), n_lengths);
        for j in 0..self.option_times.len() {
            for k in 0..n_lengths {
                layer[(j, k)] = self.vol_spreads[(j * n_lengths + k, i)];
            }
        }
        layer
    }
}

/// Single-stage cube: volatility spreads interpolated bilinearly per strike,
/// a linear smile in strike at query time.
#[derive(Debug, Clone)]
pub struct SwaptionVolatilityCube {
    atm_structure: Arc<dyn SwaptionVolatilityStructure>,
    atm: Arc<dyn AtmStrikeProvider>,
    option_times: Vec<Time>,
    swap_lengths: Vec<Time>,
    strike_spreads: Vec<Spread>,
    spread_interpolators: Vec<BilinearInterpolation>,
    config: SabrCalibrationConfig,
}

impl SwaptionVolatilityCube {
    /// Build the cube from its quotes.
    ///
    /// `config` only drives [`Self::smile_section`].
    pub fn new(
        atm_structure: Arc<dyn SwaptionVolatilityStructure>,
        quotes: VolCubeQuotes,
        convention: &dyn TimeConvention,
        atm: Arc<dyn AtmStrikeProvider>,
        config: SabrCalibrationConfig,
    ) -> Result<Self> {
        let grid = quotes.resolve(convention)?;
        let spread_interpolators = (0..grid.strike_spreads.len())
            .map(|i| {
                BilinearInterpolation::from_matrix(
                    &grid.swap_lengths,
                    &grid.option_times,
                    &grid.spread_layer(i),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            atm_structure,
            atm,
            option_times: grid.option_times,
            swap_lengths: grid.swap_lengths,
            strike_spreads: grid.strike_spreads,
            spread_interpolators,
            config,
        })
    }

    /// Strike offsets from ATM.
    pub fn strike_spreads(&self) -> &[Spread] {
        &self.strike_spreads
    }

    /// ATM forward of the underlying swap.
    pub fn atm_strike(&self, option_time: Time, swap_length: Time) -> Result<Rate> {
        self.atm.atm_strike(option_time, swap_length)
    }

    fn local_smile(&self, option_time: Time, swap_length: Time) -> Result<(Rate, Vec<Rate>, Vec<Volatility>)> {
        let forward = self.atm.atm_strike(option_time, swap_length)?;
        let atm_vol = self.atm_structure.volatility(option_time, swap_length, forward)?;
        let strikes = self.strike_spreads.iter().map(|s| forward + s).collect();
        let vols = self
            .spread_interpolators
            .iter()
            .map(|i| atm_vol + i.operator(swap_length, option_time))
            .collect();
        Ok((forward, strikes, vols))
    }

    /// The linear smile at `(option_time, swap_length)`.
    pub fn smile(&self, option_time: Time, swap_length: Time) -> Result<InterpolatedSmileSection> {
        let (forward, strikes, vols) = self.local_smile(option_time, swap_length)?;
        InterpolatedSmileSection::new(option_time, forward, strikes, &vols)
    }

    /// A SABR smile fitted to the interpolated quotes at
    /// `(option_time, swap_length)`.
    ///
    /// Fails with [`Error::CalibrationAccuracy`] if the fit is poor.
    pub fn smile_section(&self, option_time: Time, swap_length: Time) -> Result<SabrSmileSection> {
        let (forward, strikes, volatilities) = self.local_smile(option_time, swap_length)?;
        SabrSmileSection::new(
            option_time,
            swap_length,
            SabrSmileInput::Samples {
                forward,
                strikes,
                volatilities,
            },
            &self.config,
        )
    }
}

impl SwaptionVolatilityStructure for SwaptionVolatilityCube {
    fn volatility(&self, option_time: Time, swap_length: Time, strike: Rate) -> Result<Volatility> {
        Ok(self.smile(option_time, swap_length)?.volatility(strike))
    }

    fn option_times(&self) -> &[Time] {
        &self.option_times
    }

    fn swap_lengths(&self) -> &[Time] {
        &self.swap_lengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_forward::FlatForward;
    use crate::swap_rate::{SwapConventions, SwapRateCalculator};
    use crate::swaption_volatility_structure::SwaptionVolatilityMatrix;
    use approx::assert_abs_diff_eq;
    use volcube_time::YearFractionConvention;

    fn quotes() -> VolCubeQuotes {
        // two option tenors x two swap tenors, three strikes each
        let vol_spreads = Matrix::from_rows(&[
            vec![0.02, 0.0, -0.01],
            vec![0.03, 0.0, -0.02],
            vec![0.01, 0.0, -0.005],
            vec![0.02, 0.0, -0.01],
        ])
        .unwrap();
        VolCubeQuotes {
            option_tenors: vec![Period::years(1), Period::years(5)],
            swap_tenors: vec![Period::years(2), Period::years(10)],
            strike_spreads: vec![-0.01, 0.0, 0.01],
            vol_spreads,
        }
    }

    fn cube(quotes: VolCubeQuotes) -> Result<SwaptionVolatilityCube> {
        let atm = SwaptionVolatilityMatrix::new(
            vec![1.0, 5.0],
            vec![2.0, 10.0],
            Matrix::from_element(2, 2, 0.2),
        )?;
        let rates = SwapRateCalculator::new(Arc::new(FlatForward::continuous(0.04)), SwapConventions::default());
        SwaptionVolatilityCube::new(
            Arc::new(atm),
            quotes,
            &YearFractionConvention::default(),
            Arc::new(rates),
            SabrCalibrationConfig::default(),
        )
    }

    #[test]
    fn quoted_smile_is_reproduced() {
        let cube = cube(quotes()).unwrap();
        let f = cube.atm_strike(5.0, 2.0).unwrap();
        assert_abs_diff_eq!(cube.volatility(5.0, 2.0, f - 0.01).unwrap(), 0.21, epsilon = 1e-12);
        assert_abs_diff_eq!(cube.volatility(5.0, 2.0, f).unwrap(), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(cube.volatility(5.0, 2.0, f + 0.005).unwrap(), 0.1975, epsilon = 1e-12);
        // the first spread layer at the centre of the grid
        let g = cube.atm_strike(3.0, 6.0).unwrap();
        assert_abs_diff_eq!(cube.volatility(3.0, 6.0, g - 0.01).unwrap(), 0.22, epsilon = 1e-12);
    }

    #[test]
    fn sabr_section_fits_the_interpolated_quotes() {
        let cube = cube(quotes()).unwrap();
        let section = cube.smile_section(1.0, 2.0).unwrap();
        let f = section.atm_level();
        assert_abs_diff_eq!(section.volatility(f), 0.2, epsilon = 1e-4);
        assert_abs_diff_eq!(section.variance(f), 0.04, epsilon = 1e-4);
    }

    #[test]
    fn validation() {
        let mut q = quotes();
        q.strike_spreads = vec![0.01, 0.01, 0.02];
        assert!(matches!(cube(q), Err(Error::NonMonotonicInput { .. })));

        let mut q = quotes();
        q.option_tenors = vec![Period::years(0), Period::years(5)];
        assert!(matches!(cube(q), Err(Error::Precondition(_))));

        let mut q = quotes();
        q.vol_spreads = Matrix::zeros(3, 3);
        assert!(matches!(cube(q), Err(Error::DimensionMismatch(_))));

        let mut q = quotes();
        q.strike_spreads = vec![0.0];
        q.vol_spreads = Matrix::zeros(4, 1);
        assert!(matches!(cube(q), Err(Error::Precondition(_))));

        let mut q = quotes();
        q.swap_tenors = vec![Period::years(10), Period::years(2)];
        assert!(matches!(cube(q), Err(Error::NonMonotonicInput { .. })));
    }
}

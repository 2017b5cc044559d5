//! Swaption volatility structures and the ATM volatility matrix.

use volcube_core::{check_strictly_increasing, ensure, errors::Result, Error, Rate, Real, Time, Volatility};
use volcube_math::interpolations::{BilinearInterpolation, Interpolation2D};
use volcube_math::Matrix;
use volcube_time::{Period, TimeConvention};

/// Implied volatility as a function of option time, swap length and strike.
pub trait SwaptionVolatilityStructure: std::fmt::Debug + Send + Sync {
    /// Black volatility of the swaption.
    fn volatility(&self, option_time: Time, swap_length: Time, strike: Rate) -> Result<Volatility>;

    /// Option times of the structure's grid.
    fn option_times(&self) -> &[Time];

    /// Swap lengths of the structure's grid.
    fn swap_lengths(&self) -> &[Time];

    /// Total Black variance `σ²·t`.
    fn variance(&self, option_time: Time, swap_length: Time, strike: Rate) -> Result<Real> {
        let vol = self.volatility(option_time, swap_length, strike)?;
        Ok(vol * vol * option_time)
    }
}

/// Check a time axis: at least two points, the first positive, strictly
/// increasing.
pub(crate) fn check_time_axis(times: &[Time], what: &str) -> Result<()> {
    if times.len() < 2 {
        return Err(Error::InvalidGrid(format!(
            "{what}: at least 2 points required, got {}",
            times.len()
        )));
    }
    ensure!(times[0] > 0.0, "first {what} must be positive, got {}", times[0]);
    check_strictly_increasing(times, what)
}

/// ATM swaption volatilities on an (option time × swap length) grid.
///
/// Strike is ignored. Between and beyond the nodes the matrix is
/// interpolated bilinearly with linear extrapolation.
#[derive(Debug, Clone)]
pub struct SwaptionVolatilityMatrix {
    option_times: Vec<Time>,
    swap_lengths: Vec<Time>,
    volatilities: Matrix,
    interpolation: BilinearInterpolation,
}

impl SwaptionVolatilityMatrix {
    /// Build from a matrix whose rows follow `option_times` and columns
    /// follow `swap_lengths`.
    pub fn new(option_times: Vec<Time>, swap_lengths: Vec<Time>, volatilities: Matrix) -> Result<Self> {
        check_time_axis(&option_times, "option times")?;
        check_time_axis(&swap_lengths, "swap lengths")?;
        let interpolation =
            BilinearInterpolation::from_matrix(&swap_lengths, &option_times, &volatilities)?;
        Ok(Self {
            option_times,
            swap_lengths,
            volatilities,
            interpolation,
        })
    }

    /// Build from calendar tenors converted by `convention`.
    pub fn from_tenors(
        option_tenors: &[Period],
        swap_tenors: &[Period],
        volatilities: Matrix,
        convention: &dyn TimeConvention,
    ) -> Result<Self> {
        let option_times = option_tenors.iter().map(|p| convention.option_time(p)).collect();
        let swap_lengths = swap_tenors.iter().map(|p| convention.swap_length(p)).collect();
        Self::new(option_times, swap_lengths, volatilities)
    }

    /// The quoted volatilities.
    pub fn volatilities(&self) -> &Matrix {
        &self.volatilities
    }
}

impl SwaptionVolatilityStructure for SwaptionVolatilityMatrix {
    fn volatility(&self, option_time: Time, swap_length: Time, _strike: Rate) -> Result<Volatility> {
        Ok(self.interpolation.operator(swap_length, option_time))
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
    use approx::assert_abs_diff_eq;
    use volcube_time::YearFractionConvention;

    fn matrix() -> SwaptionVolatilityMatrix {
        let vols = Matrix::from_rows(&[vec![0.20, 0.18], vec![0.16, 0.14]]).unwrap();
        SwaptionVolatilityMatrix::new(vec![1.0, 5.0], vec![2.0, 10.0], vols).unwrap()
    }

    #[test]
    fn quoted_nodes_are_returned() {
        let m = matrix();
        assert_eq!(m.volatility(1.0, 2.0, 0.03).unwrap(), 0.20);
        assert_eq!(m.volatility(1.0, 10.0, 0.03).unwrap(), 0.18);
        assert_eq!(m.volatility(5.0, 2.0, 0.03).unwrap(), 0.16);
        assert_eq!(m.volatility(5.0, 10.0, 0.03).unwrap(), 0.14);
    }

    #[test]
    fn interpolates_and_extrapolates() {
        let m = matrix();
        assert_abs_diff_eq!(m.volatility(3.0, 6.0, 0.0).unwrap(), 0.17, epsilon = 1e-12);
        assert_abs_diff_eq!(m.volatility(9.0, 2.0, 0.0).unwrap(), 0.12, epsilon = 1e-12);
        assert_abs_diff_eq!(m.variance(3.0, 6.0, 0.0).unwrap(), 0.17 * 0.17 * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn from_tenors_uses_convention() {
        let vols = Matrix::from_element(2, 2, 0.2);
        let m = SwaptionVolatilityMatrix::from_tenors(
            &[Period::months(6), Period::years(1)],
            &[Period::years(1), Period::years(2)],
            vols,
            &YearFractionConvention::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(m.option_times()[0], 0.5);
        assert_eq!(m.swap_lengths(), &[1.0, 2.0]);
    }

    #[test]
    fn validates_axes_and_shape() {
        let vols = Matrix::from_element(2, 2, 0.2);
        assert!(matches!(
            SwaptionVolatilityMatrix::new(vec![1.0], vec![2.0, 10.0], Matrix::from_element(1, 2, 0.2)),
            Err(Error::InvalidGrid(_))
        ));
        assert!(matches!(
            SwaptionVolatilityMatrix::new(vec![0.0, 1.0], vec![2.0, 10.0], vols.clone()),
            Err(Error::Precondition(_))
        ));
        assert!(matches!(
            SwaptionVolatilityMatrix::new(vec![2.0, 1.0], vec![2.0, 10.0], vols.clone()),
            Err(Error::NonMonotonicInput { .. })
        ));
        assert!(matches!(
            SwaptionVolatilityMatrix::new(vec![1.0, 2.0, 3.0], vec![2.0, 10.0], vols),
            Err(Error::DimensionMismatch(_))
        ));
    }
}

//! 1D interpolation trait and the linear scheme, plus the 2D bilinear and
//! SABR interpolations in submodules.
//!
//! Every scheme here extrapolates linearly outside its nodes: the bracketing
//! interval is clamped to the first or last one and the local formula is
//! evaluated as is.

use volcube_core::{check_strictly_increasing, errors::Result, Real};

/// Bilinear 2D interpolation.
pub mod bilinear;

/// SABR smile interpolation and calibration.
pub mod sabr;

pub use bilinear::{BilinearInterpolation, Interpolation2D};
pub use sabr::{sabr_volatility, SabrInterpolation, SabrParameters};

/// A 1D interpolation function `f: R → R` defined by a set of known points.
pub trait Interpolation1D: std::fmt::Debug {
    /// Evaluate the interpolation at `x`.
    fn operator(&self, x: Real) -> Real;

    /// Return the lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Return the upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

/// Binary search: find `k` such that `vs[k] <= v < vs[k+1]`, clamped to
/// `[0, n-2]`.
pub(crate) fn locate(vs: &[Real], v: Real) -> usize {
    let n = vs.len();
    if v <= vs[0] {
        return 0;
    }
    if v >= vs[n - 1] {
        return n - 2;
    }
    // first index with vs[i] > v, minus one
    vs.partition_point(|&x| x <= v) - 1
}

// ── Linear ────────────────────────────────────────────────────────────────────

/// Linear interpolation with linear extrapolation.
///
/// `f(x) = y[i] + (y[i+1] - y[i]) * (x - x[i]) / (x[i+1] - x[i])`
#[derive(Debug, Clone)]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl LinearInterpolation {
    /// Construct a linear interpolation from strictly increasing `xs` and
    /// corresponding `ys`.
    ///
    /// # Errors
    /// Returns an error if the slices have different lengths, fewer than 2
    /// points, or `xs` is not strictly increasing.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        volcube_core::ensure!(xs.len() >= 2, "need at least 2 points for interpolation");
        volcube_core::ensure!(
            xs.len() == ys.len(),
            "xs ({}) and ys ({}) must have the same length",
            xs.len(),
            ys.len()
        );
        check_strictly_increasing(xs, "interpolation abscissae")?;
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }
}

impl Interpolation1D for LinearInterpolation {
    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn operator(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = self.xs[i + 1] - self.xs[i];
        self.ys[i] + (x - self.xs[i]) * (self.ys[i + 1] - self.ys[i]) / dx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_brackets_and_clamps() {
        let xs = [0.0, 1.0, 2.0, 5.0];
        assert_eq!(locate(&xs, -1.0), 0);
        assert_eq!(locate(&xs, 0.0), 0);
        assert_eq!(locate(&xs, 1.0), 1);
        assert_eq!(locate(&xs, 1.5), 1);
        assert_eq!(locate(&xs, 4.9), 2);
        assert_eq!(locate(&xs, 5.0), 2);
        assert_eq!(locate(&xs, 9.0), 2);
    }

    #[test]
    fn linear_interpolation_and_extrapolation() {
        let interp = LinearInterpolation::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert!((interp.operator(0.5) - 0.5).abs() < 1e-12);
        assert!((interp.operator(1.5) - 2.5).abs() < 1e-12);
        // slopes of the outer intervals carry on beyond the nodes
        assert!((interp.operator(-1.0) + 1.0).abs() < 1e-12);
        assert!((interp.operator(3.0) - 7.0).abs() < 1e-12);
        assert!(!interp.is_in_range(3.0));
    }

    #[test]
    fn linear_interpolation_rejects_unsorted_nodes() {
        assert!(LinearInterpolation::new(&[0.0, 0.0], &[1.0, 2.0]).is_err());
        assert!(LinearInterpolation::new(&[0.0], &[1.0]).is_err());
        assert!(LinearInterpolation::new(&[0.0, 1.0], &[1.0]).is_err());
    }
}

//! Bilinear 2D interpolation between discrete grid points.
//!
//! Standard bilinear interpolation on a rectangular grid `(xs × ys → z)`,
//! extended linearly beyond the outermost nodes.

use crate::interpolations::locate;
use crate::matrix::Matrix;
use volcube_core::{check_strictly_increasing, errors::Result, Error, Real};

/// 2D interpolation trait.
pub trait Interpolation2D: std::fmt::Debug + Send + Sync {
    /// Evaluate the surface at `(x, y)`.
    fn operator(&self, x: Real, y: Real) -> Real;
    /// Lower bound of the x domain.
    fn x_min(&self) -> Real;
    /// Upper bound of the x domain.
    fn x_max(&self) -> Real;
    /// Lower bound of the y domain.
    fn y_min(&self) -> Real;
    /// Upper bound of the y domain.
    fn y_max(&self) -> Real;
}

/// Bilinear interpolation on a rectangular grid.
///
/// `z` is stored in row-major order: `z[j * nx + i]` = f(xs\[i\], ys\[j\]),
/// i.e. rows follow `ys` and columns follow `xs`.
#[derive(Debug, Clone)]
pub struct BilinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
    z: Vec<Real>,
    nx: usize,
}

impl BilinearInterpolation {
    /// Build a bilinear interpolation on the grid `(xs × ys → z)`.
    ///
    /// Both `xs` and `ys` must be strictly increasing with at least two
    /// points each.
    pub fn new(xs: &[Real], ys: &[Real], z: &[Real]) -> Result<Self> {
        let nx = xs.len();
        let ny = ys.len();
        volcube_core::ensure!(nx >= 2, "need at least 2 x points");
        volcube_core::ensure!(ny >= 2, "need at least 2 y points");
        check_strictly_increasing(xs, "x nodes")?;
        check_strictly_increasing(ys, "y nodes")?;
        if z.len() != nx * ny {
            return Err(Error::DimensionMismatch(format!(
                "z length ({}) must equal nx*ny ({nx}*{ny})",
                z.len()
            )));
        }
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            z: z.to_vec(),
            nx,
        })
    }

    /// Build from a matrix whose rows follow `ys` and columns follow `xs`.
    pub fn from_matrix(xs: &[Real], ys: &[Real], z: &Matrix) -> Result<Self> {
        if z.shape() != (ys.len(), xs.len()) {
            return Err(Error::DimensionMismatch(format!(
                "matrix is {}x{}, grid is {}x{}",
                z.rows(),
                z.cols(),
                ys.len(),
                xs.len()
            )));
        }
        Self::new(xs, ys, &z.to_row_major())
    }

    fn z_at(&self, i: usize, j: usize) -> Real {
        self.z[j * self.nx + i]
    }
}

impl Interpolation2D for BilinearInterpolation {
    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn y_min(&self) -> Real {
        self.ys[0]
    }

    fn y_max(&self) -> Real {
        self.ys[self.ys.len() - 1]
    }

    fn operator(&self, x: Real, y: Real) -> Real {
        let i = locate(&self.xs, x);
        let j = locate(&self.ys, y);

        let z1 = self.z_at(i, j);
        let z2 = self.z_at(i + 1, j);
        let z3 = self.z_at(i, j + 1);
        let z4 = self.z_at(i + 1, j + 1);

        // outside the grid t or u leave [0, 1]
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        let u = (y - self.ys[j]) / (self.ys[j + 1] - self.ys[j]);

        (1.0 - t) * (1.0 - u) * z1 + t * (1.0 - u) * z2 + (1.0 - t) * u * z3 + t * u * z4
    }
}

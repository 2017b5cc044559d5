//! `Matrix` — a two-dimensional matrix of reals.
//!
//! A thin newtype around `nalgebra::DMatrix<f64>`. Besides indexing it
//! provides the growth primitives used by the volatility cube layers:
//! [`Matrix::insert_row`] and [`Matrix::insert_column`] insert a zero row or
//! column at a given index, shifting every later row or column by one.

use nalgebra::DMatrix;
use std::ops::{Index, IndexMut};
use volcube_core::{Error, Real, Result};

/// A dynamically-sized 2D matrix of `Real` values (row-major access).
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix(DMatrix<Real>);

impl Matrix {
    /// Create a zero-filled `rows × cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self(DMatrix::zeros(rows, cols))
    }

    /// Create a matrix filled with `value`.
    pub fn from_element(rows: usize, cols: usize, value: Real) -> Self {
        Self(DMatrix::from_element(rows, cols, value))
    }

    /// Create from a row-major data slice.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[Real]) -> Self {
        Self(DMatrix::from_row_slice(rows, cols, data))
    }

    /// Create from a vector of equally long rows.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if the rows are ragged.
    pub fn from_rows(rows: &[Vec<Real>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(Error::DimensionMismatch(format!(
                "row {i} has {} columns, expected {cols}",
                row.len()
            )));
        }
        Ok(Self(DMatrix::from_fn(rows.len(), cols, |i, j| rows[i][j])))
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.0.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.0.ncols()
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.0.shape()
    }

    /// Element `(i, j)`, or `None` when out of bounds.
    pub fn get(&self, i: usize, j: usize) -> Option<Real> {
        self.0.get((i, j)).copied()
    }

    /// Borrow the inner `DMatrix`.
    pub fn inner(&self) -> &DMatrix<Real> {
        &self.0
    }

    /// Extract a row.
    pub fn row(&self, i: usize) -> Vec<Real> {
        self.0.row(i).iter().copied().collect()
    }

    /// All elements in row-major order.
    pub fn to_row_major(&self) -> Vec<Real> {
        let (rows, cols) = self.shape();
        let mut out = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                out.push(self.0[(i, j)]);
            }
        }
        out
    }

    /// Insert a zero row before row `index`.
    ///
    /// Rows `index..` move to `index + 1..`; `index == rows()` appends.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if `index > rows()`.
    pub fn insert_row(&mut self, index: usize) -> Result<()> {
        let (rows, cols) = self.shape();
        if index > rows {
            return Err(Error::IndexOutOfRange {
                index,
                size: rows + 1,
            });
        }
        let old = &self.0;
        let grown = DMatrix::from_fn(rows + 1, cols, |i, j| match i.cmp(&index) {
            std::cmp::Ordering::Less => old[(i, j)],
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Greater => old[(i - 1, j)],
        });
        self.0 = grown;
        Ok(())
    }

    /// Insert a zero column before column `index`.
    ///
    /// Columns `index..` move to `index + 1..`; `index == cols()` appends.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] if `index > cols()`.
    pub fn insert_column(&mut self, index: usize) -> Result<()> {
        let (rows, cols) = self.shape();
        if index > cols {
            return Err(Error::IndexOutOfRange {
                index,
                size: cols + 1,
            });
        }
        let old = &self.0;
        let grown = DMatrix::from_fn(rows, cols + 1, |i, j| match j.cmp(&index) {
            std::cmp::Ordering::Less => old[(i, j)],
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Greater => old[(i, j - 1)],
        });
        self.0 = grown;
        Ok(())
    }
}

impl From<DMatrix<Real>> for Matrix {
    fn from(m: DMatrix<Real>) -> Self {
        Self(m)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Real;
    fn index(&self, (i, j): (usize, usize)) -> &Real {
        &self.0[(i, j)]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Real {
        &mut self.0[(i, j)]
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.0.nrows() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for j in 0..self.0.ncols() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.0[(i, j)])?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

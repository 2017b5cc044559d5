//! `Cube` — a multi-layer grid over (expiry × length).
//!
//! Every layer is a [`Matrix`] whose rows follow the expiries and whose
//! columns follow the lengths. Nodes can be added out of order with
//! [`Cube::set_point`]; all layers grow together and existing values shift
//! with their coordinates.
//!
//! Each layer has a bilinear interpolator. The interpolators are derived
//! state: mutations mark them stale and [`Cube::update_interpolators`]
//! rebuilds them. Reads on a stale cube interpolate the current layers
//! directly without touching the cached ones.

use volcube_core::{check_strictly_increasing, errors::Result, Error, Real, Time};
use volcube_math::interpolations::{BilinearInterpolation, Interpolation2D};
use volcube_math::Matrix;

/// A stack of equally shaped matrices over shared expiry and length axes.
#[derive(Debug, Clone)]
pub struct Cube {
    expiries: Vec<Time>,
    lengths: Vec<Time>,
    layers: Vec<Matrix>,
    interpolators: Vec<BilinearInterpolation>,
    stale: bool,
}

/// Position of `value` in the sorted `axis`, and whether it is already there.
fn search(axis: &[Time], value: Time) -> (usize, bool) {
    let index = axis.partition_point(|&v| v < value);
    (index, index < axis.len() && axis[index] == value)
}

impl Cube {
    /// A zero-filled cube with `n_layers` layers.
    ///
    /// Both axes need at least two strictly increasing points.
    pub fn new(expiries: Vec<Time>, lengths: Vec<Time>, n_layers: usize) -> Result<Self> {
        if expiries.len() < 2 || lengths.len() < 2 {
            return Err(Error::InvalidGrid(format!(
                "cube needs at least 2 expiries and 2 lengths, got {} and {}",
                expiries.len(),
                lengths.len()
            )));
        }
        check_strictly_increasing(&expiries, "cube expiries")?;
        check_strictly_increasing(&lengths, "cube lengths")?;
        let layers = vec![Matrix::zeros(expiries.len(), lengths.len()); n_layers];
        let mut cube = Self {
            expiries,
            lengths,
            layers,
            interpolators: Vec::new(),
            stale: true,
        };
        cube.update_interpolators()?;
        Ok(cube)
    }

    /// Expiry axis.
    pub fn expiries(&self) -> &[Time] {
        &self.expiries
    }

    /// Length axis.
    pub fn lengths(&self) -> &[Time] {
        &self.lengths
    }

    /// All layers.
    pub fn points(&self) -> &[Matrix] {
        &self.layers
    }

    /// One layer, if it exists.
    pub fn layer(&self, index: usize) -> Option<&Matrix> {
        self.layers.get(index)
    }

    /// Number of layers.
    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    /// `true` when the cached interpolators lag behind the layers.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    fn check_layer(&self, layer: usize) -> Result<()> {
        if layer >= self.layers.len() {
            return Err(Error::IndexOutOfRange {
                index: layer,
                size: self.layers.len(),
            });
        }
        Ok(())
    }

    /// Overwrite one value. The grid is never resized.
    pub fn set_element(&mut self, layer: usize, row: usize, col: usize, value: Real) -> Result<()> {
        self.check_layer(layer)?;
        if row >= self.expiries.len() {
            return Err(Error::IndexOutOfRange {
                index: row,
                size: self.expiries.len(),
            });
        }
        if col >= self.lengths.len() {
            return Err(Error::IndexOutOfRange {
                index: col,
                size: self.lengths.len(),
            });
        }
        self.layers[layer][(row, col)] = value;
        self.stale = true;
        Ok(())
    }

    /// Replace one layer; `matrix` must match the grid's shape.
    pub fn set_layer(&mut self, layer: usize, matrix: Matrix) -> Result<()> {
        self.check_layer(layer)?;
        let expected = (self.expiries.len(), self.lengths.len());
        if matrix.shape() != expected {
            return Err(Error::DimensionMismatch(format!(
                "layer {layer} is {:?}, cube is {expected:?}",
                matrix.shape()
            )));
        }
        self.layers[layer] = matrix;
        self.stale = true;
        Ok(())
    }

    /// Replace all layers at once.
    pub fn set_points(&mut self, layers: Vec<Matrix>) -> Result<()> {
        if layers.len() != self.layers.len() {
            return Err(Error::DimensionMismatch(format!(
                "{} layers given, cube has {}",
                layers.len(),
                self.layers.len()
            )));
        }
        let expected = (self.expiries.len(), self.lengths.len());
        if let Some(bad) = layers.iter().position(|m| m.shape() != expected) {
            return Err(Error::DimensionMismatch(format!(
                "layer {bad} is {:?}, cube is {expected:?}",
                layers[bad].shape()
            )));
        }
        self.layers = layers;
        self.stale = true;
        Ok(())
    }

    /// Write `values` (one per layer) at `(expiry, length)`.
    ///
    /// Coordinates already on the axes are overwritten in place. A new
    /// coordinate is inserted at its sorted position with a zero row or
    /// column in every layer, then written.
    pub fn set_point(&mut self, expiry: Time, length: Time, values: &[Real]) -> Result<()> {
        if values.len() != self.layers.len() {
            return Err(Error::DimensionMismatch(format!(
                "{} values given, cube has {} layers",
                values.len(),
                self.layers.len()
            )));
        }
        if !expiry.is_finite() || !length.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "non-finite cube coordinate ({expiry}, {length})"
            )));
        }
        let (row, has_expiry) = search(&self.expiries, expiry);
        let (col, has_length) = search(&self.lengths, length);
        if !has_expiry || !has_length {
            self.expand_layers(row, !has_expiry, col, !has_length)?;
            if !has_expiry {
                self.expiries.insert(row, expiry);
            }
            if !has_length {
                self.lengths.insert(col, length);
            }
        }
        for (layer, &value) in self.layers.iter_mut().zip(values) {
            layer[(row, col)] = value;
        }
        self.stale = true;
        Ok(())
    }

    /// Insert a zero row at `row` and/or a zero column at `col` in every
    /// layer, shifting later rows/columns by one. Axes are left alone.
    fn expand_layers(&mut self, row: usize, expand_rows: bool, col: usize, expand_cols: bool) -> Result<()> {
        for layer in &mut self.layers {
            if expand_rows {
                layer.insert_row(row)?;
            }
            if expand_cols {
                layer.insert_column(col)?;
            }
        }
        Ok(())
    }

    /// Rebuild the per-layer interpolators from the current layers.
    pub fn update_interpolators(&mut self) -> Result<()> {
        self.interpolators = self
            .layers
            .iter()
            .map(|layer| BilinearInterpolation::from_matrix(&self.lengths, &self.expiries, layer))
            .collect::<Result<_>>()?;
        self.stale = false;
        Ok(())
    }

    /// Interpolated value of every layer at `(expiry, length)`, extrapolating
    /// linearly outside the grid.
    pub fn values_at(&self, expiry: Time, length: Time) -> Result<Vec<Real>> {
        if !self.stale {
            return Ok(self
                .interpolators
                .iter()
                .map(|i| i.operator(length, expiry))
                .collect());
        }
        self.layers
            .iter()
            .map(|layer| {
                BilinearInterpolation::from_matrix(&self.lengths, &self.expiries, layer)
                    .map(|i| i.operator(length, expiry))
            })
            .collect()
    }
}

//! Densification of a sparse market volatility cube onto the ATM grid.
//!
//! For every node of the dense grid (sparse axes merged with the ATM axes)
//! that is missing from the sparse grid, the smile is
//! synthesised from the four surrounding sparse SABR smiles. Each
//! neighbour contributes its volatility spread over ATM at the strike with
//! the same moneyness (forward / strike) as the target strike; the four
//! spreads are interpolated bilinearly to the node and added to the node's
//! own ATM volatility.

use volcube_core::{errors::Result, Error, Rate, Real, Spread, Time};
use volcube_math::interpolations::{BilinearInterpolation, Interpolation2D, SabrParameters};

use crate::cube::Cube;
use crate::sabr_calibration::{SabrCalibrationConfig, ALPHA, BETA, FORWARD, NU, RHO};
use crate::smile_section::{SabrSmileInput, SabrSmileSection, SmileSection};
use crate::swap_rate::AtmStrikeProvider;
use crate::swaption_volatility_structure::SwaptionVolatilityStructure;

/// Strikes a directly built SABR smile section spans: `0.05·i + 0.01`.
pub fn canonical_strikes(n: usize) -> Vec<Rate> {
    (0..n).map(|i| 0.05 * i as Real + 0.01).collect()
}

/// Direct-mode SABR smile at `(option_time, swap_length)` from a parameter
/// cube.
pub fn parameter_smile(
    parameters: &Cube,
    option_time: Time,
    swap_length: Time,
    n_strikes: usize,
    config: &SabrCalibrationConfig,
) -> Result<SabrSmileSection> {
    let v = parameters.values_at(option_time, swap_length)?;
    SabrSmileSection::new(
        option_time,
        swap_length,
        SabrSmileInput::Parameters {
            params: SabrParameters::new(v[ALPHA], v[BETA], v[NU], v[RHO]),
            forward: v[FORWARD],
            strikes: canonical_strikes(n_strikes),
        },
        config,
    )
}

fn contains(axis: &[Time], value: Time) -> bool {
    let i = axis.partition_point(|&v| v < value);
    i < axis.len() && axis[i] == value
}

/// Sorted union of two strictly increasing axes.
fn merge_axes(a: &[Time], b: &[Time]) -> Vec<Time> {
    let mut merged = a.to_vec();
    for &value in b {
        if !contains(&merged, value) {
            let i = merged.partition_point(|&v| v < value);
            merged.insert(i, value);
        }
    }
    merged
}

/// Index `i` of the sparse pair `(axis[i], axis[i + 1])` used for `value`.
///
/// Lower-bound search; a value between two nodes takes the pair around it
/// and the last node pairs with the one before. Values outside the axis
/// violate the precondition that the ATM grid lies within the sparse grid.
fn neighbour_index(axis: &[Time], value: Time, what: &str) -> Result<usize> {
    let n = axis.len();
    let located = axis.partition_point(|&v| v < value);
    if located == n || (located == 0 && axis[0] != value) {
        return Err(Error::Precondition(format!(
            "ATM {what} {value} lies outside the sparse grid [{}, {}]",
            axis[0],
            axis[n - 1]
        )));
    }
    let mut index = located;
    if axis[index] != value {
        index -= 1;
    }
    if index == n - 1 {
        index -= 1;
    }
    Ok(index)
}

/// Build the densified market cube.
///
/// `market` is the sparse market cube (one layer per strike spread) and
/// `sparse_parameters` its calibration. The result spans the union of the
/// sparse axes and `atm_structure`'s grid. Every node of that union whose
/// option time or swap length is not on the sparse axes is synthesised into
/// a copy of `market`; nodes already on both axes are left untouched.
pub fn expand_volatility_cube(
    market: &Cube,
    sparse_parameters: &Cube,
    strike_spreads: &[Spread],
    atm_structure: &dyn SwaptionVolatilityStructure,
    atm: &dyn AtmStrikeProvider,
    config: &SabrCalibrationConfig,
) -> Result<Cube> {
    let expiries = sparse_parameters.expiries();
    let lengths = sparse_parameters.lengths();
    let n_strikes = strike_spreads.len();

    let smiles = expiries
        .iter()
        .map(|&t| {
            lengths
                .iter()
                .map(|&l| parameter_smile(sparse_parameters, t, l, n_strikes, config))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let dense_expiries = merge_axes(expiries, atm_structure.option_times());
    let dense_lengths = merge_axes(lengths, atm_structure.swap_lengths());

    let mut dense = market.clone();
    let mut expanded = 0usize;
    for &option_time in &dense_expiries {
        for &swap_length in &dense_lengths {
            if contains(expiries, option_time) && contains(lengths, swap_length) {
                continue;
            }
            let j = neighbour_index(expiries, option_time, "option time")?;
            let k = neighbour_index(lengths, swap_length, "swap length")?;

            let forward = atm.atm_strike(option_time, swap_length)?;
            let atm_vol = atm_structure.volatility(option_time, swap_length, forward)?;

            // corners in row-major order: (j, k), (j, k+1), (j+1, k), (j+1, k+1)
            let corners = [(j, k), (j, k + 1), (j + 1, k), (j + 1, k + 1)];
            let mut corner_forwards = [0.0; 4];
            let mut corner_atm_vols = [0.0; 4];
            for (c, &(a, b)) in corners.iter().enumerate() {
                corner_forwards[c] = atm.atm_strike(expiries[a], lengths[b])?;
                corner_atm_vols[c] = smiles[a][b].volatility(corner_forwards[c]);
            }

            let mut values = Vec::with_capacity(n_strikes);
            for spread in strike_spreads {
                let moneyness = forward / (forward + spread);
                let mut spread_vols = [0.0; 4];
                for (c, &(a, b)) in corners.iter().enumerate() {
                    let strike = corner_forwards[c] / moneyness;
                    spread_vols[c] = smiles[a][b].volatility(strike) - corner_atm_vols[c];
                }
                let local = BilinearInterpolation::new(
                    &[lengths[k], lengths[k + 1]],
                    &[expiries[j], expiries[j + 1]],
                    &spread_vols,
                )?;
                values.push(atm_vol + local.operator(swap_length, option_time));
            }

            tracing::debug!(option_time, swap_length, atm_vol, "expanded cube node");
            dense.set_point(option_time, swap_length, &values)?;
            expanded += 1;
        }
    }
    dense.update_interpolators()?;
    tracing::debug!(
        expanded,
        n_expiries = dense.expiries().len(),
        n_lengths = dense.lengths().len(),
        "dense expansion complete"
    );
    Ok(dense)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_strike_grid() {
        let s = canonical_strikes(3);
        assert_eq!(s.len(), 3);
        assert_eq!(s[0], 0.01);
        assert!((s[2] - 0.11).abs() < 1e-15);
    }

    #[test]
    fn neighbours_bracket_the_value() {
        let axis = [1.0, 5.0, 10.0];
        assert_eq!(neighbour_index(&axis, 1.0, "t").unwrap(), 0);
        assert_eq!(neighbour_index(&axis, 3.0, "t").unwrap(), 0);
        assert_eq!(neighbour_index(&axis, 5.0, "t").unwrap(), 1);
        assert_eq!(neighbour_index(&axis, 7.0, "t").unwrap(), 1);
        // the last node steps back so that a pair exists
        assert_eq!(neighbour_index(&axis, 10.0, "t").unwrap(), 1);
    }

    #[test]
    fn neighbours_outside_the_grid_are_rejected() {
        let axis = [1.0, 5.0];
        assert!(matches!(neighbour_index(&axis, 0.5, "t"), Err(Error::Precondition(_))));
        assert!(matches!(neighbour_index(&axis, 6.0, "t"), Err(Error::Precondition(_))));
    }

    #[test]
    fn merged_axes_are_sorted_without_duplicates() {
        assert_eq!(merge_axes(&[1.0, 5.0], &[1.0, 3.0, 5.0]), vec![1.0, 3.0, 5.0]);
        assert_eq!(merge_axes(&[2.0, 5.0, 10.0], &[2.0, 10.0]), vec![2.0, 5.0, 10.0]);
        assert_eq!(merge_axes(&[2.0, 10.0], &[]), vec![2.0, 10.0]);
    }

    #[test]
    fn exact_membership() {
        assert!(contains(&[1.0, 2.0], 2.0));
        assert!(!contains(&[1.0, 2.0], 1.5));
        assert!(!contains(&[1.0, 2.0], 3.0));
    }
}

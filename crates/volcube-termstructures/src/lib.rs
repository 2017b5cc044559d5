//! # volcube-termstructures
//!
//! Yield curves, swaption volatility structures, smile sections and the
//! SABR swaption volatility cube.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `YieldTermStructure` — discount curves in time.
pub mod yield_term_structure;

/// `FlatForward` — constant forward-rate yield curve.
pub mod flat_forward;

/// ATM strikes as par swap rates.
pub mod swap_rate;

/// `SwaptionVolatilityStructure` and the ATM volatility matrix.
pub mod swaption_volatility_structure;

/// `SmileSection` — SABR and linearly interpolated smiles.
pub mod smile_section;

/// `Cube` — multi-layer (expiry × length) grid with node insertion.
pub mod cube;

/// SABR calibration settings and per-node cube calibration.
pub mod sabr_calibration;

/// Expansion of a sparse market cube onto the ATM grid.
pub mod dense_expansion;

/// Cube quotes and the single-stage spread-interpolating cube.
pub mod swaption_vol_cube;

/// The SABR swaption volatility cube.
pub mod swaption_vol_cube_by_sabr;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use cube::Cube;
pub use dense_expansion::{canonical_strikes, expand_volatility_cube};
pub use flat_forward::FlatForward;
pub use sabr_calibration::{
    calibrate_cube, CalibrationMethod, SabrCalibrationConfig, SabrInitialGuess,
};
pub use smile_section::{
    InterpolatedSmileSection, SabrSmileInput, SabrSmileSection, SmileOptionType, SmileSection,
};
pub use swap_rate::{AtmStrikeProvider, SwapConventions, SwapRateCalculator};
pub use swaption_vol_cube::{SwaptionVolatilityCube, VolCubeQuotes};
pub use swaption_vol_cube_by_sabr::SwaptionVolatilityCubeBySabr;
pub use swaption_volatility_structure::{SwaptionVolatilityMatrix, SwaptionVolatilityStructure};
pub use yield_term_structure::YieldTermStructure;

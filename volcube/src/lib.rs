//! # volcube
//!
//! A swaption volatility cube with SABR smiles.
//!
//! This crate re-exports the public items of the `volcube-*` workspace
//! crates. Application code should depend on it rather than on the
//! individual crates.
//!
//! ```rust
//! use std::sync::Arc;
//! use volcube::termstructures::{
//!     AtmStrikeProvider, FlatForward, SwapConventions, SwapRateCalculator,
//! };
//!
//! let rates = SwapRateCalculator::new(
//!     Arc::new(FlatForward::continuous(0.03)),
//!     SwapConventions::default(),
//! );
//! let atm = rates.atm_strike(1.0, 5.0).unwrap();
//! assert!((atm - 0.03).abs() < 1e-3);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use volcube_core as core;

/// Tenors, frequencies and year fractions.
pub use volcube_time as time;

/// Matrices, interpolation, optimisation and the SABR formula.
pub use volcube_math as math;

/// Yield curves, smile sections and swaption volatility cubes.
pub use volcube_termstructures as termstructures;

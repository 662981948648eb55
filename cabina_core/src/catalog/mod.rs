//! # Equipment Catalogs
//!
//! Typed lookup tables for standard equipment ratings:
//!
//! - [`transformers`] - Standard distribution transformer ratings with losses and u_k
//! - [`devices`] - MV breakers, current transformers, LV breakers, breaking capacities
//! - [`cables`] - MV/LV cable R, X and base ampacity, plus CEI 20-13 correction factors
//! - [`costs`] - indicative transformer and cable prices
//!
//! Ratings are keyed by their nominal value. Every `select_*` function returns
//! the first standard rating that is at least the requested value, or
//! [`CalcError::RatingNotFound`](crate::errors::CalcError::RatingNotFound)
//! when the request exceeds the table.

pub mod cables;
pub mod costs;
pub mod devices;
pub mod transformers;

pub use cables::{CableSpec, CableVoltage, InstallationMethod};
pub use devices::{BREAKING_CAPACITIES_KA, CT_PRIMARIES_A, LV_BREAKER_RATINGS_A, MV_BREAKER_RATINGS_A};
pub use transformers::TransformerSpec;

use crate::errors::{CalcError, CalcResult};

/// Pick the first rating in an ascending table that is `>= required`.
pub(crate) fn first_at_least(table: &[f64], required: f64, catalog: &str) -> CalcResult<f64> {
    table
        .iter()
        .copied()
        .find(|&rating| rating >= required)
        .ok_or_else(|| CalcError::rating_not_found(catalog, format!("{:.1}", required)))
}

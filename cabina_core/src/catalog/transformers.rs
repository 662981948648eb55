//! Standard MV/LV distribution transformers (CEI 14-52 ratings).
//!
//! Losses follow the reduced-loss categories AAo (no-load) and Bk (load).
//! The short-circuit voltage is 4 % up to 1000 kVA and 6 % above.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Catalog record for one standard transformer rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformerSpec {
    /// Rated apparent power (kVA)
    pub rated_kva: u32,
    /// No-load losses P0 (W)
    pub no_load_losses_w: f64,
    /// Load losses Pk at rated current (W)
    pub load_losses_w: f64,
    /// Short-circuit voltage u_k (%)
    pub impedance_percent: f64,
}

/// (kVA, P0 W, Pk W)
const RATINGS: [(u32, f64, f64); 16] = [
    (25, 63.0, 725.0),
    (50, 81.0, 875.0),
    (100, 130.0, 1475.0),
    (160, 189.0, 2000.0),
    (250, 270.0, 2750.0),
    (315, 324.0, 3250.0),
    (400, 387.0, 3850.0),
    (500, 459.0, 4600.0),
    (630, 540.0, 5400.0),
    (800, 585.0, 7000.0),
    (1000, 693.0, 9000.0),
    (1250, 855.0, 11000.0),
    (1600, 1080.0, 14000.0),
    (2000, 1305.0, 18000.0),
    (2500, 1575.0, 22000.0),
    (3150, 1980.0, 27500.0),
];

static TRANSFORMERS: Lazy<BTreeMap<u32, TransformerSpec>> = Lazy::new(|| {
    RATINGS
        .iter()
        .map(|&(rated_kva, no_load_losses_w, load_losses_w)| {
            let impedance_percent = if rated_kva <= 1000 { 4.0 } else { 6.0 };
            (
                rated_kva,
                TransformerSpec {
                    rated_kva,
                    no_load_losses_w,
                    load_losses_w,
                    impedance_percent,
                },
            )
        })
        .collect()
});

/// All standard ratings in ascending order.
pub fn standard_ratings() -> impl Iterator<Item = u32> {
    TRANSFORMERS.keys().copied()
}

/// Look up an exact standard rating.
pub fn lookup(rated_kva: u32) -> CalcResult<&'static TransformerSpec> {
    TRANSFORMERS
        .get(&rated_kva)
        .ok_or_else(|| CalcError::rating_not_found("transformer", format!("{} kVA", rated_kva)))
}

/// Select the smallest standard transformer of at least `required_kva`.
pub fn select(required_kva: f64) -> CalcResult<&'static TransformerSpec> {
    TRANSFORMERS
        .values()
        .find(|spec| f64::from(spec.rated_kva) >= required_kva)
        .ok_or_else(|| CalcError::rating_not_found("transformer", format!("{:.1} kVA", required_kva)))
}

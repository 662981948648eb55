//! Indicative equipment prices (€, 2024 market data).
//!
//! Transformers are priced per unit, cables per metre of single-core conductor.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use super::cables::CableVoltage;
use crate::errors::{CalcError, CalcResult};

/// (kVA, €)
const TRANSFORMER_PRICES: [(u32, f64); 16] = [
    (25, 8_000.0),
    (50, 12_000.0),
    (100, 18_000.0),
    (160, 25_000.0),
    (250, 35_000.0),
    (315, 42_000.0),
    (400, 50_000.0),
    (500, 60_000.0),
    (630, 75_000.0),
    (800, 90_000.0),
    (1000, 110_000.0),
    (1250, 140_000.0),
    (1600, 180_000.0),
    (2000, 220_000.0),
    (2500, 280_000.0),
    (3150, 350_000.0),
];

/// 12/20 kV cable, (mm², €/m)
const MV_CABLE_PRICES: [(u32, f64); 11] = [
    (35, 25.0),
    (50, 32.0),
    (70, 45.0),
    (95, 58.0),
    (120, 70.0),
    (150, 85.0),
    (185, 105.0),
    (240, 135.0),
    (300, 170.0),
    (400, 220.0),
    (500, 280.0),
];

/// 0.6/1 kV cable, (mm², €/m)
const LV_CABLE_PRICES: [(u32, f64); 12] = [
    (35, 8.0),
    (50, 12.0),
    (70, 16.0),
    (95, 22.0),
    (120, 28.0),
    (150, 35.0),
    (185, 45.0),
    (240, 60.0),
    (300, 75.0),
    (400, 95.0),
    (500, 120.0),
    (630, 150.0),
];

static TRANSFORMERS: Lazy<BTreeMap<u32, f64>> = Lazy::new(|| TRANSFORMER_PRICES.iter().copied().collect());
static MV_CABLES: Lazy<BTreeMap<u32, f64>> = Lazy::new(|| MV_CABLE_PRICES.iter().copied().collect());
static LV_CABLES: Lazy<BTreeMap<u32, f64>> = Lazy::new(|| LV_CABLE_PRICES.iter().copied().collect());

/// Price of a standard transformer (€).
pub fn transformer_price(rated_kva: u32) -> CalcResult<f64> {
    TRANSFORMERS
        .get(&rated_kva)
        .copied()
        .ok_or_else(|| CalcError::rating_not_found("transformer price", format!("{} kVA", rated_kva)))
}

/// Price of one metre of single-core cable (€/m).
pub fn cable_price_per_m(voltage: CableVoltage, section_mm2: u32) -> CalcResult<f64> {
    let table = match voltage {
        CableVoltage::Mv => &MV_CABLES,
        CableVoltage::Lv => &LV_CABLES,
    };
    table.get(&section_mm2).copied().ok_or_else(|| {
        CalcError::rating_not_found(
            format!("{} cable price", voltage.code()),
            format!("{} mm²", section_mm2),
        )
    })
}

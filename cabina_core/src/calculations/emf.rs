//! # Magnetic Field Distance (DPA)
//!
//! First-approximation distance per DM 29/05/2008 §5.2.1: beyond the DPA the
//! 3 µT quality target for magnetic induction is met.
//!
//! ```text
//! DPA / √I = 0.40942 × x^0.5241
//! x = √(S / π) × c / 1000        c = 2.5 (MV), 1.8 (LV)
//! ```
//!
//! The result is rounded up to the next half metre.
//!
//! ## Example
//!
//! ```rust
//! use cabina_core::calculations::emf::{calculate, EmfInput};
//! use cabina_core::catalog::CableVoltage;
//!
//! let input = EmfInput {
//!     label: "LV busbar".to_string(),
//!     current_a: 721.7,
//!     section_mm2: 630,
//!     voltage: CableVoltage::Lv,
//! };
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.dpa_m, 2.0);
//! assert!(result.within_quality_target);
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::CableVoltage;
use crate::errors::{require_positive, CalcResult};

const DPA_COEFFICIENT: f64 = 0.40942;
const DPA_EXPONENT: f64 = 0.5241;
/// Distance for the 3 µT quality target (m)
pub const QUALITY_TARGET_M: f64 = 3.0;
/// Distance for the 10 µT attention value (m)
pub const ATTENTION_VALUE_M: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmfInput {
    #[serde(default)]
    pub label: String,
    /// Current in the conductors (A)
    pub current_a: f64,
    pub section_mm2: u32,
    pub voltage: CableVoltage,
}

impl EmfInput {
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("current_a", self.current_a)?;
        require_positive("section_mm2", f64::from(self.section_mm2))?;
        Ok(())
    }

    /// Equivalent conductor spacing x (m)
    pub fn equivalent_diameter_m(&self) -> f64 {
        let insulation = match self.voltage {
            CableVoltage::Mv => 2.5,
            CableVoltage::Lv => 1.8,
        };
        (f64::from(self.section_mm2) / std::f64::consts::PI).sqrt() * insulation / 1000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmfResult {
    pub equivalent_diameter_m: f64,
    /// Unrounded distance (m)
    pub dpa_computed_m: f64,
    /// Distance rounded up to 0.5 m
    pub dpa_m: f64,
    pub within_quality_target: bool,
    pub within_attention_value: bool,
}

pub fn calculate(input: &EmfInput) -> CalcResult<EmfResult> {
    input.validate()?;
    let x = input.equivalent_diameter_m();
    let dpa_computed_m = DPA_COEFFICIENT * x.powf(DPA_EXPONENT) * input.current_a.sqrt();
    let dpa_m = (dpa_computed_m * 2.0).ceil() / 2.0;
    Ok(EmfResult {
        equivalent_diameter_m: x,
        dpa_computed_m,
        dpa_m,
        within_quality_target: dpa_m <= QUALITY_TARGET_M,
        within_attention_value: dpa_m <= ATTENTION_VALUE_M,
    })
}

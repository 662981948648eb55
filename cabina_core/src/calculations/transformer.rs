//! # Transformer Sizing
//!
//! Picks the standard distribution transformer for a connected load and
//! derives its nominal currents, the infinite-bus LV fault current and the
//! efficiency at a typical operating point.
//!
//! ## Method
//!
//! ```text
//! S_req = P × k_div × margin / cos φ        (cos φ = 1 for apparent power)
//! I_n   = S / (√3 × V)
//! Icc   = S / (√3 × V_lv × u_k)
//! η     = P_u / (P_u + P0 + Pk × α²)         P_u = S × α × cos φ
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cabina_core::calculations::transformer::{calculate, TransformerInput};
//! use cabina_core::config::NetworkSettings;
//!
//! let input = TransformerInput::new("TR1", 500.0);
//! let result = calculate(&input, &NetworkSettings::default()).unwrap();
//!
//! // 500 × 0.7 × 1.2 / 0.85 = 494.1 kVA -> 500 kVA
//! assert_eq!(result.selected_kva, 500);
//! assert!((result.lv_nominal_current_a - 721.7).abs() < 0.1);
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::transformers;
use crate::config::NetworkSettings;
use crate::errors::{require_positive, CalcError, CalcResult};
use crate::units::KiloVoltAmperes;

/// Load factor used for the efficiency figure
pub const EFFICIENCY_LOAD_FACTOR: f64 = 0.8;
/// Power factor used for the efficiency figure
pub const EFFICIENCY_POWER_FACTOR: f64 = 0.95;

/// How the connected load is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerKind {
    /// kW; divided by the power factor
    #[default]
    Active,
    /// kVA; the power factor is ignored
    Apparent,
}

/// Input parameters for transformer sizing.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "TR1",
///   "load_kw": 500.0,
///   "diversity_factor": 0.7,
///   "power_factor": 0.85,
///   "margin": 1.2,
///   "power_kind": "active"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerInput {
    /// User label (e.g., "TR1")
    #[serde(default)]
    pub label: String,

    /// Installed load (kW, or kVA when `power_kind` is apparent)
    pub load_kw: f64,

    /// Simultaneity factor (0, 1]
    #[serde(default = "default_diversity")]
    pub diversity_factor: f64,

    /// Load power factor (0, 1]
    #[serde(default = "default_power_factor")]
    pub power_factor: f64,

    /// Expansion margin (>= 1)
    #[serde(default = "default_margin")]
    pub margin: f64,

    #[serde(default)]
    pub power_kind: PowerKind,
}

fn default_diversity() -> f64 {
    0.7
}

fn default_power_factor() -> f64 {
    0.85
}

fn default_margin() -> f64 {
    1.2
}

impl TransformerInput {
    /// Input with the usual defaults (diversity 0.7, cos φ 0.85, margin 1.2).
    pub fn new(label: impl Into<String>, load_kw: f64) -> Self {
        TransformerInput {
            label: label.into(),
            load_kw,
            diversity_factor: default_diversity(),
            power_factor: default_power_factor(),
            margin: default_margin(),
            power_kind: PowerKind::Active,
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("load_kw", self.load_kw)?;
        require_positive("diversity_factor", self.diversity_factor)?;
        require_positive("power_factor", self.power_factor)?;
        require_positive("margin", self.margin)?;
        if self.diversity_factor > 1.0 {
            return Err(CalcError::invalid_input(
                "diversity_factor",
                self.diversity_factor.to_string(),
                "Diversity factor cannot exceed 1",
            ));
        }
        if self.power_factor > 1.0 {
            return Err(CalcError::invalid_input(
                "power_factor",
                self.power_factor.to_string(),
                "Power factor cannot exceed 1",
            ));
        }
        if self.margin < 1.0 {
            return Err(CalcError::invalid_input(
                "margin",
                self.margin.to_string(),
                "Margin must be at least 1",
            ));
        }
        Ok(())
    }

    /// Power factor actually applied to the load
    pub fn effective_power_factor(&self) -> f64 {
        match self.power_kind {
            PowerKind::Active => self.power_factor,
            PowerKind::Apparent => 1.0,
        }
    }

    /// Required apparent power (kVA)
    pub fn required_kva(&self) -> f64 {
        self.load_kw * self.diversity_factor * self.margin / self.effective_power_factor()
    }
}

/// Transformer efficiency at one operating point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Efficiency {
    pub load_factor: f64,
    pub power_factor: f64,
    /// Delivered active power (kW)
    pub output_kw: f64,
    pub no_load_losses_kw: f64,
    /// Load losses scaled by the load factor squared (kW)
    pub load_losses_kw: f64,
    pub efficiency_percent: f64,
}

impl Efficiency {
    pub fn at(spec: &transformers::TransformerSpec, load_factor: f64, power_factor: f64) -> Self {
        let output_kw = f64::from(spec.rated_kva) * load_factor * power_factor;
        let no_load_losses_kw = spec.no_load_losses_w / 1000.0;
        let load_losses_kw = spec.load_losses_w / 1000.0 * load_factor * load_factor;
        Efficiency {
            load_factor,
            power_factor,
            output_kw,
            no_load_losses_kw,
            load_losses_kw,
            efficiency_percent: output_kw / (output_kw + no_load_losses_kw + load_losses_kw) * 100.0,
        }
    }
}

/// Results of transformer sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerResult {
    pub required_kva: f64,
    pub selected_kva: u32,
    pub impedance_percent: f64,
    pub no_load_losses_w: f64,
    pub load_losses_w: f64,
    pub mv_nominal_current_a: f64,
    pub lv_nominal_current_a: f64,
    /// Infinite-bus LV fault current, transformer impedance only (A)
    pub lv_fault_current_a: f64,
    pub efficiency: Efficiency,
}

/// Size the transformer for a load.
pub fn calculate(input: &TransformerInput, network: &NetworkSettings) -> CalcResult<TransformerResult> {
    input.validate()?;
    network.validate()?;

    let required_kva = input.required_kva();
    let spec = transformers::select(required_kva)?;
    let rated = KiloVoltAmperes(f64::from(spec.rated_kva));

    let mv_nominal_current_a = rated.line_current(network.mv_voltage()).0;
    let lv_nominal_current_a = rated.line_current(network.lv_voltage()).0;
    let lv_fault_current_a = lv_nominal_current_a / (spec.impedance_percent / 100.0);

    Ok(TransformerResult {
        required_kva,
        selected_kva: spec.rated_kva,
        impedance_percent: spec.impedance_percent,
        no_load_losses_w: spec.no_load_losses_w,
        load_losses_w: spec.load_losses_w,
        mv_nominal_current_a,
        lv_nominal_current_a,
        lv_fault_current_a,
        efficiency: Efficiency::at(spec, EFFICIENCY_LOAD_FACTOR, EFFICIENCY_POWER_FACTOR),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_500kw_load() {
        let result = calculate(&TransformerInput::new("TR1", 500.0), &NetworkSettings::default()).unwrap();
        assert!((result.required_kva - 494.1176).abs() < 1e-3);
        assert_eq!(result.selected_kva, 500);
        assert_eq!(result.impedance_percent, 4.0);
        assert!((result.mv_nominal_current_a - 14.4338).abs() < 1e-3);
        assert!((result.lv_nominal_current_a - 721.6878).abs() < 1e-3);
        // 721.69 / 0.04
        assert!((result.lv_fault_current_a - 18_042.19).abs() < 0.01);
    }

    #[test]
    fn test_apparent_power_ignores_power_factor() {
        let input = TransformerInput {
            power_kind: PowerKind::Apparent,
            power_factor: 0.5,
            ..TransformerInput::new("TR1", 500.0)
        };
        let result = calculate(&input, &NetworkSettings::default()).unwrap();
        // 500 × 0.7 × 1.2 = 420
        assert!((result.required_kva - 420.0).abs() < 1e-9);
        assert_eq!(result.selected_kva, 500);
    }

    #[test]
    fn test_large_unit_uses_6_percent() {
        let result = calculate(&TransformerInput::new("TR1", 1200.0), &NetworkSettings::default()).unwrap();
        // 1200 × 0.7 × 1.2 / 0.85 = 1185.9 kVA
        assert_eq!(result.selected_kva, 1250);
        assert_eq!(result.impedance_percent, 6.0);
    }

    #[test]
    fn test_efficiency_1000kva() {
        let spec = transformers::lookup(1000).unwrap();
        let eff = Efficiency::at(spec, 0.8, 0.95);
        // Pu = 760 kW, P0 = 0.693 kW, Pk·α² = 5.76 kW
        assert!((eff.output_kw - 760.0).abs() < 1e-9);
        assert!((eff.load_losses_kw - 5.76).abs() < 1e-9);
        assert!((eff.efficiency_percent - 99.1579).abs() < 1e-3);
    }

    #[test]
    fn test_load_beyond_catalog() {
        let err = calculate(&TransformerInput::new("big", 5000.0), &NetworkSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "RATING_NOT_FOUND");
    }

    #[test]
    fn test_validation() {
        let mut input = TransformerInput::new("TR1", 0.0);
        assert!(input.validate().is_err());
        input.load_kw = 100.0;
        input.power_factor = 1.2;
        assert!(input.validate().is_err());
        input.power_factor = 0.9;
        input.margin = 0.9;
        assert!(input.validate().is_err());
        input.margin = 1.0;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_json_defaults() {
        let input: TransformerInput = serde_json::from_str(r#"{"load_kw": 250.0}"#).unwrap();
        assert_eq!(input.diversity_factor, 0.7);
        assert_eq!(input.power_factor, 0.85);
        assert_eq!(input.margin, 1.2);
        assert_eq!(input.power_kind, PowerKind::Active);
    }
}

//! # Short-Circuit Levels
//!
//! Impedance method (IEC 60909 / CEI 11-25) for a three-phase bolted fault
//! at the MV terminals and at the LV busbar.
//!
//! ## Network model
//!
//! - Distributor grid: `Z = V_mv² / S_cc`, with `R = 0.1 Z` and `X = 0.995 Z`
//! - Transformer (LV side): `R = P_k / (3 I_lv²)`, `Z = u_k V_lv² / S`, `X = √(Z² − R²)`
//! - MV cable: catalog R and X per km
//!
//! MV-side impedances are referred to the LV side by dividing by the voltage
//! ratio squared.
//!
//! ## Outputs
//!
//! Symmetrical and peak currents on both sides (peak factors 2.5 MV, 2.1 LV),
//! let-through energy for typical clearing times, and the minimum
//! cross-section that withstands it (`S = I √t / k`).

use serde::{Deserialize, Serialize};

use crate::catalog::{cables, transformers, CableVoltage};
use crate::config::NetworkSettings;
use crate::errors::{require_positive, CalcError, CalcResult};
use crate::units::{Amperes, KiloAmperes, KiloVoltAmperes, Ohms};

pub const GRID_R_FRACTION: f64 = 0.1;
pub const GRID_X_FRACTION: f64 = 0.995;
pub const MV_PEAK_FACTOR: f64 = 2.5;
pub const LV_PEAK_FACTOR: f64 = 2.1;
/// Fault clearing time assumed on the MV side (s)
pub const MV_CLEARING_TIME_S: f64 = 0.1;
/// Fault clearing time assumed on the LV side (s)
pub const LV_CLEARING_TIME_S: f64 = 0.01;
/// Adiabatic constant for MV copper/XLPE cable (A·√s/mm²)
pub const K_MV: f64 = 142.0;
/// Adiabatic constant for LV copper cable (A·√s/mm²)
pub const K_LV: f64 = 115.0;

/// Input parameters for the short-circuit calculation.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "TR1",
///   "transformer_kva": 500,
///   "mv_cable_length_m": 50.0,
///   "mv_cable_section_mm2": 120
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortCircuitInput {
    #[serde(default)]
    pub label: String,

    /// Standard transformer rating (kVA)
    pub transformer_kva: u32,

    /// Length of the MV feeder cable (m)
    #[serde(default = "default_mv_length")]
    pub mv_cable_length_m: f64,

    /// Cross-section of the MV feeder cable (mm²)
    #[serde(default = "default_mv_section")]
    pub mv_cable_section_mm2: u32,
}

fn default_mv_length() -> f64 {
    50.0
}

fn default_mv_section() -> u32 {
    120
}

impl ShortCircuitInput {
    pub fn new(label: impl Into<String>, transformer_kva: u32) -> Self {
        ShortCircuitInput {
            label: label.into(),
            transformer_kva,
            mv_cable_length_m: default_mv_length(),
            mv_cable_section_mm2: default_mv_section(),
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("mv_cable_length_m", self.mv_cable_length_m)?;
        transformers::lookup(self.transformer_kva)?;
        cables::lookup(CableVoltage::Mv, self.mv_cable_section_mm2)?;
        Ok(())
    }
}

/// Resistance and reactance of one network element (Ω).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impedance {
    pub r_ohm: Ohms,
    pub x_ohm: Ohms,
    pub z_ohm: Ohms,
}

impl Impedance {
    pub fn new(r: Ohms, x: Ohms) -> Self {
        Impedance {
            r_ohm: r,
            x_ohm: x,
            z_ohm: Ohms::magnitude(r, x),
        }
    }

    /// Series connection
    pub fn plus(&self, other: &Impedance) -> Impedance {
        Impedance::new(self.r_ohm + other.r_ohm, self.x_ohm + other.x_ohm)
    }

    /// Refer across a transformer (see [`Ohms::referred`])
    pub fn referred(&self, ratio: f64) -> Impedance {
        Impedance::new(self.r_ohm.referred(ratio), self.x_ohm.referred(ratio))
    }
}

/// Fault level at one point of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultLevel {
    /// Upstream impedance seen from the fault
    pub impedance: Impedance,
    pub symmetrical_a: Amperes,
    pub symmetrical_ka: KiloAmperes,
    pub peak_ka: KiloAmperes,
    pub clearing_time_s: f64,
    /// Let-through energy I²t (MA²s)
    pub let_through_ma2s: f64,
    /// Minimum cross-section withstanding I²t (mm²)
    pub min_section_mm2: f64,
}

impl FaultLevel {
    fn at(impedance: Impedance, voltage_v: f64, peak_factor: f64, clearing_time_s: f64, k: f64) -> Self {
        let symmetrical = voltage_v / (3f64.sqrt() * impedance.z_ohm.value());
        FaultLevel {
            impedance,
            symmetrical_a: Amperes(symmetrical),
            symmetrical_ka: Amperes(symmetrical).into(),
            peak_ka: Amperes(symmetrical * peak_factor).into(),
            clearing_time_s,
            let_through_ma2s: symmetrical * symmetrical * clearing_time_s / 1e6,
            min_section_mm2: symmetrical * clearing_time_s.sqrt() / k,
        }
    }
}

/// Results of the short-circuit calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortCircuitResult {
    pub grid_short_circuit_mva: f64,
    pub grid: Impedance,
    /// Transformer, LV side
    pub transformer_lv: Impedance,
    /// Transformer referred to the MV side
    pub transformer_mv: Impedance,
    pub mv_cable: Impedance,
    pub mv_cable_section_mm2: u32,
    pub mv: FaultLevel,
    pub lv: FaultLevel,
    /// MV cable section is at least the thermal minimum
    pub mv_cable_withstands: bool,
}

/// Compute MV and LV fault levels.
pub fn calculate(input: &ShortCircuitInput, network: &NetworkSettings) -> CalcResult<ShortCircuitResult> {
    input.validate()?;
    network.validate()?;

    let ratio = network.voltage_ratio();
    let v_mv = network.mv_voltage_v;
    let v_lv = network.lv_voltage_v;

    let z_grid = v_mv * v_mv / (network.grid_short_circuit_mva * 1e6);
    let grid = Impedance::new(Ohms(z_grid * GRID_R_FRACTION), Ohms(z_grid * GRID_X_FRACTION));

    let spec = transformers::lookup(input.transformer_kva)?;
    let rated = KiloVoltAmperes(f64::from(spec.rated_kva));
    let i_lv = rated.line_current(network.lv_voltage()).value();
    let r_tr = spec.load_losses_w / (3.0 * i_lv * i_lv);
    let z_tr = spec.impedance_percent / 100.0 * v_lv * v_lv / (rated.value() * 1000.0);
    if z_tr <= r_tr {
        return Err(CalcError::calculation_failed(
            "short_circuit",
            format!("Transformer resistance {:.5} Ω exceeds impedance {:.5} Ω", r_tr, z_tr),
        ));
    }
    let transformer_lv = Impedance::new(Ohms(r_tr), Ohms((z_tr * z_tr - r_tr * r_tr).sqrt()));

    let cable = cables::lookup(CableVoltage::Mv, input.mv_cable_section_mm2)?;
    let mv_cable = Impedance::new(
        Ohms(cable.resistance_ohm(input.mv_cable_length_m)),
        Ohms(cable.reactance_ohm(input.mv_cable_length_m)),
    );

    let upstream_mv = grid.plus(&mv_cable);
    let mv = FaultLevel::at(upstream_mv, v_mv, MV_PEAK_FACTOR, MV_CLEARING_TIME_S, K_MV);
    let lv = FaultLevel::at(
        transformer_lv.plus(&upstream_mv.referred(1.0 / ratio)),
        v_lv,
        LV_PEAK_FACTOR,
        LV_CLEARING_TIME_S,
        K_LV,
    );

    Ok(ShortCircuitResult {
        grid_short_circuit_mva: network.grid_short_circuit_mva,
        grid,
        transformer_mv: transformer_lv.referred(ratio),
        transformer_lv,
        mv_cable,
        mv_cable_section_mm2: input.mv_cable_section_mm2,
        mv_cable_withstands: f64::from(input.mv_cable_section_mm2) >= mv.min_section_mm2,
        mv,
        lv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_500() -> ShortCircuitResult {
        calculate(&ShortCircuitInput::new("TR1", 500), &NetworkSettings::default()).unwrap()
    }

    #[test]
    fn test_grid_impedance() {
        let r = result_500();
        // 20 kV² / 250 MVA = 1.6 Ω
        assert!((r.grid.r_ohm.value() - 0.16).abs() < 1e-12);
        assert!((r.grid.x_ohm.value() - 1.592).abs() < 1e-12);
    }

    #[test]
    fn test_transformer_impedance_500kva() {
        let r = result_500();
        assert!((r.transformer_lv.r_ohm.value() - 0.0029440).abs() < 1e-6);
        assert!((r.transformer_lv.z_ohm.value() - 0.0128).abs() < 1e-9);
        assert!((r.transformer_lv.x_ohm.value() - 0.0124568).abs() < 1e-6);
        // referred ×2500
        assert!((r.transformer_mv.z_ohm.value() - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_fault_levels_500kva() {
        let r = result_500();
        assert!((r.mv.symmetrical_ka.value() - 7.18966).abs() < 1e-3);
        assert!((r.mv.peak_ka.value() - 17.9742).abs() < 3e-3);
        assert!((r.lv.symmetrical_ka.value() - 17.1860).abs() < 1e-3);
        assert!((r.lv.peak_ka.value() - 36.0906).abs() < 3e-3);
        // upstream impedance lowers the LV fault below the infinite-bus value
        assert!(r.lv.symmetrical_a.value() < 18_042.2);
    }

    #[test]
    fn test_thermal_withstand() {
        let r = result_500();
        // 7189.7 × √0.1 / 142 ≈ 16 mm²
        assert!((r.mv.min_section_mm2 - 16.011).abs() < 0.01);
        assert!(r.mv_cable_withstands);
        assert!((r.lv.let_through_ma2s - r.lv.symmetrical_a.value().powi(2) * 0.01 / 1e6).abs() < 1e-12);
    }

    #[test]
    fn test_stronger_grid_raises_mv_fault() {
        let strong = NetworkSettings {
            grid_short_circuit_mva: 500.0,
            ..NetworkSettings::default()
        };
        let weak = result_500();
        let strong = calculate(&ShortCircuitInput::new("TR1", 500), &strong).unwrap();
        assert!(strong.mv.symmetrical_a > weak.mv.symmetrical_a);
        assert!(strong.lv.symmetrical_a > weak.lv.symmetrical_a);
    }

    #[test]
    fn test_unknown_ratings_rejected() {
        let network = NetworkSettings::default();
        let err = calculate(&ShortCircuitInput::new("x", 700), &network).unwrap_err();
        assert_eq!(err.error_code(), "RATING_NOT_FOUND");

        let input = ShortCircuitInput {
            mv_cable_section_mm2: 25,
            ..ShortCircuitInput::new("x", 500)
        };
        assert!(calculate(&input, &network).is_err());
    }
}

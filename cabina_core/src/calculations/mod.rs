//! # Substation Calculations
//!
//! Every calculation follows the same pattern:
//!
//! - `*Input` - input parameters (JSON-serializable, `validate()`)
//! - `*Result` - results (JSON-serializable)
//! - `calculate(&input, ...) -> CalcResult<*Result>` - pure function
//!
//! ## Available Calculations
//!
//! - [`transformer`] - transformer rating, nominal currents, efficiency
//! - [`short_circuit`] - MV and LV fault levels (impedance method)
//! - [`protection`] - MV relay, CT, surge arresters, LV main breaker
//! - [`cables`] - MV and LV cable sections
//! - [`emf`] - magnetic field distance (DPA)
//! - [`selectivity`] - MV relay / LV breaker coordination
//! - [`harmonics`] - harmonic spectrum, THD and transformer derating
//! - [`economics`] - capital and running costs over the service life
//! - [`neutral`] - LV earthing arrangement of the transformer neutral
//! - [`construction`] - minimum room sizes of the substation building
//! - [`substation`] - all of the above chained from the connected load

pub mod cables;
pub mod construction;
pub mod economics;
pub mod emf;
pub mod harmonics;
pub mod neutral;
pub mod protection;
pub mod selectivity;
pub mod short_circuit;
pub mod substation;
pub mod transformer;

use serde::{Deserialize, Serialize};

use crate::config::CabinaConfig;
use crate::errors::CalcResult;

pub use cables::{CableInput, CableResult};
pub use construction::{ConstructionInput, ConstructionResult};
pub use economics::{EconomicsInput, EconomicsResult};
pub use emf::{EmfInput, EmfResult};
pub use harmonics::{HarmonicsInput, HarmonicsResult};
pub use neutral::{NeutralInput, NeutralResult};
pub use protection::{ProtectionInput, ProtectionResult};
pub use selectivity::{CoordinationInput, CoordinationReport};
pub use short_circuit::{ShortCircuitInput, ShortCircuitResult};
pub use substation::{SubstationInput, SubstationResult};
pub use transformer::{TransformerInput, TransformerResult};

/// Enum wrapper for all calculation inputs.
///
/// Lets a study store heterogeneous calculations in one collection.
///
/// ```json
/// { "type": "Coordination", "mv_nominal_current_a": 18.2, ... }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    Transformer(TransformerInput),
    ShortCircuit(ShortCircuitInput),
    Protection(ProtectionInput),
    Cables(CableInput),
    Emf(EmfInput),
    Coordination(CoordinationInput),
    Harmonics(HarmonicsInput),
    Economics(EconomicsInput),
    Neutral(NeutralInput),
    Construction(ConstructionInput),
    Substation(SubstationInput),
}

impl CalculationItem {
    /// User-provided label of the calculation
    pub fn label(&self) -> &str {
        match self {
            CalculationItem::Transformer(i) => &i.label,
            CalculationItem::ShortCircuit(i) => &i.label,
            CalculationItem::Protection(i) => &i.label,
            CalculationItem::Cables(i) => &i.label,
            CalculationItem::Emf(i) => &i.label,
            CalculationItem::Coordination(i) => &i.label,
            CalculationItem::Harmonics(i) => &i.label,
            CalculationItem::Economics(i) => &i.label,
            CalculationItem::Neutral(i) => &i.label,
            CalculationItem::Construction(i) => &i.label,
            CalculationItem::Substation(i) => &i.label,
        }
    }

    /// Calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationItem::Transformer(_) => "Transformer",
            CalculationItem::ShortCircuit(_) => "ShortCircuit",
            CalculationItem::Protection(_) => "Protection",
            CalculationItem::Cables(_) => "Cables",
            CalculationItem::Emf(_) => "Emf",
            CalculationItem::Coordination(_) => "Coordination",
            CalculationItem::Harmonics(_) => "Harmonics",
            CalculationItem::Economics(_) => "Economics",
            CalculationItem::Neutral(_) => "Neutral",
            CalculationItem::Construction(_) => "Construction",
            CalculationItem::Substation(_) => "Substation",
        }
    }

    /// Run the calculation with the given network settings and policy.
    pub fn run(&self, config: &CabinaConfig) -> CalcResult<CalculationOutput> {
        let network = &config.network;
        Ok(match self {
            CalculationItem::Transformer(i) => CalculationOutput::Transformer(transformer::calculate(i, network)?),
            CalculationItem::ShortCircuit(i) => {
                CalculationOutput::ShortCircuit(short_circuit::calculate(i, network)?)
            }
            CalculationItem::Protection(i) => CalculationOutput::Protection(protection::calculate(i, network)?),
            CalculationItem::Cables(i) => CalculationOutput::Cables(cables::calculate(i, network)?),
            CalculationItem::Emf(i) => CalculationOutput::Emf(emf::calculate(i)?),
            CalculationItem::Coordination(i) => {
                CalculationOutput::Coordination(selectivity::evaluate(i, &config.coordination)?)
            }
            CalculationItem::Harmonics(i) => CalculationOutput::Harmonics(harmonics::calculate(i)?),
            CalculationItem::Economics(i) => CalculationOutput::Economics(economics::calculate(i)?),
            CalculationItem::Neutral(i) => CalculationOutput::Neutral(neutral::calculate(i)?),
            CalculationItem::Construction(i) => CalculationOutput::Construction(construction::calculate(i)?),
            CalculationItem::Substation(i) => CalculationOutput::Substation(Box::new(substation::calculate(i, config)?)),
        })
    }
}

/// Result of running a [`CalculationItem`], tagged the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationOutput {
    Transformer(TransformerResult),
    ShortCircuit(ShortCircuitResult),
    Protection(ProtectionResult),
    Cables(CableResult),
    Emf(EmfResult),
    Coordination(CoordinationReport),
    Harmonics(HarmonicsResult),
    Economics(EconomicsResult),
    Neutral(NeutralResult),
    Construction(ConstructionResult),
    Substation(Box<SubstationResult>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_tagging() {
        let item = CalculationItem::Transformer(TransformerInput::new("TR1", 500.0));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"Transformer\""));
        let roundtrip: CalculationItem = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, item);
        assert_eq!(roundtrip.label(), "TR1");
        assert_eq!(roundtrip.calc_type(), "Transformer");
    }

    #[test]
    fn test_run_dispatch() {
        let config = CabinaConfig::default();
        let item = CalculationItem::ShortCircuit(ShortCircuitInput::new("TR1", 500));
        match item.run(&config).unwrap() {
            CalculationOutput::ShortCircuit(r) => assert!(r.lv.symmetrical_a.value() > 17_000.0),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_supplementary_items_dispatch() {
        let config = CabinaConfig::default();
        let item: CalculationItem =
            serde_json::from_str(r#"{"type": "Harmonics", "transformer_kva": 500, "lv_current_a": 721.7}"#).unwrap();
        assert_eq!(item.calc_type(), "Harmonics");
        assert!(matches!(item.run(&config).unwrap(), CalculationOutput::Harmonics(_)));

        let item: CalculationItem = serde_json::from_str(r#"{"type": "Neutral", "occupancy": "civil"}"#).unwrap();
        match item.run(&config).unwrap() {
            CalculationOutput::Neutral(r) => assert_eq!(r.system, neutral::EarthingSystem::Tt),
            other => panic!("unexpected output {:?}", other),
        }

        let item = CalculationItem::Construction(ConstructionInput {
            label: "room".to_string(),
            transformer_kva: 630,
        });
        assert!(matches!(item.run(&config).unwrap(), CalculationOutput::Construction(_)));

        let item: CalculationItem = serde_json::from_str(
            r#"{"type": "Economics", "transformer_kva": 500, "mv_section_mm2": 35, "lv_section_mm2": 630,
                "mv_length_m": 50.0, "lv_length_m": 30.0, "cable_losses_kw": 1.0}"#,
        )
        .unwrap();
        match item.run(&config).unwrap() {
            CalculationOutput::Economics(r) => assert!((r.capex.total - 187_050.0).abs() < 1e-6),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_coordination_item_from_json() {
        let json = r#"{
            "type": "Coordination",
            "label": "worked example",
            "mv_nominal_current_a": 18.2,
            "lv_nominal_current_a": 910.0,
            "lv_fault_current_a": 25000.0,
            "relay": {
                "overcurrent_pickup_a": 27.3,
                "instantaneous_pickup_a": 650.0,
                "tms": 0.8,
                "curve": "very_inverse",
                "instantaneous_delay_s": 0.5
            },
            "breaker": {
                "rated_current_a": 1000.0,
                "magnetic_multiplier": 10.0,
                "thermal_multiplier": 1.45
            },
            "voltage_ratio": 50.0
        }"#;
        let item: CalculationItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.calc_type(), "Coordination");
        match item.run(&CabinaConfig::default()).unwrap() {
            CalculationOutput::Coordination(report) => assert_eq!(report.points_evaluated, 7),
            other => panic!("unexpected output {:?}", other),
        }
    }
}

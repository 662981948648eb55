//! # Substation Pipeline
//!
//! Runs the complete preliminary sizing of an MV/LV substation from the
//! connected load:
//!
//! 1. [`transformer`] - rating, nominal currents, infinite-bus LV fault
//! 2. [`protection`] - MV and LV devices (breaking capacity from step 1)
//! 3. [`cables`] - MV feeder and LV busbar cables
//! 4. [`emf`] - DPA for both cables
//! 5. [`short_circuit`] - fault levels with the grid and the selected MV cable
//! 6. [`selectivity`] - relay/breaker coordination at the step 5 LV fault current
//! 7. [`harmonics`] - THD and derating for the load profile
//! 8. [`economics`] - costs from the selected transformer and cables
//! 9. [`neutral`] and [`construction`] - LV earthing arrangement and room sizes
//!
//! Relay settings for step 6 are derived from the policy
//! ([`ProtectionSetting::derive`]); the LV breaker rating comes from step 2.
//!
//! ## Example
//!
//! ```rust
//! use cabina_core::calculations::substation::{calculate, SubstationInput};
//! use cabina_core::config::CabinaConfig;
//!
//! let input = SubstationInput::for_load("Cabina 1", 500.0);
//! let result = calculate(&input, &CabinaConfig::default()).unwrap();
//! assert_eq!(result.transformer.selected_kva, 500);
//! assert_eq!(result.protection.lv.main_breaker_a, 800.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cables::{self, CableInput, CableResult, CableRun};
use super::construction::{self, ConstructionInput, ConstructionResult};
use super::economics::{self, EconomicRates, EconomicsInput, EconomicsResult};
use super::emf::{self, EmfInput, EmfResult};
use super::harmonics::{self, HarmonicsInput, HarmonicsResult, LoadProfile};
use super::neutral::{self, NeutralInput, NeutralResult, Occupancy};
use super::protection::{self, ProtectionInput, ProtectionResult};
use super::selectivity::{self, BreakerSetting, CoordinationInput, CoordinationReport, ProtectionSetting};
use super::short_circuit::{self, ShortCircuitInput, ShortCircuitResult};
use super::transformer::{self, TransformerInput, TransformerResult};
use crate::catalog::CableVoltage;
use crate::config::CabinaConfig;
use crate::errors::CalcResult;

/// Input for a complete substation sizing.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Cabina 1",
///   "load": { "load_kw": 500.0 },
///   "cables": { "mv_length_m": 50.0, "lv_length_m": 30.0 },
///   "load_profile": "non_linear",
///   "occupancy": "industrial",
///   "economics": { "energy_price_per_kwh": 0.25 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstationInput {
    #[serde(default)]
    pub label: String,
    pub load: TransformerInput,
    #[serde(default)]
    pub cables: CableRun,
    #[serde(default)]
    pub load_profile: LoadProfile,
    #[serde(default)]
    pub occupancy: Occupancy,
    #[serde(default)]
    pub economics: EconomicRates,
}

impl SubstationInput {
    /// Default sizing options for an active load in kW.
    pub fn for_load(label: impl Into<String>, load_kw: f64) -> Self {
        let label = label.into();
        SubstationInput {
            load: TransformerInput::new(label.clone(), load_kw),
            label,
            cables: CableRun::default(),
            load_profile: LoadProfile::default(),
            occupancy: Occupancy::default(),
            economics: EconomicRates::default(),
        }
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        self.load.validate()?;
        self.cables.validate()?;
        self.economics.validate()
    }
}

/// Results of every step of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstationResult {
    pub label: String,
    pub transformer: TransformerResult,
    pub protection: ProtectionResult,
    pub cables: CableResult,
    pub emf_mv: EmfResult,
    pub emf_lv: EmfResult,
    pub short_circuit: ShortCircuitResult,
    /// Selected LV cable withstands the LV let-through energy
    pub lv_cable_withstands: bool,
    pub coordination: CoordinationReport,
    pub harmonics: HarmonicsResult,
    pub economics: EconomicsResult,
    pub neutral: NeutralResult,
    pub construction: ConstructionResult,
}

/// Size a substation end to end.
pub fn calculate(input: &SubstationInput, config: &CabinaConfig) -> CalcResult<SubstationResult> {
    input.validate()?;
    config.validate()?;
    let network = &config.network;
    let policy = &config.coordination;

    let transformer = transformer::calculate(&input.load, network)?;
    debug!(
        required_kva = transformer.required_kva,
        selected_kva = transformer.selected_kva,
        "transformer selected"
    );
    let i_mv = transformer.mv_nominal_current_a;
    let i_lv = transformer.lv_nominal_current_a;

    let protection = protection::calculate(
        &ProtectionInput {
            label: input.label.clone(),
            mv_nominal_current_a: i_mv,
            lv_nominal_current_a: i_lv,
            lv_fault_current_a: transformer.lv_fault_current_a,
        },
        network,
    )?;

    let cables = cables::calculate(
        &CableInput {
            label: input.label.clone(),
            mv_current_a: i_mv,
            lv_current_a: i_lv,
            run: input.cables.clone(),
        },
        network,
    )?;
    debug!(
        mv_section_mm2 = cables.mv.section_mm2,
        lv_section_mm2 = cables.lv.section_mm2,
        "cables selected"
    );

    let emf_mv = emf::calculate(&EmfInput {
        label: input.label.clone(),
        current_a: i_mv,
        section_mm2: cables.mv.section_mm2,
        voltage: CableVoltage::Mv,
    })?;
    let emf_lv = emf::calculate(&EmfInput {
        label: input.label.clone(),
        current_a: i_lv,
        section_mm2: cables.lv.section_mm2,
        voltage: CableVoltage::Lv,
    })?;

    let short_circuit = short_circuit::calculate(
        &ShortCircuitInput {
            label: input.label.clone(),
            transformer_kva: transformer.selected_kva,
            mv_cable_length_m: input.cables.mv_length_m,
            mv_cable_section_mm2: cables.mv.section_mm2,
        },
        network,
    )?;
    let lv_fault_a = short_circuit.lv.symmetrical_a.value();
    let lv_cable_withstands = f64::from(cables.lv.section_mm2) >= short_circuit.lv.min_section_mm2;

    let coordination = selectivity::evaluate(
        &CoordinationInput {
            label: input.label.clone(),
            mv_nominal_current_a: i_mv,
            lv_nominal_current_a: i_lv,
            lv_fault_current_a: lv_fault_a,
            relay: ProtectionSetting::derive(i_mv, lv_fault_a, network.voltage_ratio(), &policy.relay)?,
            breaker: BreakerSetting::from_rating(protection.lv.main_breaker_a, &policy.breaker),
            voltage_ratio: network.voltage_ratio(),
        },
        policy,
    )?;

    let harmonics = harmonics::calculate(&HarmonicsInput {
        label: input.label.clone(),
        transformer_kva: transformer.selected_kva,
        lv_current_a: i_lv,
        load_profile: input.load_profile,
    })?;
    let economics = economics::calculate(&EconomicsInput::from_results(
        input.label.clone(),
        &transformer,
        &cables,
        &input.cables,
        input.economics.clone(),
    ))?;
    let neutral = neutral::calculate(&NeutralInput {
        label: input.label.clone(),
        occupancy: input.occupancy,
    })?;
    let construction = construction::calculate(&ConstructionInput {
        label: input.label.clone(),
        transformer_kva: transformer.selected_kva,
    })?;

    info!(
        label = %input.label,
        kva = transformer.selected_kva,
        lv_fault_ka = short_circuit.lv.symmetrical_ka.value(),
        rating = %coordination.rating,
        "substation sized"
    );

    Ok(SubstationResult {
        label: input.label.clone(),
        transformer,
        protection,
        cables,
        emf_mv,
        emf_lv,
        short_circuit,
        lv_cable_withstands,
        coordination,
        harmonics,
        economics,
        neutral,
        construction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::selectivity::{Classification, CoordinationRating, MvStage};

    fn result_500kw() -> SubstationResult {
        calculate(&SubstationInput::for_load("Cabina 1", 500.0), &CabinaConfig::default()).unwrap()
    }

    #[test]
    fn test_pipeline_selections() {
        let r = result_500kw();
        assert_eq!(r.transformer.selected_kva, 500);
        assert_eq!(r.protection.mv.breaker_rating_a, 630.0);
        assert_eq!(r.protection.lv.main_breaker_a, 800.0);
        assert_eq!(r.cables.mv.section_mm2, 35);
        assert_eq!(r.cables.lv.section_mm2, 630);
        assert_eq!(r.short_circuit.mv_cable_section_mm2, 35);
        assert!(r.lv_cable_withstands);
    }

    #[test]
    fn test_pipeline_uses_impedance_fault_current() {
        let r = result_500kw();
        // grid and cable impedance lower the fault below the infinite-bus value
        assert!((r.coordination.lv_fault_current_a - 17_181.96).abs() < 0.05);
        assert!(r.coordination.lv_fault_current_a < r.transformer.lv_fault_current_a);
    }

    #[test]
    fn test_pipeline_coordination() {
        let r = result_500kw();
        let c = &r.coordination;
        assert_eq!(c.points_evaluated, 7);
        assert_eq!(c.points[0].classification, Classification::NeitherTrips);
        assert_eq!(c.points[1].classification, Classification::BreakerOnly);
        assert_eq!(c.satisfactory_count, 6);
        assert_eq!(c.rating, CoordinationRating::Excellent);
        assert!(c.issues.is_empty());
        let last = c.points.last().unwrap();
        assert_eq!(last.mv_stage, MvStage::Instantaneous);
        assert_eq!(c.relay.instantaneous_delay_s, 0.3);
        assert!((c.relay.overcurrent_pickup_a - 43.3013).abs() < 1e-3);
    }

    #[test]
    fn test_pipeline_respects_policy_override() {
        let mut config = CabinaConfig::default();
        config.coordination.relay.tms = 0.1;
        let input = SubstationInput::for_load("Cabina 1", 500.0);
        let tuned = calculate(&input, &config).unwrap();
        let baseline = result_500kw();
        assert_eq!(tuned.coordination.relay.tms, 0.1);
        assert_ne!(tuned.coordination, baseline.coordination);
    }

    #[test]
    fn test_pipeline_supplementary_checks() {
        let r = result_500kw();
        assert_eq!(r.harmonics.load_profile, LoadProfile::Mixed);
        assert!((r.harmonics.fundamental_a - 721.6878).abs() < 1e-3);
        assert_eq!(r.neutral.system, neutral::EarthingSystem::TnS);
        assert_eq!(r.construction.user_room_area_m2, 20.0);

        // 60 000 + 24 000 + 18 000 + 3750 + 18 000 + 48 000 + 15 300
        assert!((r.economics.capex.total - 187_050.0).abs() < 1e-6);
        assert!((r.economics.losses.cables_kw - r.cables.total_losses_kw * 0.36).abs() < 1e-9);
        assert!((r.economics.opex.losses - 4786.93).abs() < 0.01);
        assert_eq!(r.economics.rates.service_life_years, 25);
    }

    #[test]
    fn test_pipeline_load_profile_and_rates() {
        let mut input = SubstationInput::for_load("Cabina DC", 500.0);
        input.load_profile = LoadProfile::DataCenter;
        input.occupancy = Occupancy::Civil;
        input.economics.energy_price_per_kwh = 0.40;
        let r = calculate(&input, &CabinaConfig::default()).unwrap();
        assert_eq!(r.harmonics.transformer_derating_factor, 0.9);
        assert_eq!(r.neutral.system, neutral::EarthingSystem::Tt);
        assert!((r.economics.opex.losses - 2.0 * 4786.93).abs() < 0.02);

        input.economics.service_life_years = 0;
        assert!(calculate(&input, &CabinaConfig::default()).is_err());
    }

    #[test]
    fn test_pipeline_rejects_oversized_load() {
        let err = calculate(&SubstationInput::for_load("big", 10_000.0), &CabinaConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "RATING_NOT_FOUND");
    }

    #[test]
    fn test_input_json_defaults() {
        let input: SubstationInput = serde_json::from_str(r#"{"load": {"load_kw": 500.0}}"#).unwrap();
        assert_eq!(input.cables, CableRun::default());
        assert!(calculate(&input, &CabinaConfig::default()).is_ok());
    }
}

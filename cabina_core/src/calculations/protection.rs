//! # Protection Sizing
//!
//! Selects the MV general protection (circuit breaker, CTs, relay settings,
//! surge arresters, insulation level) and the LV main breaker from the
//! transformer currents.
//!
//! ## Sizing rules
//!
//! | Device              | Rule                                             |
//! |---------------------|--------------------------------------------------|
//! | MV breaker          | first rating ≥ 5 × I_mv                          |
//! | Protection CT       | first primary ≥ 1.5 × I_mv, `/5A 5P20`           |
//! | LV main breaker     | first rating ≥ 1.1 × I_lv                        |
//! | Breaking capacity   | first standard Icu strictly above the LV fault   |
//! | Residual device     | 300 mA up to 630 A, 500 mA above                 |
//!
//! Requests above the largest catalog rating fail with
//! [`CalcError::RatingNotFound`](crate::errors::CalcError::RatingNotFound).

use serde::{Deserialize, Serialize};

use crate::catalog::{self, devices};
use crate::config::NetworkSettings;
use crate::errors::{require_positive, CalcError, CalcResult};
use crate::units::{Amperes, KiloAmperes, KiloVolts, Volts};

pub const MV_BREAKER_FACTOR: f64 = 5.0;
pub const CT_PRIMARY_FACTOR: f64 = 1.5;
pub const LV_BREAKER_FACTOR: f64 = 1.1;
/// Rated short-time withstand of the MV breaker (kA, 1 s)
pub const MV_BREAKER_SHORT_TIME_KA: f64 = 16.0;
/// Arrester protection level as a fraction of the equipment BIL
pub const ARRESTER_PROTECTION_RATIO: f64 = 0.8;
pub const ARRESTER_DISCHARGE_KA: f64 = 10.0;
/// Specific energy of class 2 distribution arresters (kJ/kV of U_c)
pub const ARRESTER_ENERGY_KJ_PER_KV: f64 = 4.5;

/// Input parameters for protection sizing.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "TR1",
///   "mv_nominal_current_a": 14.43,
///   "lv_nominal_current_a": 721.69,
///   "lv_fault_current_a": 18042.2
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionInput {
    #[serde(default)]
    pub label: String,
    pub mv_nominal_current_a: f64,
    pub lv_nominal_current_a: f64,
    /// Prospective LV fault current used for the breaking capacity (A)
    pub lv_fault_current_a: f64,
}

impl ProtectionInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("mv_nominal_current_a", self.mv_nominal_current_a)?;
        require_positive("lv_nominal_current_a", self.lv_nominal_current_a)?;
        require_positive("lv_fault_current_a", self.lv_fault_current_a)?;
        Ok(())
    }
}

/// One row of the MV relay setting table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayFunction {
    /// ANSI device number, e.g. "51N"
    pub ansi: String,
    pub description: String,
    /// Pickup value in `unit`
    pub pickup: f64,
    pub unit: String,
    /// Definite delay, when the function has one (s)
    pub delay_s: Option<f64>,
}

impl RelayFunction {
    fn new(ansi: &str, description: &str, pickup: f64, unit: &str, delay_s: Option<f64>) -> Self {
        RelayFunction {
            ansi: ansi.to_string(),
            description: description.to_string(),
            pickup,
            unit: unit.to_string(),
            delay_s,
        }
    }
}

/// Standard MV relay settings for a transformer feeder.
pub fn relay_setting_table(mv_nominal_current_a: f64, network: &NetworkSettings) -> Vec<RelayFunction> {
    let un_kv = KiloVolts::from(network.mv_voltage()).value();
    vec![
        RelayFunction::new("50", "Phase overcurrent, instantaneous", 20.0 * mv_nominal_current_a, "A", None),
        RelayFunction::new("51", "Phase overcurrent, time-delayed", 1.25 * mv_nominal_current_a, "A", Some(0.4)),
        RelayFunction::new("50N", "Earth fault, instantaneous", 2.0, "A", None),
        RelayFunction::new("51N", "Earth fault, time-delayed", 1.0, "A", Some(0.2)),
        RelayFunction::new("27", "Undervoltage", 0.85 * un_kv, "kV", None),
        RelayFunction::new("59", "Overvoltage", 1.1 * un_kv, "kV", None),
    ]
}

/// MV surge arrester data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgeArrester {
    /// Continuous operating voltage U_c (kV)
    pub continuous_voltage_kv: KiloVolts,
    /// Protection level U_p (kV peak)
    pub protection_level_kv: KiloVolts,
    pub discharge_current_ka: KiloAmperes,
    pub energy_kj_per_kv: f64,
}

impl SurgeArrester {
    /// Size the arrester for the network; `bil_kv` is the equipment impulse level.
    pub fn for_network(network: &NetworkSettings, bil_kv: f64) -> Self {
        // nominal voltage to the nearest 0.1 kV
        let un_decikv = (KiloVolts::from(network.mv_voltage()).value() * 10.0).round() as i64;
        let continuous_voltage_kv = match un_decikv {
            200 => 12.0,
            150 => 9.6,
            _ => 0.87 * KiloVolts::from(Volts(network.mv_max_voltage_v)).value(),
        };
        SurgeArrester {
            continuous_voltage_kv: KiloVolts(continuous_voltage_kv),
            protection_level_kv: KiloVolts(bil_kv * ARRESTER_PROTECTION_RATIO),
            discharge_current_ka: KiloAmperes(ARRESTER_DISCHARGE_KA),
            energy_kj_per_kv: ARRESTER_ENERGY_KJ_PER_KV,
        }
    }
}

/// Insulation coordination of the MV switchgear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsulationLevel {
    pub max_voltage_kv: KiloVolts,
    /// Power-frequency withstand, 1 min (kV rms)
    pub power_frequency_kv: KiloVolts,
    /// Lightning impulse withstand, BIL (kV peak)
    pub impulse_kv: KiloVolts,
    /// Rated short-time current of the MV grid (kA, 1 s)
    pub short_time_current_ka: KiloAmperes,
    /// I²t over 1 s (kA²s)
    pub thermal_stress_ka2s: f64,
    /// Making capacity, 2.5 × I_k (kA peak)
    pub peak_withstand_ka: KiloAmperes,
}

impl InsulationLevel {
    /// Smallest standard level whose U_m covers the network.
    pub fn for_network(network: &NetworkSettings) -> CalcResult<Self> {
        let um_kv = KiloVolts::from(Volts(network.mv_max_voltage_v)).value();
        let &(level_um, ud, up) = devices::INSULATION_LEVELS
            .iter()
            .find(|(um, _, _)| *um >= um_kv)
            .ok_or_else(|| CalcError::rating_not_found("insulation level", format!("U_m {:.1} kV", um_kv)))?;
        let ik = KiloAmperes::from(Amperes(network.grid_fault_current_a));
        Ok(InsulationLevel {
            max_voltage_kv: KiloVolts(level_um),
            power_frequency_kv: KiloVolts(ud),
            impulse_kv: KiloVolts(up),
            short_time_current_ka: ik,
            thermal_stress_ka2s: ik.value() * ik.value(),
            peak_withstand_ka: ik * 2.5,
        })
    }
}

/// MV side protection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvProtection {
    pub breaker_rating_a: f64,
    pub breaker_short_time_ka: f64,
    pub ct_primary_a: f64,
    /// e.g. "30/5A 5P20"
    pub ct_designation: String,
    /// e.g. "20000/100V cl.0.5"
    pub vt_designation: String,
    pub relay_settings: Vec<RelayFunction>,
    pub surge_arrester: SurgeArrester,
    pub insulation: InsulationLevel,
}

/// LV side protection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LvProtection {
    pub main_breaker_a: f64,
    pub breaking_capacity_ka: f64,
    pub residual_sensitivity_ma: u32,
    pub lv_fault_current_ka: f64,
}

/// Results of protection sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionResult {
    pub mv: MvProtection,
    pub lv: LvProtection,
}

/// First standard Icu (kA) strictly above the prospective fault current.
pub fn breaking_capacity_ka(lv_fault_current_a: f64) -> CalcResult<f64> {
    let fault_ka = KiloAmperes::from(Amperes(lv_fault_current_a)).value();
    devices::BREAKING_CAPACITIES_KA
        .iter()
        .copied()
        .find(|&icu| icu > fault_ka)
        .ok_or_else(|| CalcError::rating_not_found("breaking capacity", format!("{:.1} kA", fault_ka)))
}

/// Size MV and LV protection.
pub fn calculate(input: &ProtectionInput, network: &NetworkSettings) -> CalcResult<ProtectionResult> {
    input.validate()?;
    network.validate()?;

    let i_mv = input.mv_nominal_current_a;
    let breaker_rating_a =
        catalog::first_at_least(&devices::MV_BREAKER_RATINGS_A, i_mv * MV_BREAKER_FACTOR, "MV breaker")?;
    let ct_primary_a = catalog::first_at_least(&devices::CT_PRIMARIES_A, i_mv * CT_PRIMARY_FACTOR, "CT primary")?;
    let insulation = InsulationLevel::for_network(network)?;

    let mv = MvProtection {
        breaker_rating_a,
        breaker_short_time_ka: MV_BREAKER_SHORT_TIME_KA,
        ct_primary_a,
        ct_designation: format!("{:.0}/{:.0}A 5P20", ct_primary_a, devices::CT_SECONDARY_A),
        vt_designation: format!("{:.0}/100V cl.0.5", network.mv_voltage_v),
        relay_settings: relay_setting_table(i_mv, network),
        surge_arrester: SurgeArrester::for_network(network, insulation.impulse_kv.value()),
        insulation,
    };

    let main_breaker_a = catalog::first_at_least(
        &devices::LV_BREAKER_RATINGS_A,
        input.lv_nominal_current_a * LV_BREAKER_FACTOR,
        "LV breaker",
    )?;
    let lv = LvProtection {
        main_breaker_a,
        breaking_capacity_ka: breaking_capacity_ka(input.lv_fault_current_a)?,
        residual_sensitivity_ma: if main_breaker_a <= 630.0 { 300 } else { 500 },
        lv_fault_current_ka: input.lv_fault_current_a / 1000.0,
    };

    Ok(ProtectionResult { mv, lv })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_500kva() -> ProtectionInput {
        ProtectionInput {
            label: "TR1".to_string(),
            mv_nominal_current_a: 14.4338,
            lv_nominal_current_a: 721.6878,
            lv_fault_current_a: 18_042.2,
        }
    }

    #[test]
    fn test_mv_side_500kva() {
        let result = calculate(&input_500kva(), &NetworkSettings::default()).unwrap();
        assert_eq!(result.mv.breaker_rating_a, 630.0);
        // 1.5 × 14.43 = 21.65 -> 25 A
        assert_eq!(result.mv.ct_primary_a, 25.0);
        assert_eq!(result.mv.ct_designation, "25/5A 5P20");
        assert_eq!(result.mv.vt_designation, "20000/100V cl.0.5");
    }

    #[test]
    fn test_lv_side_500kva() {
        let result = calculate(&input_500kva(), &NetworkSettings::default()).unwrap();
        // 1.1 × 721.7 = 793.9 -> 800 A
        assert_eq!(result.lv.main_breaker_a, 800.0);
        assert_eq!(result.lv.breaking_capacity_ka, 25.0);
        assert_eq!(result.lv.residual_sensitivity_ma, 500);
    }

    #[test]
    fn test_small_breaker_uses_300ma() {
        let input = ProtectionInput {
            lv_nominal_current_a: 500.0,
            ..input_500kva()
        };
        let result = calculate(&input, &NetworkSettings::default()).unwrap();
        assert_eq!(result.lv.main_breaker_a, 630.0);
        assert_eq!(result.lv.residual_sensitivity_ma, 300);
    }

    #[test]
    fn test_breaking_capacity_is_strictly_above() {
        assert_eq!(breaking_capacity_ka(24_999.0).unwrap(), 25.0);
        assert_eq!(breaking_capacity_ka(25_000.0).unwrap(), 35.0);
        assert_eq!(breaking_capacity_ka(60_000.0).unwrap(), 65.0);
        assert!(breaking_capacity_ka(100_000.0).is_err());
    }

    #[test]
    fn test_relay_table() {
        let table = relay_setting_table(14.4338, &NetworkSettings::default());
        let codes: Vec<&str> = table.iter().map(|f| f.ansi.as_str()).collect();
        assert_eq!(codes, ["50", "51", "50N", "51N", "27", "59"]);
        assert!((table[0].pickup - 288.676).abs() < 1e-3);
        assert_eq!(table[1].delay_s, Some(0.4));
        assert!((table[4].pickup - 17.0).abs() < 1e-9);
        assert!((table[5].pickup - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_surge_arrester() {
        let network = NetworkSettings::default();
        let arrester = SurgeArrester::for_network(&network, 125.0);
        assert_eq!(arrester.continuous_voltage_kv, KiloVolts(12.0));
        assert_eq!(arrester.protection_level_kv, KiloVolts(100.0));

        let network = NetworkSettings {
            mv_voltage_v: 15_000.0,
            mv_max_voltage_v: 17_500.0,
            ..NetworkSettings::default()
        };
        assert_eq!(SurgeArrester::for_network(&network, 95.0).continuous_voltage_kv, KiloVolts(9.6));

        let network = NetworkSettings {
            mv_voltage_v: 10_000.0,
            mv_max_voltage_v: 12_000.0,
            ..NetworkSettings::default()
        };
        let uc = SurgeArrester::for_network(&network, 75.0).continuous_voltage_kv.value();
        assert!((uc - 10.44).abs() < 1e-9);
    }

    #[test]
    fn test_surge_arrester_tolerates_config_rounding() {
        let network = NetworkSettings {
            mv_voltage_v: 19_999.999,
            ..NetworkSettings::default()
        };
        assert_eq!(SurgeArrester::for_network(&network, 125.0).continuous_voltage_kv, KiloVolts(12.0));

        let network = NetworkSettings {
            mv_voltage_v: 15_000.2,
            mv_max_voltage_v: 17_500.0,
            ..NetworkSettings::default()
        };
        assert_eq!(SurgeArrester::for_network(&network, 95.0).continuous_voltage_kv, KiloVolts(9.6));
    }

    #[test]
    fn test_insulation_level_24kv() {
        let level = InsulationLevel::for_network(&NetworkSettings::default()).unwrap();
        assert_eq!(level.impulse_kv, KiloVolts(125.0));
        assert_eq!(level.power_frequency_kv, KiloVolts(50.0));
        assert_eq!(level.short_time_current_ka, KiloAmperes(12.5));
        assert_eq!(level.thermal_stress_ka2s, 156.25);
        assert_eq!(level.peak_withstand_ka, KiloAmperes(31.25));
    }

    #[test]
    fn test_large_transformer_exceeds_ct_catalog() {
        let input = ProtectionInput {
            mv_nominal_current_a: 600.0,
            ..input_500kva()
        };
        let err = calculate(&input, &NetworkSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "RATING_NOT_FOUND");
    }
}

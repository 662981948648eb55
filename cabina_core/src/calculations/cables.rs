//! # Cable Sizing
//!
//! Selects the MV feeder and LV busbar cables. A section qualifies when its
//! derated ampacity carries the design current and its voltage drop stays
//! under the limit:
//!
//! ```text
//! I_z  = I_base × k_temp × k_group × k_install
//! ΔV % = √3 × I × (R cos φ + X sin φ) × 100 / V
//! P    = 3 × I² × R
//! ```
//!
//! When no section qualifies the largest one is reported with the failing
//! checks flagged instead of returning an error.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::cables::{self as catalog, CableSpec, CableVoltage, InstallationMethod};
use crate::config::NetworkSettings;
use crate::errors::{require_positive, CalcError, CalcResult};

/// Design current as a multiple of the MV nominal current
pub const MV_DESIGN_FACTOR: f64 = 1.3;
/// Design current as a multiple of the LV nominal current
pub const LV_DESIGN_FACTOR: f64 = 1.1;
pub const MV_DROP_LIMIT_PERCENT: f64 = 0.5;
pub const LV_DROP_LIMIT_PERCENT: f64 = 4.0;
/// Power factor assumed for the voltage-drop check
pub const DROP_POWER_FACTOR: f64 = 0.85;

/// Input parameters for cable sizing.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "TR1",
///   "mv_current_a": 14.43,
///   "lv_current_a": 721.69,
///   "run": {
///     "mv_length_m": 50.0,
///     "lv_length_m": 30.0,
///     "ambient_c": 35.0,
///     "installation": "cable_tray",
///     "mv_circuits": 1,
///     "lv_circuits": 1
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableInput {
    #[serde(default)]
    pub label: String,
    /// MV nominal current (A)
    pub mv_current_a: f64,
    /// LV nominal current (A)
    pub lv_current_a: f64,
    #[serde(default)]
    pub run: CableRun,
}

/// Route and laying conditions shared by the MV and LV runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CableRun {
    pub mv_length_m: f64,
    pub lv_length_m: f64,
    pub ambient_c: f64,
    pub installation: InstallationMethod,
    /// Circuits grouped with the MV cable
    pub mv_circuits: u32,
    /// Circuits grouped with the LV cable
    pub lv_circuits: u32,
}

impl Default for CableRun {
    fn default() -> Self {
        CableRun {
            mv_length_m: 50.0,
            lv_length_m: 30.0,
            ambient_c: 35.0,
            installation: InstallationMethod::CableTray,
            mv_circuits: 1,
            lv_circuits: 1,
        }
    }
}

impl CableRun {
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("mv_length_m", self.mv_length_m)?;
        require_positive("lv_length_m", self.lv_length_m)?;
        Ok(())
    }
}

impl CableInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("mv_current_a", self.mv_current_a)?;
        require_positive("lv_current_a", self.lv_current_a)?;
        self.run.validate()
    }
}

/// Correction factors applied to the base ampacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionFactors {
    pub temperature: f64,
    pub mv_grouping: f64,
    pub lv_grouping: f64,
    pub installation: f64,
}

impl CorrectionFactors {
    pub fn for_run(run: &CableRun) -> CalcResult<Self> {
        Ok(CorrectionFactors {
            temperature: catalog::temperature_factor(run.ambient_c)?,
            mv_grouping: catalog::grouping_factor(run.mv_circuits)?,
            lv_grouping: catalog::grouping_factor(run.lv_circuits)?,
            installation: run.installation.factor(),
        })
    }

    /// Combined factor for one voltage class
    pub fn combined(&self, voltage: CableVoltage) -> f64 {
        let grouping = match voltage {
            CableVoltage::Mv => self.mv_grouping,
            CableVoltage::Lv => self.lv_grouping,
        };
        self.temperature * grouping * self.installation
    }
}

/// Selected cable for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableSelection {
    pub voltage: CableVoltage,
    pub section_mm2: u32,
    pub resistance_ohm_per_km: f64,
    pub reactance_ohm_per_km: f64,
    pub design_current_a: f64,
    pub derated_ampacity_a: f64,
    pub voltage_drop_percent: f64,
    pub voltage_drop_limit_percent: f64,
    pub losses_kw: f64,
    pub ampacity_ok: bool,
    pub voltage_drop_ok: bool,
}

impl CableSelection {
    pub fn is_compliant(&self) -> bool {
        self.ampacity_ok && self.voltage_drop_ok
    }
}

/// Results of cable sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableResult {
    pub factors: CorrectionFactors,
    pub mv: CableSelection,
    pub lv: CableSelection,
    pub total_losses_kw: f64,
}

/// Percent voltage drop of a three-phase run.
pub fn voltage_drop_percent(current_a: f64, r_ohm: f64, x_ohm: f64, voltage_v: f64, power_factor: f64) -> f64 {
    let sin_phi = (1.0 - power_factor * power_factor).sqrt();
    3f64.sqrt() * current_a * (r_ohm * power_factor + x_ohm * sin_phi) * 100.0 / voltage_v
}

struct RunSpec {
    voltage: CableVoltage,
    current_a: f64,
    length_m: f64,
    voltage_v: f64,
    design_factor: f64,
    drop_limit_percent: f64,
}

impl RunSpec {
    fn evaluate(&self, cable: &CableSpec, derating: f64) -> CableSelection {
        let design_current_a = self.current_a * self.design_factor;
        let derated_ampacity_a = cable.base_ampacity_a * derating;
        let r = cable.resistance_ohm(self.length_m);
        let x = cable.reactance_ohm(self.length_m);
        let drop = voltage_drop_percent(self.current_a, r, x, self.voltage_v, DROP_POWER_FACTOR);
        CableSelection {
            voltage: self.voltage,
            section_mm2: cable.section_mm2,
            resistance_ohm_per_km: cable.resistance_ohm_per_km,
            reactance_ohm_per_km: cable.reactance_ohm_per_km,
            design_current_a,
            derated_ampacity_a,
            voltage_drop_percent: drop,
            voltage_drop_limit_percent: self.drop_limit_percent,
            losses_kw: 3.0 * self.current_a * self.current_a * r / 1000.0,
            ampacity_ok: derated_ampacity_a >= design_current_a,
            voltage_drop_ok: drop <= self.drop_limit_percent,
        }
    }

    fn select(&self, derating: f64) -> CalcResult<CableSelection> {
        if let Some(found) = catalog::sections(self.voltage)
            .map(|cable| self.evaluate(cable, derating))
            .find(CableSelection::is_compliant)
        {
            return Ok(found);
        }

        let largest = catalog::sections(self.voltage).last().ok_or_else(|| CalcError::Internal {
            message: format!("empty {} cable catalog", self.voltage.code()),
        })?;
        let fallback = self.evaluate(largest, derating);
        warn!(
            voltage = self.voltage.code(),
            section_mm2 = fallback.section_mm2,
            ampacity_ok = fallback.ampacity_ok,
            voltage_drop_ok = fallback.voltage_drop_ok,
            "no cable section satisfies all checks, reporting the largest"
        );
        Ok(fallback)
    }
}

/// Size the MV and LV cables.
pub fn calculate(input: &CableInput, network: &NetworkSettings) -> CalcResult<CableResult> {
    input.validate()?;
    network.validate()?;
    let factors = CorrectionFactors::for_run(&input.run)?;

    let mv = RunSpec {
        voltage: CableVoltage::Mv,
        current_a: input.mv_current_a,
        length_m: input.run.mv_length_m,
        voltage_v: network.mv_voltage_v,
        design_factor: MV_DESIGN_FACTOR,
        drop_limit_percent: MV_DROP_LIMIT_PERCENT,
    }
    .select(factors.combined(CableVoltage::Mv))?;

    let lv = RunSpec {
        voltage: CableVoltage::Lv,
        current_a: input.lv_current_a,
        length_m: input.run.lv_length_m,
        voltage_v: network.lv_voltage_v,
        design_factor: LV_DESIGN_FACTOR,
        drop_limit_percent: LV_DROP_LIMIT_PERCENT,
    }
    .select(factors.combined(CableVoltage::Lv))?;

    Ok(CableResult {
        total_losses_kw: mv.losses_kw + lv.losses_kw,
        factors,
        mv,
        lv,
    })
}

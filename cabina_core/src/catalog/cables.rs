//! Copper cable data (CEI 11-17, CEI 20-13) and ampacity correction factors.
//!
//! Resistance and reactance are per phase, per kilometre. Base ampacity is for
//! a single circuit in free air at 30 °C.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Voltage class of a cable run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CableVoltage {
    /// 12/20 kV class cable
    #[serde(rename = "MV")]
    Mv,
    /// 0.6/1 kV class cable
    #[serde(rename = "LV")]
    Lv,
}

impl CableVoltage {
    pub fn code(&self) -> &'static str {
        match self {
            CableVoltage::Mv => "MV",
            CableVoltage::Lv => "LV",
        }
    }
}

/// Catalog record for one cable cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CableSpec {
    /// Conductor cross-section (mm²)
    pub section_mm2: u32,
    /// Resistance (Ω/km)
    pub resistance_ohm_per_km: f64,
    /// Reactance (Ω/km)
    pub reactance_ohm_per_km: f64,
    /// Base ampacity before correction (A)
    pub base_ampacity_a: f64,
}

impl CableSpec {
    const fn new(section_mm2: u32, r: f64, x: f64, ampacity: f64) -> Self {
        CableSpec {
            section_mm2,
            resistance_ohm_per_km: r,
            reactance_ohm_per_km: x,
            base_ampacity_a: ampacity,
        }
    }

    /// Run resistance for a length in metres (Ω)
    pub fn resistance_ohm(&self, length_m: f64) -> f64 {
        self.resistance_ohm_per_km * length_m / 1000.0
    }

    /// Run reactance for a length in metres (Ω)
    pub fn reactance_ohm(&self, length_m: f64) -> f64 {
        self.reactance_ohm_per_km * length_m / 1000.0
    }
}

const MV_TABLE: [CableSpec; 11] = [
    CableSpec::new(35, 0.868, 0.115, 140.0),
    CableSpec::new(50, 0.641, 0.110, 170.0),
    CableSpec::new(70, 0.443, 0.105, 210.0),
    CableSpec::new(95, 0.320, 0.100, 250.0),
    CableSpec::new(120, 0.253, 0.095, 285.0),
    CableSpec::new(150, 0.206, 0.090, 320.0),
    CableSpec::new(185, 0.164, 0.085, 370.0),
    CableSpec::new(240, 0.125, 0.080, 430.0),
    CableSpec::new(300, 0.100, 0.075, 490.0),
    CableSpec::new(400, 0.075, 0.070, 570.0),
    CableSpec::new(500, 0.060, 0.065, 650.0),
];

const LV_TABLE: [CableSpec; 12] = [
    CableSpec::new(35, 0.641, 0.065, 138.0),
    CableSpec::new(50, 0.443, 0.060, 168.0),
    CableSpec::new(70, 0.320, 0.060, 207.0),
    CableSpec::new(95, 0.236, 0.055, 252.0),
    CableSpec::new(120, 0.188, 0.055, 290.0),
    CableSpec::new(150, 0.150, 0.050, 330.0),
    CableSpec::new(185, 0.123, 0.050, 375.0),
    CableSpec::new(240, 0.094, 0.045, 435.0),
    CableSpec::new(300, 0.075, 0.045, 495.0),
    CableSpec::new(400, 0.057, 0.040, 695.0),
    CableSpec::new(500, 0.045, 0.040, 800.0),
    CableSpec::new(630, 0.036, 0.035, 1500.0),
];

static MV_CABLES: Lazy<BTreeMap<u32, CableSpec>> =
    Lazy::new(|| MV_TABLE.iter().map(|c| (c.section_mm2, *c)).collect());

static LV_CABLES: Lazy<BTreeMap<u32, CableSpec>> =
    Lazy::new(|| LV_TABLE.iter().map(|c| (c.section_mm2, *c)).collect());

fn table(voltage: CableVoltage) -> &'static BTreeMap<u32, CableSpec> {
    match voltage {
        CableVoltage::Mv => &MV_CABLES,
        CableVoltage::Lv => &LV_CABLES,
    }
}

/// All sections for a voltage class, smallest first.
pub fn sections(voltage: CableVoltage) -> impl Iterator<Item = &'static CableSpec> {
    table(voltage).values()
}

/// Look up an exact cross-section.
pub fn lookup(voltage: CableVoltage, section_mm2: u32) -> CalcResult<&'static CableSpec> {
    table(voltage).get(&section_mm2).ok_or_else(|| {
        CalcError::rating_not_found(
            format!("{} cable", voltage.code()),
            format!("{} mm²", section_mm2),
        )
    })
}

/// Cable installation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationMethod {
    /// Free air
    Air,
    /// Buried duct
    Conduit,
    /// Direct burial
    Buried,
    /// Perforated cable tray
    #[default]
    CableTray,
}

impl InstallationMethod {
    pub const ALL: [InstallationMethod; 4] = [
        InstallationMethod::Air,
        InstallationMethod::Conduit,
        InstallationMethod::Buried,
        InstallationMethod::CableTray,
    ];

    /// Installation correction factor
    pub fn factor(&self) -> f64 {
        match self {
            InstallationMethod::Air => 1.0,
            InstallationMethod::Conduit => 0.85,
            InstallationMethod::Buried => 0.80,
            InstallationMethod::CableTray => 0.95,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            InstallationMethod::Air => "air",
            InstallationMethod::Conduit => "conduit",
            InstallationMethod::Buried => "buried",
            InstallationMethod::CableTray => "cable_tray",
        }
    }
}

impl std::str::FromStr for InstallationMethod {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstallationMethod::ALL
            .iter()
            .copied()
            .find(|m| m.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CalcError::invalid_input("installation", s, "Expected air, conduit, buried or cable_tray")
            })
    }
}

/// (°C, factor)
const TEMPERATURE_FACTORS: [(f64, f64); 5] = [(30.0, 1.0), (35.0, 0.96), (40.0, 0.91), (45.0, 0.85), (50.0, 0.78)];

/// (circuits, factor)
const GROUPING_FACTORS: [(u32, f64); 6] = [(1, 1.0), (2, 0.85), (3, 0.75), (4, 0.70), (6, 0.60), (9, 0.55)];

/// Ambient temperature correction factor.
///
/// Temperatures between tabulated points take the factor of the next hotter
/// entry. At or below 30 °C the factor is 1.0.
pub fn temperature_factor(ambient_c: f64) -> CalcResult<f64> {
    if !ambient_c.is_finite() {
        return Err(CalcError::invalid_input("ambient_c", ambient_c.to_string(), "Value must be finite"));
    }
    TEMPERATURE_FACTORS
        .iter()
        .find(|(t, _)| ambient_c <= *t)
        .map(|(_, k)| *k)
        .ok_or_else(|| {
            CalcError::invalid_input("ambient_c", ambient_c.to_string(), "Ambient temperature above 50 °C")
        })
}

/// Grouping correction factor for `circuits` cables laid together.
///
/// Counts between tabulated points take the factor of the next larger group.
pub fn grouping_factor(circuits: u32) -> CalcResult<f64> {
    if circuits == 0 {
        return Err(CalcError::invalid_input("circuits", "0", "At least one circuit is required"));
    }
    GROUPING_FACTORS
        .iter()
        .find(|(n, _)| circuits <= *n)
        .map(|(_, k)| *k)
        .ok_or_else(|| CalcError::invalid_input("circuits", circuits.to_string(), "More than 9 grouped circuits"))
}

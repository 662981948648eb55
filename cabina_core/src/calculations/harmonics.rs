//! # Harmonic Analysis
//!
//! Estimates the LV harmonic content from a typical spectrum per load
//! profile and checks it against the IEC 61000-2-4 / EN 50160 limits.
//!
//! ```text
//! THD_I = √(Σ I_h²) / I_1
//! THD_V ≈ THD_I × z_grid            z_grid = 0.05 pu
//! ΔP_transformer % = THD_I² × 8
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cabina_core::calculations::harmonics::{calculate, HarmonicsInput, LoadProfile, PowerQuality};
//!
//! let input = HarmonicsInput {
//!     label: "TR1".to_string(),
//!     transformer_kva: 500,
//!     lv_current_a: 721.7,
//!     load_profile: LoadProfile::Mixed,
//! };
//! let result = calculate(&input).unwrap();
//! assert!((result.current_thd_percent - 11.15).abs() < 0.01);
//! assert_eq!(result.power_quality, PowerQuality::Good);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{require_positive, CalcError, CalcResult};

/// Grid impedance used to estimate the voltage distortion (pu)
pub const GRID_IMPEDANCE_PU: f64 = 0.05;
/// Voltage THD limit (%)
pub const VOLTAGE_THD_LIMIT_PERCENT: f64 = 8.0;
/// Current THD limit (%)
pub const CURRENT_THD_LIMIT_PERCENT: f64 = 48.0;
/// Above this current THD the transformer is derated
pub const DERATING_THD_PERCENT: f64 = 30.0;
pub const DERATING_FACTOR: f64 = 0.9;

/// Prevailing kind of LV load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadProfile {
    /// Motors, heaters, traditional lighting
    Linear,
    /// Typical industrial mix
    #[default]
    Mixed,
    /// UPS, inverters, LED lighting, drives
    NonLinear,
    /// Servers, UPS, IT equipment
    DataCenter,
}

impl LoadProfile {
    pub const ALL: [LoadProfile; 4] = [
        LoadProfile::Linear,
        LoadProfile::Mixed,
        LoadProfile::NonLinear,
        LoadProfile::DataCenter,
    ];

    /// (harmonic order, current as a fraction of the fundamental)
    pub fn spectrum(&self) -> &'static [(u32, f64)] {
        match self {
            LoadProfile::Linear => &[(3, 0.02), (5, 0.015), (7, 0.01), (9, 0.005), (11, 0.003), (13, 0.002)],
            LoadProfile::Mixed => &[
                (3, 0.08),
                (5, 0.06),
                (7, 0.04),
                (9, 0.02),
                (11, 0.015),
                (13, 0.01),
                (15, 0.008),
                (17, 0.006),
                (19, 0.004),
            ],
            LoadProfile::NonLinear => &[
                (3, 0.15),
                (5, 0.12),
                (7, 0.08),
                (9, 0.05),
                (11, 0.04),
                (13, 0.03),
                (15, 0.02),
                (17, 0.015),
                (19, 0.01),
                (21, 0.008),
                (23, 0.006),
            ],
            LoadProfile::DataCenter => &[
                (3, 0.25),
                (5, 0.18),
                (7, 0.12),
                (9, 0.08),
                (11, 0.06),
                (13, 0.04),
                (15, 0.03),
                (17, 0.02),
                (19, 0.015),
                (21, 0.01),
            ],
        }
    }

    /// Peak-to-RMS ratio of the load current
    pub fn crest_factor(&self) -> f64 {
        match self {
            LoadProfile::Linear => 1.41,
            LoadProfile::Mixed => 1.8,
            LoadProfile::NonLinear => 2.5,
            LoadProfile::DataCenter => 3.0,
        }
    }

    /// LV cable ampacity factor for the harmonic heating
    pub fn cable_factor(&self) -> f64 {
        match self {
            LoadProfile::Linear => 1.0,
            LoadProfile::Mixed => 0.97,
            LoadProfile::NonLinear => 0.93,
            LoadProfile::DataCenter => 0.85,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LoadProfile::Linear => "linear",
            LoadProfile::Mixed => "mixed",
            LoadProfile::NonLinear => "non_linear",
            LoadProfile::DataCenter => "data_center",
        }
    }
}

impl fmt::Display for LoadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LoadProfile {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().replace('-', "_").to_ascii_lowercase();
        LoadProfile::ALL
            .iter()
            .copied()
            .find(|p| p.code() == key)
            .ok_or_else(|| {
                CalcError::invalid_input("load_profile", s, "Expected linear, mixed, non_linear or data_center")
            })
    }
}

/// Overall power-quality assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerQuality {
    Good,
    Acceptable,
    Critical,
}

impl PowerQuality {
    fn assess(voltage_thd_percent: f64, current_thd_percent: f64) -> Self {
        if voltage_thd_percent <= 3.0 && current_thd_percent <= 15.0 {
            PowerQuality::Good
        } else if voltage_thd_percent <= 5.0 && current_thd_percent <= 25.0 {
            PowerQuality::Acceptable
        } else {
            PowerQuality::Critical
        }
    }
}

/// Input parameters for the harmonic analysis.
///
/// ## JSON Example
///
/// ```json
/// { "label": "TR1", "transformer_kva": 500, "lv_current_a": 721.7, "load_profile": "data_center" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicsInput {
    #[serde(default)]
    pub label: String,
    pub transformer_kva: u32,
    /// Fundamental LV current (A)
    pub lv_current_a: f64,
    #[serde(default)]
    pub load_profile: LoadProfile,
}

impl HarmonicsInput {
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("transformer_kva", f64::from(self.transformer_kva))?;
        require_positive("lv_current_a", self.lv_current_a)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicCurrent {
    pub order: u32,
    pub percent: f64,
    pub current_a: f64,
}

/// Results of the harmonic analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicsResult {
    pub load_profile: LoadProfile,
    pub fundamental_a: f64,
    pub harmonics: Vec<HarmonicCurrent>,
    pub current_thd_percent: f64,
    pub voltage_thd_percent: f64,
    pub crest_factor: f64,
    pub voltage_thd_ok: bool,
    pub current_thd_ok: bool,
    /// Extra transformer losses (% of rated load losses)
    pub additional_losses_percent: f64,
    pub third_harmonic_percent: f64,
    /// Neutral section as a multiple of the phase section
    pub neutral_oversize_factor: f64,
    pub transformer_derating_factor: f64,
    pub derated_kva: f64,
    pub cable_derating_factor: f64,
    pub power_quality: PowerQuality,
    pub recommendations: Vec<String>,
}

/// Run the harmonic analysis.
pub fn calculate(input: &HarmonicsInput) -> CalcResult<HarmonicsResult> {
    input.validate()?;
    let profile = input.load_profile;
    let spectrum = profile.spectrum();

    let harmonics: Vec<HarmonicCurrent> = spectrum
        .iter()
        .map(|&(order, share)| HarmonicCurrent {
            order,
            percent: share * 100.0,
            current_a: input.lv_current_a * share,
        })
        .collect();

    let current_thd_percent = spectrum.iter().map(|(_, s)| s * s).sum::<f64>().sqrt() * 100.0;
    let voltage_thd_percent = current_thd_percent * GRID_IMPEDANCE_PU;
    let crest_factor = profile.crest_factor();
    let third_harmonic_percent = spectrum
        .iter()
        .find(|(order, _)| *order == 3)
        .map_or(0.0, |(_, s)| s * 100.0);
    let neutral_oversize_factor = if third_harmonic_percent > 33.0 {
        2.0
    } else if third_harmonic_percent > 25.0 {
        1.5
    } else {
        1.0
    };
    let transformer_derating_factor = if current_thd_percent > DERATING_THD_PERCENT {
        DERATING_FACTOR
    } else {
        1.0
    };

    let mut recommendations = Vec::new();
    if current_thd_percent > DERATING_THD_PERCENT {
        recommendations.push("Install active or passive harmonic filters".to_string());
        recommendations.push(format!(
            "Derate the transformer to {:.0} % of its rating",
            transformer_derating_factor * 100.0
        ));
    }
    if third_harmonic_percent > 15.0 {
        recommendations.push(format!(
            "Oversize the neutral conductor (third harmonic {:.0} %)",
            third_harmonic_percent
        ));
    }
    if crest_factor > 2.0 {
        recommendations.push("Check breaker ratings for the high crest factor".to_string());
    }
    if voltage_thd_percent > 5.0 {
        recommendations.push("Monitor power quality continuously".to_string());
    }
    match profile {
        LoadProfile::DataCenter => {
            recommendations.push("Transformer with K-factor 13 or higher for IT loads".to_string());
            recommendations.push("IGBT-based UPS to reduce harmonic emission".to_string());
        }
        LoadProfile::NonLinear => {
            recommendations.push("Transformer with K-factor 9 or higher".to_string());
            recommendations.push("Blocking reactors for high-order harmonics".to_string());
        }
        LoadProfile::Linear | LoadProfile::Mixed => {}
    }

    Ok(HarmonicsResult {
        load_profile: profile,
        fundamental_a: input.lv_current_a,
        harmonics,
        current_thd_percent,
        voltage_thd_percent,
        crest_factor,
        voltage_thd_ok: voltage_thd_percent <= VOLTAGE_THD_LIMIT_PERCENT,
        current_thd_ok: current_thd_percent <= CURRENT_THD_LIMIT_PERCENT,
        additional_losses_percent: (current_thd_percent / 100.0).powi(2) * 8.0,
        third_harmonic_percent,
        neutral_oversize_factor,
        transformer_derating_factor,
        derated_kva: f64::from(input.transformer_kva) * transformer_derating_factor,
        cable_derating_factor: profile.cable_factor(),
        power_quality: PowerQuality::assess(voltage_thd_percent, current_thd_percent),
        recommendations,
    })
}

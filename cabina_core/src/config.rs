//! # Configuration
//!
//! Network data and the coordination policy, bundled as [`CabinaConfig`].
//! Every field has a serde default equal to the canonical parameter set, so a
//! config file only needs to list what it overrides.
//!
//! ## TOML Example
//!
//! ```rust
//! use cabina_core::config::CabinaConfig;
//!
//! let config = CabinaConfig::from_toml_str(r#"
//!     [network]
//!     mv_voltage_v = 15000.0
//!
//!     [coordination.margins]
//!     overload_margin_s = 0.4
//! "#).unwrap();
//!
//! assert_eq!(config.network.mv_voltage_v, 15000.0);
//! assert_eq!(config.network.lv_voltage_v, 400.0);
//! assert_eq!(config.coordination.margins.overload_margin_s, 0.4);
//! ```

use serde::{Deserialize, Serialize};

use crate::calculations::selectivity::CoordinationPolicy;
use crate::errors::{require_positive, CalcError, CalcResult};
use crate::units::Volts;

/// Supply network data shared by every calculation of a study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Nominal MV line-to-line voltage (V)
    pub mv_voltage_v: f64,

    /// Nominal LV line-to-line voltage (V)
    pub lv_voltage_v: f64,

    /// Highest voltage for equipment on the MV side, U_m (V)
    pub mv_max_voltage_v: f64,

    /// Short-circuit power of the distributor's MV grid (MVA)
    pub grid_short_circuit_mva: f64,

    /// Rated short-time withstand current of MV switchgear (A)
    pub grid_fault_current_a: f64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        NetworkSettings {
            mv_voltage_v: 20_000.0,
            lv_voltage_v: 400.0,
            mv_max_voltage_v: 24_000.0,
            grid_short_circuit_mva: 250.0,
            grid_fault_current_a: 12_500.0,
        }
    }
}

impl NetworkSettings {
    /// Validate network data.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("mv_voltage_v", self.mv_voltage_v)?;
        require_positive("lv_voltage_v", self.lv_voltage_v)?;
        require_positive("mv_max_voltage_v", self.mv_max_voltage_v)?;
        require_positive("grid_short_circuit_mva", self.grid_short_circuit_mva)?;
        require_positive("grid_fault_current_a", self.grid_fault_current_a)?;
        if self.mv_voltage_v <= self.lv_voltage_v {
            return Err(CalcError::invalid_input(
                "mv_voltage_v",
                self.mv_voltage_v.to_string(),
                "MV voltage must be higher than LV voltage",
            ));
        }
        if self.mv_max_voltage_v < self.mv_voltage_v {
            return Err(CalcError::invalid_input(
                "mv_max_voltage_v",
                self.mv_max_voltage_v.to_string(),
                "U_m cannot be lower than the nominal MV voltage",
            ));
        }
        Ok(())
    }

    /// Nominal transformer voltage ratio (MV / LV), e.g. 20000/400 = 50.
    pub fn voltage_ratio(&self) -> f64 {
        self.mv_voltage_v / self.lv_voltage_v
    }

    pub fn mv_voltage(&self) -> Volts {
        Volts(self.mv_voltage_v)
    }

    pub fn lv_voltage(&self) -> Volts {
        Volts(self.lv_voltage_v)
    }
}

/// Complete configuration: network data plus the coordination policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CabinaConfig {
    pub network: NetworkSettings,
    pub coordination: CoordinationPolicy,
}

impl CabinaConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(source: &str) -> CalcResult<Self> {
        let config: CabinaConfig = toml::from_str(source).map_err(|e| CalcError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(source: &str) -> CalcResult<Self> {
        let config: CabinaConfig =
            serde_json::from_str(source).map_err(|e| CalcError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate both halves of the configuration.
    pub fn validate(&self) -> CalcResult<()> {
        self.network.validate()?;
        self.coordination.validate()
    }
}

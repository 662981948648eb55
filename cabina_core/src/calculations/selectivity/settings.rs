//! Protection device settings: the MV relay (ANSI 50/51) and the LV main breaker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::policy::{BreakerCurvePolicy, RelaySettingPolicy};
use crate::errors::{require_positive, CalcError, CalcResult};

/// IEC 60255-151 inverse-time curve family.
///
/// All three share the form `t = TMS × k / (r^α − 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum CurveFamily {
    #[serde(rename = "normal_inverse")]
    NormalInverse,
    #[serde(rename = "very_inverse")]
    VeryInverse,
    #[serde(rename = "extremely_inverse")]
    ExtremelyInverse,
}

impl CurveFamily {
    pub const ALL: [CurveFamily; 3] = [
        CurveFamily::NormalInverse,
        CurveFamily::VeryInverse,
        CurveFamily::ExtremelyInverse,
    ];

    /// Curve constants (k, α)
    pub fn constants(&self) -> (f64, f64) {
        match self {
            CurveFamily::NormalInverse => (0.14, 0.02),
            CurveFamily::VeryInverse => (13.5, 1.0),
            CurveFamily::ExtremelyInverse => (80.0, 2.0),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CurveFamily::NormalInverse => "normal_inverse",
            CurveFamily::VeryInverse => "very_inverse",
            CurveFamily::ExtremelyInverse => "extremely_inverse",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CurveFamily::NormalInverse => "Normal Inverse (IEC)",
            CurveFamily::VeryInverse => "Very Inverse (IEC)",
            CurveFamily::ExtremelyInverse => "Extremely Inverse (IEC)",
        }
    }
}

impl fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for CurveFamily {
    type Err = CalcError;

    /// Accepts `normal_inverse`, `Normal Inverse`, `normal-inverse`, `NI`,
    /// and the same spellings for very (VI) and extremely (EI) inverse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        match key.as_str() {
            "normal_inverse" | "ni" | "si" | "standard_inverse" => Ok(CurveFamily::NormalInverse),
            "very_inverse" | "vi" => Ok(CurveFamily::VeryInverse),
            "extremely_inverse" | "ei" => Ok(CurveFamily::ExtremelyInverse),
            _ => Err(CalcError::unsupported_curve(s)),
        }
    }
}

impl TryFrom<String> for CurveFamily {
    type Error = CalcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// MV feeder relay settings.
///
/// ## JSON Example
///
/// ```json
/// {
///   "overcurrent_pickup_a": 27.3,
///   "instantaneous_pickup_a": 650.0,
///   "tms": 0.8,
///   "curve": "very_inverse",
///   "instantaneous_delay_s": 0.5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionSetting {
    /// Pickup of the inverse-time overcurrent stage, ANSI 51 (A, MV side)
    pub overcurrent_pickup_a: f64,

    /// Pickup of the instantaneous stage, ANSI 50 (A, MV side)
    pub instantaneous_pickup_a: f64,

    /// Time multiplier setting of the 51 stage
    pub tms: f64,

    /// Time-current curve of the 51 stage
    pub curve: CurveFamily,

    /// Fixed delay of the 50 stage (s)
    pub instantaneous_delay_s: f64,
}

impl ProtectionSetting {
    /// Validate relay settings.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("relay.overcurrent_pickup_a", self.overcurrent_pickup_a)?;
        require_positive("relay.instantaneous_pickup_a", self.instantaneous_pickup_a)?;
        require_positive("relay.tms", self.tms)?;
        require_positive("relay.instantaneous_delay_s", self.instantaneous_delay_s)?;
        Ok(())
    }

    /// Derive relay settings from the substation currents.
    ///
    /// The 51 stage picks up at a multiple of the MV nominal current; the 50
    /// stage at a fraction of the LV bolted fault current referred to the MV side.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cabina_core::calculations::selectivity::{ProtectionSetting, RelaySettingPolicy};
    ///
    /// let relay = ProtectionSetting::derive(18.2, 25_000.0, 50.0, &RelaySettingPolicy::default()).unwrap();
    /// assert!((relay.overcurrent_pickup_a - 54.6).abs() < 1e-9);
    /// assert!((relay.instantaneous_pickup_a - 400.0).abs() < 1e-9);
    /// ```
    pub fn derive(
        mv_nominal_current_a: f64,
        lv_fault_current_a: f64,
        voltage_ratio: f64,
        policy: &RelaySettingPolicy,
    ) -> CalcResult<Self> {
        require_positive("mv_nominal_current_a", mv_nominal_current_a)?;
        require_positive("lv_fault_current_a", lv_fault_current_a)?;
        require_positive("voltage_ratio", voltage_ratio)?;

        let setting = ProtectionSetting {
            overcurrent_pickup_a: mv_nominal_current_a * policy.overcurrent_pickup_factor,
            instantaneous_pickup_a: lv_fault_current_a * policy.instantaneous_fault_fraction / voltage_ratio,
            tms: policy.tms,
            curve: policy.curve,
            instantaneous_delay_s: policy.instantaneous_delay_s,
        };
        setting.validate()?;
        Ok(setting)
    }
}

/// LV main breaker settings (thermal-magnetic or electronic trip unit).
///
/// ## JSON Example
///
/// ```json
/// {
///   "rated_current_a": 1000.0,
///   "magnetic_multiplier": 10.0,
///   "thermal_multiplier": 1.45
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerSetting {
    /// Rated current In (A)
    pub rated_current_a: f64,

    /// Magnetic (instantaneous) threshold as a multiple of In
    pub magnetic_multiplier: f64,

    /// Conventional thermal tripping threshold as a multiple of In
    pub thermal_multiplier: f64,
}

impl BreakerSetting {
    /// Build breaker settings from a rating and the policy multipliers.
    pub fn from_rating(rated_current_a: f64, policy: &BreakerCurvePolicy) -> Self {
        BreakerSetting {
            rated_current_a,
            magnetic_multiplier: policy.magnetic_multiplier,
            thermal_multiplier: policy.thermal_multiplier,
        }
    }

    /// Validate breaker settings.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("breaker.rated_current_a", self.rated_current_a)?;
        require_positive("breaker.magnetic_multiplier", self.magnetic_multiplier)?;
        require_positive("breaker.thermal_multiplier", self.thermal_multiplier)?;
        if self.thermal_multiplier >= self.magnetic_multiplier {
            return Err(CalcError::invalid_input(
                "breaker.thermal_multiplier",
                self.thermal_multiplier.to_string(),
                "Thermal threshold must be below the magnetic threshold",
            ));
        }
        Ok(())
    }

    /// Magnetic threshold (A)
    pub fn magnetic_threshold_a(&self) -> f64 {
        self.rated_current_a * self.magnetic_multiplier
    }

    /// Thermal threshold (A)
    pub fn thermal_threshold_a(&self) -> f64 {
        self.rated_current_a * self.thermal_multiplier
    }

    /// Current as a multiple of the rated current.
    pub fn ratio(&self, current_a: f64) -> f64 {
        current_a / self.rated_current_a
    }

    /// The thermal element picks up at `current_a`.
    ///
    /// Every pickup decision goes through the ratio, so input validation and
    /// the trip curve agree at the threshold itself.
    pub fn reaches_thermal(&self, current_a: f64) -> bool {
        self.ratio(current_a) >= self.thermal_multiplier
    }

    /// The magnetic element picks up at `current_a`.
    pub fn reaches_magnetic(&self, current_a: f64) -> bool {
        self.ratio(current_a) >= self.magnetic_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_parse_aliases() {
        assert_eq!("very inverse".parse::<CurveFamily>().unwrap(), CurveFamily::VeryInverse);
        assert_eq!("Very-Inverse".parse::<CurveFamily>().unwrap(), CurveFamily::VeryInverse);
        assert_eq!("VI".parse::<CurveFamily>().unwrap(), CurveFamily::VeryInverse);
        assert_eq!("normal_inverse".parse::<CurveFamily>().unwrap(), CurveFamily::NormalInverse);
        assert_eq!("EI".parse::<CurveFamily>().unwrap(), CurveFamily::ExtremelyInverse);
    }

    #[test]
    fn test_curve_parse_unknown_names_family() {
        let err = "long time inverse".parse::<CurveFamily>().unwrap_err();
        assert_eq!(err, CalcError::unsupported_curve("long time inverse"));
    }

    #[test]
    fn test_curve_serde() {
        let json = serde_json::to_string(&CurveFamily::ExtremelyInverse).unwrap();
        assert_eq!(json, "\"extremely_inverse\"");
        let parsed: CurveFamily = serde_json::from_str("\"Normal Inverse\"").unwrap();
        assert_eq!(parsed, CurveFamily::NormalInverse);
        assert!(serde_json::from_str::<CurveFamily>("\"definite_time\"").is_err());
    }

    #[test]
    fn test_curve_code_roundtrip() {
        for family in CurveFamily::ALL {
            assert_eq!(family.code().parse::<CurveFamily>().unwrap(), family);
        }
    }

    #[test]
    fn test_relay_validation() {
        let relay = ProtectionSetting {
            overcurrent_pickup_a: 27.3,
            instantaneous_pickup_a: 650.0,
            tms: 0.8,
            curve: CurveFamily::VeryInverse,
            instantaneous_delay_s: 0.5,
        };
        assert!(relay.validate().is_ok());

        let bad = ProtectionSetting { tms: 0.0, ..relay.clone() };
        assert!(bad.validate().is_err());

        let bad = ProtectionSetting { overcurrent_pickup_a: -1.0, ..relay };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_derive_rejects_zero_ratio() {
        assert!(ProtectionSetting::derive(18.2, 25_000.0, 0.0, &RelaySettingPolicy::default()).is_err());
    }

    #[test]
    fn test_breaker_thresholds() {
        let breaker = BreakerSetting::from_rating(1000.0, &BreakerCurvePolicy::default());
        assert!(breaker.validate().is_ok());
        assert_eq!(breaker.magnetic_threshold_a(), 10_000.0);
        assert_eq!(breaker.thermal_threshold_a(), 1450.0);
        assert!(breaker.reaches_thermal(1450.0));
        assert!(!breaker.reaches_thermal(1449.99));
        assert!(breaker.reaches_magnetic(10_000.0));
    }

    #[test]
    fn test_thermal_pickup_follows_ratio() {
        // 100.37 × 1.45 / 100.37 rounds one step below 1.45
        let breaker = BreakerSetting {
            rated_current_a: 100.37,
            magnetic_multiplier: 10.0,
            thermal_multiplier: 1.45,
        };
        let threshold = breaker.thermal_threshold_a();
        assert!(breaker.ratio(threshold) < 1.45);
        assert!(!breaker.reaches_thermal(threshold));
    }

    #[test]
    fn test_breaker_thermal_above_magnetic_rejected() {
        let breaker = BreakerSetting {
            rated_current_a: 1000.0,
            magnetic_multiplier: 1.2,
            thermal_multiplier: 1.45,
        };
        assert!(breaker.validate().is_err());
    }
}

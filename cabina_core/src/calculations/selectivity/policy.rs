//! # Coordination Policy
//!
//! Every tunable constant of the selectivity evaluation: test-point
//! multipliers, required margins, curve clamps, the LV breaker step table and
//! the defaults used when relay and breaker settings are derived.
//!
//! `Default` yields the canonical parameter set. All structs carry
//! `#[serde(default)]`, so a TOML or JSON override only lists what changes.

use serde::{Deserialize, Serialize};

use super::settings::CurveFamily;
use crate::errors::{require_positive, CalcError, CalcResult};

/// Full parameter set for one coordination evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationPolicy {
    pub test_points: TestPointPolicy,
    pub margins: MarginPolicy,
    pub mv_curve: MvCurvePolicy,
    pub lv_curve: LvCurvePolicy,
    pub relay: RelaySettingPolicy,
    pub breaker: BreakerCurvePolicy,
    pub backup: BackupPolicy,
}

/// Test currents: multiples of the LV nominal current, then fractions of the
/// bolted LV fault current. Points are evaluated in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestPointPolicy {
    pub nominal_multiples: Vec<f64>,
    pub fault_fractions: Vec<f64>,
}

impl Default for TestPointPolicy {
    fn default() -> Self {
        TestPointPolicy {
            nominal_multiples: vec![1.2, 2.0, 5.0, 15.0],
            fault_fractions: vec![0.3, 0.6, 1.0],
        }
    }
}

impl TestPointPolicy {
    /// Expand the multipliers into LV-side test currents (A).
    pub fn currents(&self, lv_nominal_current_a: f64, lv_fault_current_a: f64) -> Vec<f64> {
        self.nominal_multiples
            .iter()
            .map(|m| m * lv_nominal_current_a)
            .chain(self.fault_fractions.iter().map(|f| f * lv_fault_current_a))
            .collect()
    }
}

/// Required margins between the LV and MV trip times, by current band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginPolicy {
    /// Currents at or above this fraction of the fault current are "high"
    pub high_fault_fraction: f64,
    pub high_margin_s: f64,
    /// Currents at or above this multiple of the LV nominal current are "medium"
    pub medium_nominal_multiple: f64,
    pub medium_margin_s: f64,
    /// Everything else (overload region)
    pub overload_margin_s: f64,
    /// Share of the required margin still classified as marginal
    pub marginal_fraction: f64,
}

impl Default for MarginPolicy {
    fn default() -> Self {
        MarginPolicy {
            high_fault_fraction: 0.5,
            high_margin_s: 0.20,
            medium_nominal_multiple: 10.0,
            medium_margin_s: 0.25,
            overload_margin_s: 0.30,
            marginal_fraction: 0.6,
        }
    }
}

impl MarginPolicy {
    /// Required margin for an LV-side test current (s).
    ///
    /// Depends only on where the current falls relative to the two band
    /// boundaries.
    pub fn required_margin_s(&self, current_a: f64, lv_nominal_current_a: f64, lv_fault_current_a: f64) -> f64 {
        if current_a >= self.high_fault_fraction * lv_fault_current_a {
            self.high_margin_s
        } else if current_a >= self.medium_nominal_multiple * lv_nominal_current_a {
            self.medium_margin_s
        } else {
            self.overload_margin_s
        }
    }
}

/// Clamp applied to the inverse-time MV stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MvCurvePolicy {
    pub min_time_s: f64,
    pub max_time_s: f64,
}

impl Default for MvCurvePolicy {
    fn default() -> Self {
        MvCurvePolicy {
            min_time_s: 0.05,
            max_time_s: 300.0,
        }
    }
}

/// One step of the LV thermal region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LvBand {
    /// Applies when `current / rated >= min_ratio`
    pub min_ratio: f64,
    pub time_s: f64,
}

/// LV breaker time-current characteristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LvCurvePolicy {
    /// Trip time at or above the magnetic threshold (s)
    pub magnetic_time_s: f64,
    /// Step table, highest ratio first
    pub bands: Vec<LvBand>,
    /// K in `t = K / r^p` below the lowest band
    pub continuous_constant: f64,
    /// p in `t = K / r^p`
    pub continuous_exponent: f64,
    /// Upper bound on the continuous law (s)
    pub continuous_cap_s: f64,
}

impl Default for LvCurvePolicy {
    fn default() -> Self {
        LvCurvePolicy {
            magnetic_time_s: 0.010,
            bands: vec![
                LvBand { min_ratio: 50.0, time_s: 0.02 },
                LvBand { min_ratio: 20.0, time_s: 0.05 },
                LvBand { min_ratio: 10.0, time_s: 0.1 },
                LvBand { min_ratio: 5.0, time_s: 0.5 },
                LvBand { min_ratio: 2.0, time_s: 10.0 },
            ],
            continuous_constant: 3600.0,
            continuous_exponent: 2.0,
            continuous_cap_s: 3600.0,
        }
    }
}

impl LvCurvePolicy {
    /// Trip time of the continuous law at `ratio` (s)
    pub fn continuous_time_s(&self, ratio: f64) -> f64 {
        (self.continuous_constant / ratio.powf(self.continuous_exponent)).min(self.continuous_cap_s)
    }
}

/// Defaults used by [`ProtectionSetting::derive`](super::ProtectionSetting::derive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettingPolicy {
    /// 51 pickup as a multiple of the MV nominal current
    pub overcurrent_pickup_factor: f64,
    /// 50 pickup as a fraction of the LV fault current (referred to MV)
    pub instantaneous_fault_fraction: f64,
    pub tms: f64,
    pub curve: CurveFamily,
    pub instantaneous_delay_s: f64,
}

impl Default for RelaySettingPolicy {
    fn default() -> Self {
        RelaySettingPolicy {
            overcurrent_pickup_factor: 3.0,
            instantaneous_fault_fraction: 0.8,
            tms: 0.8,
            curve: CurveFamily::VeryInverse,
            instantaneous_delay_s: 0.3,
        }
    }
}

/// Multipliers used by [`BreakerSetting::from_rating`](super::BreakerSetting::from_rating).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerCurvePolicy {
    pub magnetic_multiplier: f64,
    pub thermal_multiplier: f64,
}

impl Default for BreakerCurvePolicy {
    fn default() -> Self {
        BreakerCurvePolicy {
            magnetic_multiplier: 10.0,
            thermal_multiplier: 1.45,
        }
    }
}

/// When the MV relay counts as backup for the LV breaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupPolicy {
    /// The relay must trip at some test current above this value (A, LV side)
    pub min_current_a: f64,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        BackupPolicy { min_current_a: 5000.0 }
    }
}

impl CoordinationPolicy {
    /// Reject inconsistent parameter sets.
    pub fn validate(&self) -> CalcResult<()> {
        let tp = &self.test_points;
        if tp.nominal_multiples.is_empty() && tp.fault_fractions.is_empty() {
            return Err(CalcError::invalid_input(
                "test_points",
                "[]",
                "At least one test point is required",
            ));
        }
        for m in &tp.nominal_multiples {
            require_positive("test_points.nominal_multiples", *m)?;
        }
        for f in &tp.fault_fractions {
            require_positive("test_points.fault_fractions", *f)?;
        }

        let m = &self.margins;
        require_positive("margins.high_fault_fraction", m.high_fault_fraction)?;
        require_positive("margins.high_margin_s", m.high_margin_s)?;
        require_positive("margins.medium_nominal_multiple", m.medium_nominal_multiple)?;
        require_positive("margins.medium_margin_s", m.medium_margin_s)?;
        require_positive("margins.overload_margin_s", m.overload_margin_s)?;
        require_positive("margins.marginal_fraction", m.marginal_fraction)?;
        if m.marginal_fraction >= 1.0 {
            return Err(CalcError::invalid_input(
                "margins.marginal_fraction",
                m.marginal_fraction.to_string(),
                "Marginal fraction must be below 1",
            ));
        }

        let mv = &self.mv_curve;
        require_positive("mv_curve.min_time_s", mv.min_time_s)?;
        require_positive("mv_curve.max_time_s", mv.max_time_s)?;
        if mv.min_time_s >= mv.max_time_s {
            return Err(CalcError::invalid_input(
                "mv_curve.min_time_s",
                mv.min_time_s.to_string(),
                "Minimum time must be below the maximum time",
            ));
        }

        self.validate_lv_curve()?;

        let r = &self.relay;
        require_positive("relay.overcurrent_pickup_factor", r.overcurrent_pickup_factor)?;
        require_positive("relay.instantaneous_fault_fraction", r.instantaneous_fault_fraction)?;
        require_positive("relay.tms", r.tms)?;
        require_positive("relay.instantaneous_delay_s", r.instantaneous_delay_s)?;

        let b = &self.breaker;
        require_positive("breaker.magnetic_multiplier", b.magnetic_multiplier)?;
        require_positive("breaker.thermal_multiplier", b.thermal_multiplier)?;
        if b.thermal_multiplier >= b.magnetic_multiplier {
            return Err(CalcError::invalid_input(
                "breaker.thermal_multiplier",
                b.thermal_multiplier.to_string(),
                "Thermal threshold must be below the magnetic threshold",
            ));
        }

        require_positive("backup.min_current_a", self.backup.min_current_a)?;
        Ok(())
    }

    fn validate_lv_curve(&self) -> CalcResult<()> {
        let lv = &self.lv_curve;
        require_positive("lv_curve.magnetic_time_s", lv.magnetic_time_s)?;
        require_positive("lv_curve.continuous_constant", lv.continuous_constant)?;
        require_positive("lv_curve.continuous_exponent", lv.continuous_exponent)?;
        require_positive("lv_curve.continuous_cap_s", lv.continuous_cap_s)?;

        for band in &lv.bands {
            require_positive("lv_curve.bands.min_ratio", band.min_ratio)?;
            require_positive("lv_curve.bands.time_s", band.time_s)?;
        }

        // Higher currents must never trip slower.
        for pair in lv.bands.windows(2) {
            if pair[1].min_ratio >= pair[0].min_ratio || pair[1].time_s < pair[0].time_s {
                return Err(CalcError::invalid_input(
                    "lv_curve.bands",
                    format!("{} -> {}", pair[0].min_ratio, pair[1].min_ratio),
                    "Bands must be ordered by descending ratio with non-decreasing times",
                ));
            }
        }

        if let Some(first) = lv.bands.first() {
            if lv.magnetic_time_s > first.time_s {
                return Err(CalcError::invalid_input(
                    "lv_curve.magnetic_time_s",
                    lv.magnetic_time_s.to_string(),
                    "Magnetic time cannot exceed the fastest band",
                ));
            }
        }

        if let Some(last) = lv.bands.last() {
            if lv.continuous_time_s(last.min_ratio) < last.time_s {
                return Err(CalcError::invalid_input(
                    "lv_curve.continuous_constant",
                    lv.continuous_constant.to_string(),
                    "Continuous law must join the slowest band from above",
                ));
            }
        }
        Ok(())
    }
}

//! Trip-time models for the MV relay stages and the LV breaker.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::units::{Milliseconds, Seconds};

use super::policy::{LvCurvePolicy, MvCurvePolicy};
use super::settings::{BreakerSetting, CurveFamily, ProtectionSetting};

/// Operating time of a protective device at a given current.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripTime {
    /// Trips after the given number of seconds
    After(f64),
    /// Current is below every pickup
    Never,
}

impl TripTime {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            TripTime::After(t) => Some(*t),
            TripTime::Never => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, TripTime::After(_))
    }

    /// The faster of two trip times.
    pub fn earliest(self, other: TripTime) -> TripTime {
        match (self, other) {
            (TripTime::After(a), TripTime::After(b)) => TripTime::After(a.min(b)),
            (TripTime::After(a), TripTime::Never) | (TripTime::Never, TripTime::After(a)) => TripTime::After(a),
            (TripTime::Never, TripTime::Never) => TripTime::Never,
        }
    }

    /// Milliseconds, for reporting
    pub fn millis(&self) -> Option<f64> {
        self.seconds().map(|t| Milliseconds::from(Seconds(t)).value())
    }
}

impl fmt::Display for TripTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripTime::After(t) if *t < 1.0 => write!(f, "{:.0} ms", t * 1000.0),
            TripTime::After(t) => write!(f, "{:.2} s", t),
            TripTime::Never => f.write_str("no trip"),
        }
    }
}

/// Which MV relay stage determined the effective trip time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MvStage {
    /// ANSI 50
    Instantaneous,
    /// ANSI 51
    TimeDelayed,
    None,
}

impl MvStage {
    pub fn ansi_code(&self) -> &'static str {
        match self {
            MvStage::Instantaneous => "50",
            MvStage::TimeDelayed => "51",
            MvStage::None => "-",
        }
    }
}

/// IEC inverse-time curve, clamped to the policy range.
///
/// Strictly above pickup only: a current equal to the pickup never trips.
pub fn time_delayed_trip(current_a: f64, pickup_a: f64, tms: f64, curve: CurveFamily, clamp: &MvCurvePolicy) -> TripTime {
    if current_a <= pickup_a {
        return TripTime::Never;
    }
    let (k, alpha) = curve.constants();
    let ratio = current_a / pickup_a;
    let t = tms * k / (ratio.powf(alpha) - 1.0);
    // r^α rounds to 1.0 just above pickup for NI; an infinite t clamps to the max.
    TripTime::After(t.clamp(clamp.min_time_s, clamp.max_time_s))
}

/// Definite-time instantaneous stage (inclusive pickup).
pub fn instantaneous_trip(current_a: f64, pickup_a: f64, delay_s: f64) -> TripTime {
    if current_a >= pickup_a {
        TripTime::After(delay_s)
    } else {
        TripTime::Never
    }
}

/// Effective MV relay response at an MV-side current.
///
/// Returns the faster stage; a tie is attributed to the instantaneous stage.
pub fn relay_trip(mv_current_a: f64, relay: &ProtectionSetting, clamp: &MvCurvePolicy) -> (TripTime, MvStage) {
    let t51 = time_delayed_trip(mv_current_a, relay.overcurrent_pickup_a, relay.tms, relay.curve, clamp);
    let t50 = instantaneous_trip(mv_current_a, relay.instantaneous_pickup_a, relay.instantaneous_delay_s);

    match (t50, t51) {
        (TripTime::After(a), TripTime::After(b)) if a <= b => (t50, MvStage::Instantaneous),
        (TripTime::After(_), TripTime::Never) => (t50, MvStage::Instantaneous),
        (_, TripTime::After(_)) => (t51, MvStage::TimeDelayed),
        (TripTime::Never, TripTime::Never) => (TripTime::Never, MvStage::None),
    }
}

/// LV breaker trip time at an LV-side current.
pub fn breaker_trip(current_a: f64, breaker: &BreakerSetting, curve: &LvCurvePolicy) -> TripTime {
    if breaker.reaches_magnetic(current_a) {
        return TripTime::After(curve.magnetic_time_s);
    }
    if !breaker.reaches_thermal(current_a) {
        return TripTime::Never;
    }
    let ratio = breaker.ratio(current_a);
    let t = curve
        .bands
        .iter()
        .find(|band| ratio >= band.min_ratio)
        .map(|band| band.time_s)
        .unwrap_or_else(|| curve.continuous_time_s(ratio));
    TripTime::After(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::selectivity::BreakerCurvePolicy;

    fn relay() -> ProtectionSetting {
        ProtectionSetting {
            overcurrent_pickup_a: 27.3,
            instantaneous_pickup_a: 650.0,
            tms: 0.8,
            curve: CurveFamily::VeryInverse,
            instantaneous_delay_s: 0.5,
        }
    }

    fn breaker() -> BreakerSetting {
        BreakerSetting::from_rating(1000.0, &BreakerCurvePolicy::default())
    }

    fn secs(t: TripTime) -> f64 {
        t.seconds().expect("expected a finite trip time")
    }

    #[test]
    fn test_pickup_is_exclusive_for_time_delayed_stage() {
        let clamp = MvCurvePolicy::default();
        assert_eq!(time_delayed_trip(27.3, 27.3, 0.8, CurveFamily::VeryInverse, &clamp), TripTime::Never);
        assert!(time_delayed_trip(27.31, 27.3, 0.8, CurveFamily::VeryInverse, &clamp).is_finite());
    }

    #[test]
    fn test_pickup_is_inclusive_for_instantaneous_stage() {
        assert_eq!(instantaneous_trip(650.0, 650.0, 0.5), TripTime::After(0.5));
        assert_eq!(instantaneous_trip(649.9, 650.0, 0.5), TripTime::Never);
    }

    #[test]
    fn test_curve_formulas() {
        let clamp = MvCurvePolicy::default();
        // r = 2
        let vi = secs(time_delayed_trip(20.0, 10.0, 1.0, CurveFamily::VeryInverse, &clamp));
        assert!((vi - 13.5).abs() < 1e-9);
        let ei = secs(time_delayed_trip(20.0, 10.0, 1.0, CurveFamily::ExtremelyInverse, &clamp));
        assert!((ei - 80.0 / 3.0).abs() < 1e-9);
        let ni = secs(time_delayed_trip(20.0, 10.0, 1.0, CurveFamily::NormalInverse, &clamp));
        assert!((ni - 0.14 / (2f64.powf(0.02) - 1.0)).abs() < 1e-9);
        assert!((ni - 10.03).abs() < 0.01);
    }

    #[test]
    fn test_clamp_limits() {
        let clamp = MvCurvePolicy::default();
        // just above pickup the NI curve explodes
        assert_eq!(
            time_delayed_trip(10.000_001, 10.0, 1.0, CurveFamily::NormalInverse, &clamp),
            TripTime::After(300.0)
        );
        // far above pickup the EI curve falls under the floor
        assert_eq!(
            time_delayed_trip(1000.0, 10.0, 0.05, CurveFamily::ExtremelyInverse, &clamp),
            TripTime::After(0.05)
        );
    }

    #[test]
    fn test_relay_picks_faster_stage() {
        let clamp = MvCurvePolicy::default();
        let (t, stage) = relay_trip(36.4, &relay(), &clamp);
        assert_eq!(stage, MvStage::TimeDelayed);
        assert!((secs(t) - 32.4).abs() < 1e-9);

        // at 700 A the 51 stage gives 0.438 s, faster than a 0.5 s 50 stage
        let (_, stage) = relay_trip(700.0, &relay(), &clamp);
        assert_eq!(stage, MvStage::TimeDelayed);

        let fast = ProtectionSetting {
            instantaneous_delay_s: 0.05,
            ..relay()
        };
        let (t, stage) = relay_trip(700.0, &fast, &clamp);
        assert_eq!(stage, MvStage::Instantaneous);
        assert_eq!(t, TripTime::After(0.05));

        let (t, stage) = relay_trip(20.0, &relay(), &clamp);
        assert_eq!(stage, MvStage::None);
        assert_eq!(t, TripTime::Never);
    }

    #[test]
    fn test_relay_tie_goes_to_instantaneous() {
        let clamp = MvCurvePolicy::default();
        // VI with pickup 10, TMS 1: t = 13.5 / (r - 1) = 0.5 at r = 28
        let relay = ProtectionSetting {
            overcurrent_pickup_a: 10.0,
            instantaneous_pickup_a: 100.0,
            tms: 1.0,
            curve: CurveFamily::VeryInverse,
            instantaneous_delay_s: 0.5,
        };
        let (t, stage) = relay_trip(280.0, &relay, &clamp);
        assert_eq!(stage, MvStage::Instantaneous);
        assert_eq!(t, TripTime::After(0.5));
    }

    #[test]
    fn test_breaker_regions() {
        let curve = LvCurvePolicy::default();
        let b = breaker();
        assert_eq!(breaker_trip(1449.0, &b, &curve), TripTime::Never);
        assert!((secs(breaker_trip(1820.0, &b, &curve)) - 3600.0 / (1.82 * 1.82)).abs() < 1e-9);
        assert_eq!(breaker_trip(2000.0, &b, &curve), TripTime::After(10.0));
        assert_eq!(breaker_trip(7500.0, &b, &curve), TripTime::After(0.5));
        assert_eq!(breaker_trip(10_000.0, &b, &curve), TripTime::After(0.01));
        assert_eq!(breaker_trip(25_000.0, &b, &curve), TripTime::After(0.01));
    }

    #[test]
    fn test_breaker_bands_used_below_magnetic() {
        // magnetic at 60x so the 50x and 20x bands are reachable
        let b = BreakerSetting {
            rated_current_a: 100.0,
            magnetic_multiplier: 60.0,
            thermal_multiplier: 1.3,
        };
        let curve = LvCurvePolicy::default();
        assert_eq!(breaker_trip(5000.0, &b, &curve), TripTime::After(0.02));
        assert_eq!(breaker_trip(2500.0, &b, &curve), TripTime::After(0.05));
        assert_eq!(breaker_trip(1000.0, &b, &curve), TripTime::After(0.1));
        assert_eq!(breaker_trip(6000.0, &b, &curve), TripTime::After(0.01));
    }

    #[test]
    fn test_earliest() {
        assert_eq!(TripTime::After(1.0).earliest(TripTime::After(0.5)), TripTime::After(0.5));
        assert_eq!(TripTime::Never.earliest(TripTime::After(2.0)), TripTime::After(2.0));
        assert_eq!(TripTime::Never.earliest(TripTime::Never), TripTime::Never);
    }

    #[test]
    fn test_trip_time_display() {
        assert_eq!(TripTime::After(0.01).to_string(), "10 ms");
        assert_eq!(TripTime::After(32.4).to_string(), "32.40 s");
        assert_eq!(TripTime::Never.to_string(), "no trip");
    }

    #[test]
    fn test_trip_time_serde() {
        assert_eq!(serde_json::to_string(&TripTime::Never).unwrap(), "\"never\"");
        assert_eq!(serde_json::to_string(&TripTime::After(0.5)).unwrap(), "{\"after\":0.5}");
    }
}

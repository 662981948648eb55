//! # MV/LV Protection Selectivity
//!
//! Checks that the LV main breaker clears a fault with enough time margin
//! before the MV feeder relay (ANSI 50/51) trips as backup.
//!
//! The evaluation is a pure function of its inputs:
//!
//! 1. Expand the test currents from the policy (multiples of the LV nominal
//!    current, then fractions of the bolted LV fault current).
//! 2. At each current compute the LV breaker time, and the MV relay time at
//!    the current referred through the voltage ratio.
//! 3. Look up the required margin for the current band and classify.
//! 4. Aggregate into a [`CoordinationReport`] with a qualitative rating.
//!
//! All constants live in [`CoordinationPolicy`]; [`calculate`] uses the
//! canonical set, [`evaluate`] takes an explicit one.
//!
//! ## Example
//!
//! ```rust
//! use cabina_core::calculations::selectivity::{
//!     calculate, BreakerSetting, CoordinationInput, CoordinationRating, CurveFamily, ProtectionSetting,
//! };
//!
//! let input = CoordinationInput {
//!     label: "TR1".to_string(),
//!     mv_nominal_current_a: 18.2,
//!     lv_nominal_current_a: 910.0,
//!     lv_fault_current_a: 25_000.0,
//!     relay: ProtectionSetting {
//!         overcurrent_pickup_a: 27.3,
//!         instantaneous_pickup_a: 650.0,
//!         tms: 0.8,
//!         curve: CurveFamily::VeryInverse,
//!         instantaneous_delay_s: 0.5,
//!     },
//!     breaker: BreakerSetting {
//!         rated_current_a: 1000.0,
//!         magnetic_multiplier: 10.0,
//!         thermal_multiplier: 1.45,
//!     },
//!     voltage_ratio: 50.0,
//! };
//!
//! let report = calculate(&input).unwrap();
//! assert_eq!(report.points_evaluated, 7);
//! assert_eq!(report.rating, CoordinationRating::Acceptable);
//! ```

pub mod curves;
pub mod policy;
pub mod report;
pub mod settings;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{require_positive, CalcError, CalcResult};

pub use curves::{breaker_trip, instantaneous_trip, relay_trip, time_delayed_trip, MvStage, TripTime};
pub use policy::{
    BackupPolicy, BreakerCurvePolicy, CoordinationPolicy, LvBand, LvCurvePolicy, MarginPolicy, MvCurvePolicy, RelaySettingPolicy,
    TestPointPolicy,
};
pub use report::{Classification, CoordinationIssue, CoordinationRating, CoordinationReport, SelectivityResult};
pub use settings::{BreakerSetting, CurveFamily, ProtectionSetting};

/// Input for a coordination evaluation.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "TR1",
///   "mv_nominal_current_a": 18.2,
///   "lv_nominal_current_a": 910.0,
///   "lv_fault_current_a": 25000.0,
///   "relay": {
///     "overcurrent_pickup_a": 27.3,
///     "instantaneous_pickup_a": 650.0,
///     "tms": 0.8,
///     "curve": "very_inverse",
///     "instantaneous_delay_s": 0.5
///   },
///   "breaker": {
///     "rated_current_a": 1000.0,
///     "magnetic_multiplier": 10.0,
///     "thermal_multiplier": 1.45
///   },
///   "voltage_ratio": 50.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationInput {
    /// User label (e.g. "TR1")
    #[serde(default)]
    pub label: String,

    /// Transformer nominal current, MV side (A)
    pub mv_nominal_current_a: f64,

    /// Transformer nominal current, LV side (A)
    pub lv_nominal_current_a: f64,

    /// Bolted three-phase fault current at the LV busbar (A, symmetrical RMS)
    pub lv_fault_current_a: f64,

    /// MV feeder relay
    pub relay: ProtectionSetting,

    /// LV main breaker
    pub breaker: BreakerSetting,

    /// Transformer voltage ratio MV/LV
    pub voltage_ratio: f64,
}

impl CoordinationInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("mv_nominal_current_a", self.mv_nominal_current_a)?;
        require_positive("lv_nominal_current_a", self.lv_nominal_current_a)?;
        require_positive("lv_fault_current_a", self.lv_fault_current_a)?;
        require_positive("voltage_ratio", self.voltage_ratio)?;
        self.relay.validate()?;
        self.breaker.validate()?;

        // A fault that cannot even reach the thermal pickup would rate the
        // full-fault point as "neither trips".
        if !self.breaker.reaches_thermal(self.lv_fault_current_a) {
            return Err(CalcError::invalid_input(
                "lv_fault_current_a",
                self.lv_fault_current_a.to_string(),
                format!(
                    "Fault current is below the breaker thermal pickup ({:.0} A)",
                    self.breaker.thermal_threshold_a()
                ),
            ));
        }
        Ok(())
    }
}

/// Evaluate coordination with the canonical policy.
pub fn calculate(input: &CoordinationInput) -> CalcResult<CoordinationReport> {
    evaluate(input, &CoordinationPolicy::default())
}

/// Evaluate coordination with an explicit policy.
pub fn evaluate(input: &CoordinationInput, policy: &CoordinationPolicy) -> CalcResult<CoordinationReport> {
    input.validate()?;
    policy.validate()?;

    let points: Vec<SelectivityResult> = policy
        .test_points
        .currents(input.lv_nominal_current_a, input.lv_fault_current_a)
        .into_iter()
        .map(|current| evaluate_point(current, input, policy))
        .collect();

    let report = CoordinationReport::from_points(
        points,
        input.lv_fault_current_a,
        &input.relay,
        &input.breaker,
        policy.backup.min_current_a,
    );

    info!(
        label = %input.label,
        points = report.points_evaluated,
        satisfactory = report.satisfactory_count,
        issues = report.issues.len(),
        rating = %report.rating,
        "coordination evaluated"
    );
    Ok(report)
}

fn evaluate_point(test_current_a: f64, input: &CoordinationInput, policy: &CoordinationPolicy) -> SelectivityResult {
    let mv_current_a = test_current_a / input.voltage_ratio;
    let lv_trip = breaker_trip(test_current_a, &input.breaker, &policy.lv_curve);
    let (mv_trip, mv_stage) = relay_trip(mv_current_a, &input.relay, &policy.mv_curve);
    let required_margin_s =
        policy
            .margins
            .required_margin_s(test_current_a, input.lv_nominal_current_a, input.lv_fault_current_a);
    let (classification, margin_s) =
        Classification::classify(lv_trip, mv_trip, required_margin_s, policy.margins.marginal_fraction);

    debug!(
        current_a = test_current_a,
        mv_current_a,
        lv = %lv_trip,
        mv = %mv_trip,
        stage = mv_stage.ansi_code(),
        ?margin_s,
        required_margin_s,
        %classification,
        "test point"
    );
    if classification == Classification::RelayOnly {
        warn!(
            current_a = test_current_a,
            mv = %mv_trip,
            "MV relay trips without the LV breaker"
        );
    }

    SelectivityResult {
        test_current_a,
        mv_current_a,
        lv_trip,
        mv_trip,
        mv_stage,
        margin_s,
        required_margin_s,
        classification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-4;

    /// 910 A LV nominal, 1000 A breaker, 25 kA fault, VI TMS 0.8, ratio 50.
    fn worked_example() -> CoordinationInput {
        let mv_nominal = 18.2;
        CoordinationInput {
            label: "worked example".to_string(),
            mv_nominal_current_a: mv_nominal,
            lv_nominal_current_a: 910.0,
            lv_fault_current_a: 25_000.0,
            relay: ProtectionSetting {
                overcurrent_pickup_a: 1.5 * mv_nominal,
                instantaneous_pickup_a: 1.3 * 25_000.0 / 50.0,
                tms: 0.8,
                curve: CurveFamily::VeryInverse,
                instantaneous_delay_s: 0.5,
            },
            breaker: BreakerSetting {
                rated_current_a: 1000.0,
                magnetic_multiplier: 10.0,
                thermal_multiplier: 1.45,
            },
            voltage_ratio: 50.0,
        }
    }

    fn secs(t: TripTime) -> f64 {
        t.seconds().expect("finite trip time")
    }

    #[test]
    fn test_worked_example_full_fault_point() {
        let report = calculate(&worked_example()).unwrap();
        let last = report.points.last().unwrap();

        assert!((last.test_current_a - 25_000.0).abs() < TOL);
        assert!((last.mv_current_a - 500.0).abs() < TOL);
        // r = 25 is above the 10x magnetic threshold
        assert_eq!(last.lv_trip, TripTime::After(0.01));
        // 500 A is below the 650 A instantaneous pickup, so the 51 stage governs
        assert_eq!(last.mv_stage, MvStage::TimeDelayed);
        assert!((secs(last.mv_trip) - 0.62373).abs() < TOL);
        assert!((last.margin_s.unwrap() - 0.61373).abs() < TOL);
        assert_eq!(last.required_margin_s, 0.20);
        assert_eq!(last.classification, Classification::Adequate);
    }

    #[test]
    fn test_worked_example_all_points() {
        let report = calculate(&worked_example()).unwrap();
        let expected = [
            (1092.0, Classification::NeitherTrips, 0.30),
            (1820.0, Classification::Inadequate, 0.30),
            (4550.0, Classification::Inadequate, 0.30),
            (13_650.0, Classification::Adequate, 0.20),
            (7500.0, Classification::Adequate, 0.30),
            (15_000.0, Classification::Adequate, 0.20),
            (25_000.0, Classification::Adequate, 0.20),
        ];
        assert_eq!(report.points.len(), expected.len());
        for (point, (current, class, required)) in report.points.iter().zip(expected) {
            assert!((point.test_current_a - current).abs() < TOL, "{}", point.test_current_a);
            assert_eq!(point.classification, class, "at {} A", current);
            assert_eq!(point.required_margin_s, required, "at {} A", current);
        }

        let p = &report.points;
        assert!((secs(p[1].lv_trip) - 1086.82).abs() < 0.01);
        assert!((secs(p[1].mv_trip) - 32.4).abs() < TOL);
        assert_eq!(p[2].lv_trip, TripTime::After(10.0));
        assert!((secs(p[2].mv_trip) - 4.62857).abs() < TOL);
        assert!((secs(p[3].mv_trip) - 1.2).abs() < TOL);
        assert_eq!(p[4].lv_trip, TripTime::After(0.5));
        assert!((secs(p[4].mv_trip) - 2.40293).abs() < TOL);
        assert!((secs(p[5].mv_trip) - 1.08119).abs() < TOL);
        assert_eq!(p[0].margin_s, None);
    }

    #[test]
    fn test_worked_example_aggregate() {
        let report = calculate(&worked_example()).unwrap();
        assert_eq!(report.points_evaluated, 7);
        assert_eq!(report.adequate_count, 4);
        assert_eq!(report.satisfactory_count, 4);
        assert_eq!(report.rating, CoordinationRating::Acceptable);
        assert!(!report.conforming());
        assert!(report.mv_backup_available);

        assert_eq!(report.issues.len(), 2);
        assert!((report.issues[0].test_current_a - 1820.0).abs() < TOL);
        assert!((report.issues[1].test_current_ka - 4.55).abs() < TOL);
        assert!(report.issues.iter().all(|i| i.shortfall_ms > 0.0));
    }

    #[test]
    fn test_recommendations_target_low_current_issues() {
        let report = calculate(&worked_example()).unwrap();
        let recs = report.recommendations();
        assert!(recs.iter().any(|r| r.contains("51 stage TMS")));
        assert!(!recs.iter().any(|r| r.contains("50 stage delay")));
        assert!(recs.iter().any(|r| r.contains("Primary injection")));
    }

    #[test]
    fn test_evaluation_is_pure() {
        let input = worked_example();
        let first = calculate(&input).unwrap();
        let second = calculate(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_full_fault_point_never_safe() {
        // sweep breaker ratings that the fault still reaches
        for rated in [160.0, 400.0, 1000.0, 2500.0, 6300.0, 17_000.0] {
            let mut input = worked_example();
            input.breaker.rated_current_a = rated;
            let report = calculate(&input).unwrap();
            let last = report.points.last().unwrap();
            assert!(last.lv_trip.is_finite(), "rated {}", rated);
            assert!(matches!(
                last.classification,
                Classification::Adequate
                    | Classification::Marginal
                    | Classification::Inadequate
                    | Classification::BreakerOnly
            ));
            if last.classification == Classification::Inadequate {
                assert!(report.issues.iter().any(|i| (i.test_current_a - 25_000.0).abs() < TOL));
            }
        }
    }

    #[test]
    fn test_fault_below_thermal_pickup_rejected() {
        let mut input = worked_example();
        input.breaker.rated_current_a = 20_000.0;
        let err = calculate(&input).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_fault_at_rounded_thermal_threshold() {
        // 100.37 × 1.45 divides back to 1.4499999999999997
        let mut input = worked_example();
        input.breaker.rated_current_a = 100.37;
        input.relay.overcurrent_pickup_a = 1.0e6;
        input.relay.instantaneous_pickup_a = 1.0e6;
        input.lv_fault_current_a = 100.37 * 1.45;

        let policy = CoordinationPolicy::default();
        assert_eq!(
            breaker_trip(input.lv_fault_current_a, &input.breaker, &policy.lv_curve),
            TripTime::Never
        );
        let err = calculate(&input).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        // just above the pickup the full-fault point trips
        input.lv_fault_current_a = 145.54;
        let report = calculate(&input).unwrap();
        let last = report.points.last().unwrap();
        assert!(last.lv_trip.is_finite());
        assert_eq!(last.classification, Classification::BreakerOnly);
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        let mut input = worked_example();
        input.lv_nominal_current_a = 0.0;
        assert!(calculate(&input).is_err());

        let mut input = worked_example();
        input.voltage_ratio = f64::NAN;
        assert!(calculate(&input).is_err());

        let mut input = worked_example();
        input.relay.overcurrent_pickup_a = -5.0;
        assert!(calculate(&input).is_err());
    }

    #[test]
    fn test_unknown_curve_in_json_fails() {
        let json = r#"{
            "mv_nominal_current_a": 18.2,
            "lv_nominal_current_a": 910.0,
            "lv_fault_current_a": 25000.0,
            "relay": {
                "overcurrent_pickup_a": 27.3,
                "instantaneous_pickup_a": 650.0,
                "tms": 0.8,
                "curve": "moderately_inverse",
                "instantaneous_delay_s": 0.5
            },
            "breaker": { "rated_current_a": 1000.0, "magnetic_multiplier": 10.0, "thermal_multiplier": 1.45 },
            "voltage_ratio": 50.0
        }"#;
        let err = serde_json::from_str::<CoordinationInput>(json).unwrap_err();
        assert!(err.to_string().contains("moderately_inverse"));
    }

    #[test]
    fn test_json_input_parses() {
        let json = serde_json::to_string(&worked_example()).unwrap();
        let parsed: CoordinationInput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, worked_example());
    }

    #[test]
    fn test_mv_trip_monotonic_in_current() {
        let policy = CoordinationPolicy::default();
        for curve in CurveFamily::ALL {
            let relay = ProtectionSetting {
                overcurrent_pickup_a: 30.0,
                instantaneous_pickup_a: 1.0e9,
                tms: 0.1,
                curve,
                instantaneous_delay_s: 0.1,
            };
            let mut previous = f64::INFINITY;
            // r from 1.5 to ~40, inside the clamp for every family at TMS 0.1
            for step in 0..80 {
                let current = 45.0 + step as f64 * 15.0;
                let (t, _) = relay_trip(current, &relay, &policy.mv_curve);
                let t = secs(t);
                if t > policy.mv_curve.min_time_s && t < policy.mv_curve.max_time_s {
                    assert!(t < previous, "{:?} at {} A", curve, current);
                }
                assert!(t <= previous, "{:?} at {} A", curve, current);
                previous = t;
            }
        }
    }

    #[test]
    fn test_breaker_trip_non_increasing() {
        let policy = CoordinationPolicy::default();
        let breaker = BreakerSetting::from_rating(1000.0, &policy.breaker);
        let mut previous = f64::INFINITY;
        for step in 0..2000 {
            let current = 1000.0 + step as f64 * 25.0;
            if let Some(t) = breaker_trip(current, &breaker, &policy.lv_curve).seconds() {
                assert!(t <= previous, "at {} A", current);
                previous = t;
            }
        }
    }

    #[test]
    fn test_currents_below_pickup_never_trip() {
        let policy = CoordinationPolicy::default();
        let input = worked_example();
        for current in [0.1, 10.0, 27.0, 27.29] {
            assert_eq!(
                time_delayed_trip(current, 27.3, 0.8, CurveFamily::VeryInverse, &policy.mv_curve),
                TripTime::Never
            );
            assert_eq!(instantaneous_trip(current, 650.0, 0.5), TripTime::Never);
        }
        assert_eq!(breaker_trip(1449.9, &input.breaker, &policy.lv_curve), TripTime::Never);
    }

    #[test]
    fn test_pickup_equality_excluded() {
        // LV current chosen so the referred MV current equals the 51 pickup exactly
        let policy = CoordinationPolicy::default();
        let relay = ProtectionSetting {
            overcurrent_pickup_a: 40.0,
            instantaneous_pickup_a: 800.0,
            tms: 0.8,
            curve: CurveFamily::VeryInverse,
            instantaneous_delay_s: 0.3,
        };
        let (t, stage) = relay_trip(2000.0 / 50.0, &relay, &policy.mv_curve);
        assert_eq!(t, TripTime::Never);
        assert_eq!(stage, MvStage::None);
    }

    #[test]
    fn test_relay_only_point_classified() {
        // sensitive relay, oversized breaker: at 1.2x nominal only the relay trips
        let mut input = worked_example();
        input.relay.overcurrent_pickup_a = 15.0;
        let report = calculate(&input).unwrap();
        assert_eq!(report.points[0].classification, Classification::RelayOnly);
    }

    #[test]
    fn test_custom_policy_changes_test_points() {
        let mut policy = CoordinationPolicy::default();
        policy.test_points.nominal_multiples = vec![2.0];
        policy.test_points.fault_fractions = vec![1.0];
        let report = evaluate(&worked_example(), &policy).unwrap();
        assert_eq!(report.points_evaluated, 2);
    }

    #[test]
    fn test_backup_threshold_from_policy() {
        // the relay trips at every point above 5 kA in the worked example
        let mut policy = CoordinationPolicy::default();
        policy.backup.min_current_a = 30_000.0;
        let report = evaluate(&worked_example(), &policy).unwrap();
        assert!(!report.mv_backup_available);

        policy.backup.min_current_a = 20_000.0;
        let report = evaluate(&worked_example(), &policy).unwrap();
        assert!(report.mv_backup_available);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let mut policy = CoordinationPolicy::default();
        policy.margins.marginal_fraction = 0.0;
        assert!(evaluate(&worked_example(), &policy).is_err());
    }

    #[test]
    fn test_derived_settings_evaluate() {
        let policy = CoordinationPolicy::default();
        let relay = ProtectionSetting::derive(18.2, 25_000.0, 50.0, &policy.relay).unwrap();
        let breaker = BreakerSetting::from_rating(1000.0, &policy.breaker);
        let input = CoordinationInput {
            relay,
            breaker,
            ..worked_example()
        };
        let report = evaluate(&input, &policy).unwrap();
        assert_eq!(report.points_evaluated, 7);
        // 50 stage at 400 A fires for the full fault (500 A MV side)
        let last = report.points.last().unwrap();
        assert_eq!(last.mv_stage, MvStage::Instantaneous);
        assert_eq!(last.mv_trip, TripTime::After(0.3));
    }
}

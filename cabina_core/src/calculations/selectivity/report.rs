//! Per-point results and the aggregate coordination report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::units::{Amperes, KiloAmperes, Milliseconds, Seconds};

use super::curves::{MvStage, TripTime};
use super::settings::{BreakerSetting, ProtectionSetting};

/// Share of satisfactory points (%) for each rating; compared exactly.
pub const EXCELLENT_PERCENT: usize = 85;
pub const GOOD_PERCENT: usize = 70;
pub const ACCEPTABLE_PERCENT: usize = 50;

/// Outcome at a single test current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Both trip, margin meets the requirement
    Adequate,
    /// Both trip, margin within the marginal fraction of the requirement
    Marginal,
    /// Both trip, margin too short
    Inadequate,
    /// Only the LV breaker trips (ideal)
    BreakerOnly,
    /// Only the MV relay trips (warning)
    RelayOnly,
    /// Current below both pickups (safe)
    NeitherTrips,
}

impl Classification {
    /// Classify one test point from the two trip times.
    ///
    /// Returns the classification and the margin when both devices trip.
    pub fn classify(lv: TripTime, mv: TripTime, required_margin_s: f64, marginal_fraction: f64) -> (Self, Option<f64>) {
        match (lv, mv) {
            (TripTime::After(t_lv), TripTime::After(t_mv)) => {
                let margin = t_mv - t_lv;
                let class = if margin >= required_margin_s {
                    Classification::Adequate
                } else if margin >= required_margin_s * marginal_fraction {
                    Classification::Marginal
                } else {
                    Classification::Inadequate
                };
                (class, Some(margin))
            }
            (TripTime::After(_), TripTime::Never) => (Classification::BreakerOnly, None),
            (TripTime::Never, TripTime::After(_)) => (Classification::RelayOnly, None),
            (TripTime::Never, TripTime::Never) => (Classification::NeitherTrips, None),
        }
    }

    /// Counts toward the aggregate rating
    pub fn is_satisfactory(&self) -> bool {
        matches!(self, Classification::Adequate | Classification::BreakerOnly)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Adequate => "adequate",
            Classification::Marginal => "marginal",
            Classification::Inadequate => "inadequate",
            Classification::BreakerOnly => "breaker only (ideal)",
            Classification::RelayOnly => "relay only (warning)",
            Classification::NeitherTrips => "neither trips (safe)",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result at one test current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectivityResult {
    /// Test current, LV side (A)
    pub test_current_a: f64,
    /// Same current referred to the MV side (A)
    pub mv_current_a: f64,
    pub lv_trip: TripTime,
    pub mv_trip: TripTime,
    pub mv_stage: MvStage,
    /// `t_mv - t_lv` when both devices trip (s)
    pub margin_s: Option<f64>,
    pub required_margin_s: f64,
    pub classification: Classification,
}

/// Diagnostic for a point classified inadequate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationIssue {
    pub test_current_a: f64,
    pub test_current_ka: f64,
    pub mv_current_a: f64,
    pub lv_trip_ms: f64,
    pub mv_trip_ms: f64,
    pub margin_ms: f64,
    pub required_margin_ms: f64,
    pub shortfall_ms: f64,
    pub mv_stage: MvStage,
    pub description: String,
}

impl CoordinationIssue {
    /// Build the diagnostic for an inadequate point. `None` for any other point.
    pub fn from_result(point: &SelectivityResult) -> Option<Self> {
        if point.classification != Classification::Inadequate {
            return None;
        }
        let lv_trip_ms = point.lv_trip.millis()?;
        let mv_trip_ms = point.mv_trip.millis()?;
        let ms = |s: f64| Milliseconds::from(Seconds(s)).value();
        let margin_ms = ms(point.margin_s?);
        let required_margin_ms = ms(point.required_margin_s);
        Some(CoordinationIssue {
            test_current_a: point.test_current_a,
            test_current_ka: KiloAmperes::from(Amperes(point.test_current_a)).value(),
            mv_current_a: point.mv_current_a,
            lv_trip_ms,
            mv_trip_ms,
            margin_ms,
            required_margin_ms,
            shortfall_ms: required_margin_ms - margin_ms,
            mv_stage: point.mv_stage,
            description: format!(
                "Margin {:.0} ms < {:.0} ms required (MV stage {})",
                margin_ms,
                required_margin_ms,
                point.mv_stage.ansi_code()
            ),
        })
    }
}

/// Qualitative coordination rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationRating {
    Critical,
    Acceptable,
    Good,
    Excellent,
}

impl CoordinationRating {
    /// Rate `satisfactory` out of `total` points.
    ///
    /// ```rust
    /// use cabina_core::calculations::selectivity::CoordinationRating;
    ///
    /// assert_eq!(CoordinationRating::from_counts(17, 20), CoordinationRating::Excellent);
    /// assert_eq!(CoordinationRating::from_counts(16, 20), CoordinationRating::Good);
    /// ```
    pub fn from_counts(satisfactory: usize, total: usize) -> Self {
        if total == 0 {
            return CoordinationRating::Critical;
        }
        let scaled = satisfactory * 100;
        if scaled >= total * EXCELLENT_PERCENT {
            CoordinationRating::Excellent
        } else if scaled >= total * GOOD_PERCENT {
            CoordinationRating::Good
        } else if scaled >= total * ACCEPTABLE_PERCENT {
            CoordinationRating::Acceptable
        } else {
            CoordinationRating::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CoordinationRating::Excellent => "excellent",
            CoordinationRating::Good => "good",
            CoordinationRating::Acceptable => "acceptable",
            CoordinationRating::Critical => "critical",
        }
    }
}

impl fmt::Display for CoordinationRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate result of one coordination evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationReport {
    /// Per-point results in test-point order
    pub points: Vec<SelectivityResult>,
    pub points_evaluated: usize,
    pub adequate_count: usize,
    /// Adequate plus breaker-only points
    pub satisfactory_count: usize,
    pub satisfactory_percent: f64,
    /// Inadequate points only
    pub issues: Vec<CoordinationIssue>,
    pub rating: CoordinationRating,
    /// MV relay trips at some test current above the policy backup threshold
    pub mv_backup_available: bool,
    pub lv_fault_current_a: f64,
    pub relay: ProtectionSetting,
    pub breaker: BreakerSetting,
}

impl CoordinationReport {
    pub(crate) fn from_points(
        points: Vec<SelectivityResult>,
        lv_fault_current_a: f64,
        relay: &ProtectionSetting,
        breaker: &BreakerSetting,
        backup_min_current_a: f64,
    ) -> Self {
        let points_evaluated = points.len();
        let adequate_count = points
            .iter()
            .filter(|p| p.classification == Classification::Adequate)
            .count();
        let satisfactory_count = points.iter().filter(|p| p.classification.is_satisfactory()).count();
        let satisfactory_percent = if points_evaluated == 0 {
            0.0
        } else {
            satisfactory_count as f64 * 100.0 / points_evaluated as f64
        };
        let issues = points.iter().filter_map(CoordinationIssue::from_result).collect();
        let mv_backup_available = points
            .iter()
            .any(|p| p.test_current_a > backup_min_current_a && p.mv_trip.is_finite());

        CoordinationReport {
            rating: CoordinationRating::from_counts(satisfactory_count, points_evaluated),
            points,
            points_evaluated,
            adequate_count,
            satisfactory_count,
            satisfactory_percent,
            issues,
            mv_backup_available,
            lv_fault_current_a,
            relay: relay.clone(),
            breaker: breaker.clone(),
        }
    }

    /// At least 70 % of the points are satisfactory.
    pub fn conforming(&self) -> bool {
        self.rating >= CoordinationRating::Good
    }

    /// Setting adjustments suggested by the issues, followed by the
    /// commissioning checklist.
    pub fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.issues.is_empty() {
            out.push("Protection coordination meets the required margins".to_string());
        } else {
            let half_fault = self.lv_fault_current_a / 2.0;
            let high = self.issues.iter().any(|i| i.test_current_a > half_fault);
            let low = self.issues.iter().any(|i| i.test_current_a <= half_fault);
            if high {
                out.push(format!(
                    "Increase the MV 50 stage delay (currently {:.0} ms)",
                    self.relay.instantaneous_delay_s * 1000.0
                ));
                out.push("Check the LV breaker magnetic curve".to_string());
            }
            if low {
                out.push(format!("Increase the MV 51 stage TMS (currently {})", self.relay.tms));
                out.push("Consider an extremely inverse curve for the MV 51 stage".to_string());
            }
        }
        out.extend(
            [
                "Primary injection test of the MV relay",
                "Measure actual trip times on site",
                "Verify coordination with the distributor's upstream protection",
                "Check setting drift every 2 years",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        out
    }
}

//! Data-quality checks
//!
//! Run after the tables are built. Anomalies here are reported as
//! warnings, never as errors: the tables are still valid output.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::engine::AnalysisReport;
use crate::event::{DeviceCategory, EventType};
use crate::funnel::{FunnelSummary, UserFunnelRecord};
use crate::retention::RetentionPoint;

/// A data-quality anomaly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityWarning {
    /// More users reached a stage than the stage before it
    NonMonotonicFunnel {
        group: String,
        stage: EventType,
        users: u64,
        previous_users: u64,
    },
    /// Weekly retention at week 0 is not the whole cohort
    WeekZeroMismatch {
        cohort_period: NaiveDate,
        device_category: DeviceCategory,
        cohort_size: u64,
        active_users: u64,
    },
    /// A stage is not strictly later than the previous one
    OrderingViolation { user_id: String, stage: EventType },
    /// A stage lands after the funnel window closed
    WindowViolation { user_id: String, stage: EventType },
    /// Events dated in a week before their user's cohort week
    NegativeWeekOffsets { events: u64 },
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonMonotonicFunnel {
                group,
                stage,
                users,
                previous_users,
            } => write!(
                f,
                "non-monotonic funnel in group {}: {} users at {} but {} at the previous stage",
                group, users, stage, previous_users
            ),
            Self::WeekZeroMismatch {
                cohort_period,
                device_category,
                cohort_size,
                active_users,
            } => write!(
                f,
                "week 0 retention for cohort {} ({}) is {}/{}",
                cohort_period, device_category, active_users, cohort_size
            ),
            Self::OrderingViolation { user_id, stage } => {
                write!(f, "user {} reached {} out of order", user_id, stage)
            }
            Self::WindowViolation { user_id, stage } => {
                write!(f, "user {} reached {} outside the funnel window", user_id, stage)
            }
            Self::NegativeWeekOffsets { events } => write!(
                f,
                "{} events dated before their cohort week were left out of weekly retention",
                events
            ),
        }
    }
}

/// Run every check against a finished report
pub fn check_quality(report: &AnalysisReport) -> Vec<QualityWarning> {
    let mut warnings = check_monotonic(&report.summary);
    warnings.extend(check_records(
        &report.funnel,
        report.params.funnel_window(),
    ));
    warnings.extend(check_week_zero(&report.weekly_retention));
    if report.negative_week_offsets > 0 {
        warnings.push(QualityWarning::NegativeWeekOffsets {
            events: report.negative_week_offsets,
        });
    }
    warnings
}

/// Stage counts must not increase along the funnel
pub fn check_monotonic(summary: &FunnelSummary) -> Vec<QualityWarning> {
    let mut warnings = Vec::new();
    for group in &summary.groups {
        for pair in group.stages.windows(2) {
            if pair[1].users > pair[0].users {
                warnings.push(QualityWarning::NonMonotonicFunnel {
                    group: group.label().to_string(),
                    stage: pair[1].stage,
                    users: pair[1].users,
                    previous_users: pair[0].users,
                });
            }
        }
    }
    warnings
}

/// Present stages must be strictly increasing and inside the window
pub fn check_records(records: &[UserFunnelRecord], window: Duration) -> Vec<QualityWarning> {
    let mut warnings = Vec::new();
    for record in records {
        let deadline = record.view_at.checked_add_signed(window);
        let mut previous = Some(record.view_at);

        for stage in &EventType::ALL[1..] {
            let stage_at = record.stage_at(*stage);
            if let Some(at) = stage_at {
                if previous.is_none_or(|p| at <= p) {
                    warnings.push(QualityWarning::OrderingViolation {
                        user_id: record.user_id.clone(),
                        stage: *stage,
                    });
                }
                if deadline.is_some_and(|d| at > d) {
                    warnings.push(QualityWarning::WindowViolation {
                        user_id: record.user_id.clone(),
                        stage: *stage,
                    });
                }
            }
            previous = stage_at;
        }
    }
    warnings
}

/// Every weekly cohort must be fully active at week 0
pub fn check_week_zero(points: &[RetentionPoint]) -> Vec<QualityWarning> {
    let mut cohorts: BTreeMap<(NaiveDate, DeviceCategory), (u64, u64)> = BTreeMap::new();
    for point in points {
        let entry = cohorts
            .entry((point.cohort_period, point.device_category))
            .or_insert((point.cohort_size, 0));
        if point.offset == 0 {
            entry.1 = point.active_users;
        }
    }

    cohorts
        .into_iter()
        .filter(|(_, (size, active))| size != active)
        .map(
            |((cohort_period, device_category), (cohort_size, active_users))| {
                QualityWarning::WeekZeroMismatch {
                    cohort_period,
                    device_category,
                    cohort_size,
                    active_users,
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::{build_funnel, summarize_funnel};
    use crate::testutil::{DAY, at, base, date};

    fn record(offsets: [Option<i64>; 3]) -> UserFunnelRecord {
        let stamp = |secs: Option<i64>| secs.map(|s| base() + Duration::seconds(s));
        UserFunnelRecord {
            user_id: "u1".to_string(),
            device_category: DeviceCategory::Desktop,
            view_at: base(),
            add_at: stamp(offsets[0]),
            checkout_at: stamp(offsets[1]),
            purchase_at: stamp(offsets[2]),
            purchase_revenue: None,
        }
    }

    #[test]
    fn test_built_funnel_has_no_warnings() {
        let events = [
            at("u1", EventType::ProductView, 0),
            at("u1", EventType::AddToCart, 10),
            at("u1", EventType::BeginCheckout, 5),
            at("u2", EventType::ProductView, 0),
            at("u2", EventType::AddToCart, 40 * DAY),
        ];
        let records = build_funnel(&events, Duration::days(30));

        assert!(check_records(&records, Duration::days(30)).is_empty());
        assert!(check_monotonic(&summarize_funnel(&records)).is_empty());
    }

    #[test]
    fn test_ordering_violation() {
        let warnings = check_records(&[record([Some(10), Some(10), None])], Duration::days(30));
        assert_eq!(
            warnings,
            vec![QualityWarning::OrderingViolation {
                user_id: "u1".to_string(),
                stage: EventType::BeginCheckout,
            }]
        );
    }

    #[test]
    fn test_stage_after_missing_stage_is_out_of_order() {
        let warnings = check_records(&[record([None, Some(10), None])], Duration::days(30));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_window_violation() {
        let warnings = check_records(&[record([Some(31 * DAY), None, None])], Duration::days(30));
        assert!(matches!(
            warnings.as_slice(),
            [QualityWarning::WindowViolation { stage: EventType::AddToCart, .. }]
        ));
    }

    #[test]
    fn test_non_monotonic_summary() {
        let mut summary = summarize_funnel(&[record([Some(10), Some(20), None])]);
        summary.groups[0].stages[3].users = 5;

        let warnings = check_monotonic(&summary);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].to_string().contains("group all"));
    }

    #[test]
    fn test_week_zero_mismatch() {
        let points = [
            RetentionPoint::new(date(2021, 1, 4), 0, DeviceCategory::Mobile, 10, 10),
            RetentionPoint::new(date(2021, 1, 4), 1, DeviceCategory::Mobile, 10, 3),
            RetentionPoint::new(date(2021, 1, 11), 0, DeviceCategory::Mobile, 8, 7),
            RetentionPoint::new(date(2021, 1, 18), 2, DeviceCategory::Mobile, 4, 1),
        ];
        let warnings = check_week_zero(&points);

        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[0],
            QualityWarning::WeekZeroMismatch {
                cohort_period: date(2021, 1, 11),
                device_category: DeviceCategory::Mobile,
                cohort_size: 8,
                active_users: 7,
            }
        );
        // A cohort without a week 0 row counts as zero
        assert!(warnings[1].to_string().ends_with("0/4"));
    }

    #[test]
    fn test_warning_serializes_with_kind() {
        let json = serde_json::to_value(QualityWarning::NegativeWeekOffsets { events: 3 }).unwrap();
        assert_eq!(json["kind"], "negative_week_offsets");
        assert_eq!(json["events"], 3);
    }
}

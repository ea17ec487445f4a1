//! Weekly cohort retention

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{CohortIndex, CohortKey, CohortRecord, MAX_WEEK_OFFSET, RetentionPoint, week_start};
use crate::event::Event;

/// Weekly retention table plus what was left out of it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyRetention {
    /// Rows sorted by (cohort week, device, offset)
    pub points: Vec<RetentionPoint>,
    /// Events of cohort users dated in a week before their cohort week
    pub negative_offset_events: u64,
}

impl WeeklyRetention {
    /// Compute weekly retention
    ///
    /// Offset `n` is the whole number of weeks between the Monday of an
    /// event's partition date and the cohort week. Offsets above
    /// [`MAX_WEEK_OFFSET`] are ignored; negative offsets are dropped and
    /// counted. A row is emitted for every offset with at least one active
    /// user, in cohorts of at least `min_cohort_size` users.
    pub fn compute(events: &[Event], cohorts: &[CohortRecord], min_cohort_size: u64) -> Self {
        let index = CohortIndex::new(cohorts, CohortRecord::cohort_week);
        let mut active: BTreeMap<(CohortKey, i64), BTreeSet<&str>> = BTreeMap::new();
        let mut negative_offset_events = 0;

        for event in events {
            let Some(cohort) = index.cohort(&event.user_id) else {
                continue;
            };
            let weeks = (week_start(event.event_date) - cohort.cohort_week()).num_days() / 7;
            if weeks < 0 {
                negative_offset_events += 1;
            } else if weeks <= MAX_WEEK_OFFSET {
                active
                    .entry((index.key(cohort), weeks))
                    .or_default()
                    .insert(event.user_id.as_str());
            }
        }

        let mut points = Vec::new();
        for ((period, device), size) in index.retained(min_cohort_size) {
            for weeks in 0..=MAX_WEEK_OFFSET {
                if let Some(users) = active.get(&((period, device), weeks)) {
                    points.push(RetentionPoint::new(
                        period,
                        weeks,
                        device,
                        size,
                        users.len() as u64,
                    ));
                }
            }
        }

        if negative_offset_events > 0 {
            tracing::debug!(
                events = negative_offset_events,
                "dropped events dated before their cohort week"
            );
        }
        tracing::debug!(
            cohorts = index.sizes.len(),
            suppressed = index.suppressed(min_cohort_size),
            rows = points.len(),
            "computed weekly retention"
        );

        Self {
            points,
            negative_offset_events,
        }
    }
}

/// Weekly retention rows for `cohorts`
pub fn weekly_retention(
    events: &[Event],
    cohorts: &[CohortRecord],
    min_cohort_size: u64,
) -> Vec<RetentionPoint> {
    WeeklyRetention::compute(events, cohorts, min_cohort_size).points
}

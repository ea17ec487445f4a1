//! Day-offset retention (D0/D1/D7/D30) by monthly cohort

use std::collections::{BTreeMap, BTreeSet};

use super::{CohortIndex, CohortKey, CohortRecord, DAY_OFFSETS, RetentionPoint};
use crate::event::Event;

/// Day-offset retention rows for `cohorts`
///
/// A user is active at day `d` when any of their events has a partition
/// date of exactly anchor + `d`. Every retained cohort gets a row for every
/// offset in [`DAY_OFFSETS`], with zero activity reported as zero.
pub fn day_offset_retention(
    events: &[Event],
    cohorts: &[CohortRecord],
    min_cohort_size: u64,
) -> Vec<RetentionPoint> {
    let index = CohortIndex::new(cohorts, CohortRecord::cohort_month);
    let mut active: BTreeMap<(CohortKey, i64), BTreeSet<&str>> = BTreeMap::new();

    for event in events {
        let Some(cohort) = index.cohort(&event.user_id) else {
            continue;
        };
        let days = (event.event_date - cohort.cohort_anchor_date).num_days();
        if DAY_OFFSETS.contains(&days) {
            active
                .entry((index.key(cohort), days))
                .or_default()
                .insert(event.user_id.as_str());
        }
    }

    let mut points = Vec::new();
    for ((period, device), size) in index.retained(min_cohort_size) {
        for days in DAY_OFFSETS {
            let users = active
                .get(&((period, device), days))
                .map_or(0, |users| users.len() as u64);
            points.push(RetentionPoint::new(period, days, device, size, users));
        }
    }

    tracing::debug!(
        cohorts = index.sizes.len(),
        suppressed = index.suppressed(min_cohort_size),
        rows = points.len(),
        "computed day-offset retention"
    );

    points
}

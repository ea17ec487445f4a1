//! Retention calculator
//!
//! Users are assigned to a cohort by their first product view, then
//! counted as active at later offsets when they have any canonical event
//! there. Two variants share that shape:
//!
//! - **weekly**: Monday-aligned calendar week cohorts, offsets 0..=8 weeks
//! - **day offset**: calendar month cohorts, offsets D0/D1/D7/D30

pub mod day_offset;
pub mod weekly;

pub use day_offset::day_offset_retention;
pub use weekly::{WeeklyRetention, weekly_retention};

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::event::{DeviceCategory, Event, EventType};
use crate::funnel::user_hits;
use crate::ratio;

/// Largest week offset reported by weekly retention
pub const MAX_WEEK_OFFSET: i64 = 8;

/// Day offsets reported by day-offset retention
pub const DAY_OFFSETS: [i64; 4] = [0, 1, 7, 30];

/// A user's cohort assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortRecord {
    pub user_id: String,
    /// Partition date of the user's first product view
    pub cohort_anchor_date: NaiveDate,
    pub device_category: DeviceCategory,
}

impl CohortRecord {
    /// Monday of the anchor date's week
    pub fn cohort_week(&self) -> NaiveDate {
        week_start(self.cohort_anchor_date)
    }

    /// First day of the anchor date's month
    pub fn cohort_month(&self) -> NaiveDate {
        month_start(self.cohort_anchor_date)
    }
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// Assign every user with a product view to a cohort
///
/// The device is the one recorded on the user's first qualifying event,
/// the same assignment the funnel builder uses. Sorted by user id.
pub fn build_cohorts(events: &[Event]) -> Vec<CohortRecord> {
    user_hits(events)
        .into_iter()
        .filter_map(|(user_id, hits)| {
            let view = hits.stage(EventType::ProductView)?;
            Some(CohortRecord {
                user_id: user_id.to_string(),
                cohort_anchor_date: view.event_date,
                device_category: hits.device_category,
            })
        })
        .collect()
}

/// One retention table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionPoint {
    /// Cohort week (Monday) or month (first day)
    pub cohort_period: NaiveDate,
    /// Weeks or days after the cohort anchor
    pub offset: i64,
    pub device_category: DeviceCategory,
    pub cohort_size: u64,
    pub active_users: u64,
    pub retention_rate: f64,
}

impl RetentionPoint {
    pub fn new(
        cohort_period: NaiveDate,
        offset: i64,
        device_category: DeviceCategory,
        cohort_size: u64,
        active_users: u64,
    ) -> Self {
        Self {
            cohort_period,
            offset,
            device_category,
            cohort_size,
            active_users,
            retention_rate: ratio(active_users, cohort_size),
        }
    }
}

/// Cohort grouping key: (period start, device)
type CohortKey = (NaiveDate, DeviceCategory);

/// Cohort lookup by user plus the size of every cohort group
struct CohortIndex<'a> {
    by_user: HashMap<&'a str, &'a CohortRecord>,
    sizes: BTreeMap<CohortKey, u64>,
    period: fn(&CohortRecord) -> NaiveDate,
}

impl<'a> CohortIndex<'a> {
    fn new(cohorts: &'a [CohortRecord], period: fn(&CohortRecord) -> NaiveDate) -> Self {
        let mut by_user = HashMap::with_capacity(cohorts.len());
        let mut sizes = BTreeMap::new();
        for cohort in cohorts {
            if by_user.insert(cohort.user_id.as_str(), cohort).is_none() {
                *sizes.entry((period(cohort), cohort.device_category)).or_insert(0) += 1;
            }
        }
        Self {
            by_user,
            sizes,
            period,
        }
    }

    fn cohort(&self, user_id: &str) -> Option<&'a CohortRecord> {
        self.by_user.get(user_id).copied()
    }

    fn key(&self, cohort: &CohortRecord) -> CohortKey {
        ((self.period)(cohort), cohort.device_category)
    }

    /// Cohort groups at or above the size threshold
    fn retained(&self, min_cohort_size: u64) -> impl Iterator<Item = (CohortKey, u64)> + '_ {
        self.sizes
            .iter()
            .filter(move |(_, size)| **size >= min_cohort_size)
            .map(|(key, size)| (*key, *size))
    }

    fn suppressed(&self, min_cohort_size: u64) -> usize {
        self.sizes
            .values()
            .filter(|size| **size < min_cohort_size)
            .count()
    }
}

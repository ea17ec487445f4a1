//! Event normalizer
//!
//! Turns raw source rows into the canonical event set:
//! - partition date inside the requested range
//! - one of the four funnel event types (others dropped silently)
//! - non-null user id
//! - null device coerced to `unknown`
//! - exact duplicates collapsed
//!
//! Output is sorted by (user, timestamp) with a full-row tiebreak.

use chrono::{DateTime, NaiveDate, Utc};
use funnelscope_query::{RawEvent, parse_partition_date};
use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::event::{DeviceCategory, Event, EventType};
use crate::params::DateRange;

/// Row counts from one normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    /// Rows read from the source
    pub rows_in: usize,
    /// Rows whose partition date fell outside the range
    pub out_of_range: usize,
    /// Rows that were not funnel events
    pub other_event_type: usize,
    /// Rows without a user id
    pub missing_user: usize,
    /// Exact duplicates removed
    pub duplicates: usize,
    /// Canonical events produced
    pub rows_out: usize,
}

/// Normalize raw rows into canonical events
pub fn normalize(raw: Vec<RawEvent>, range: &DateRange) -> Result<Vec<Event>> {
    normalize_with_stats(raw, range).map(|(events, _)| events)
}

/// Normalize raw rows and report what was dropped
///
/// # Errors
///
/// A null or unparseable partition key on any row, or a missing or
/// out-of-range timestamp on a kept row, fails the whole pass.
pub fn normalize_with_stats(
    raw: Vec<RawEvent>,
    range: &DateRange,
) -> Result<(Vec<Event>, NormalizeStats)> {
    let mut stats = NormalizeStats {
        rows_in: raw.len(),
        ..Default::default()
    };
    let mut events = Vec::with_capacity(raw.len());

    for row in raw {
        let event_date = parse_event_date(row.event_date.as_deref())?;
        if !range.contains(event_date) {
            stats.out_of_range += 1;
            continue;
        }

        let Some(event_type) = row.event_type.as_deref().and_then(EventType::parse) else {
            stats.other_event_type += 1;
            continue;
        };

        let Some(user_id) = row.user_id.filter(|id| !id.is_empty()) else {
            stats.missing_user += 1;
            continue;
        };

        let timestamp = parse_timestamp(row.timestamp_micros, &user_id)?;

        events.push(Event {
            user_id,
            event_type,
            timestamp,
            event_date,
            device_category: DeviceCategory::from_source(row.device_category.as_deref()),
            purchase_revenue: row.purchase_revenue,
        });
    }

    events.sort_by(|a, b| a.key().cmp(&b.key()));
    let before_dedup = events.len();
    events.dedup_by(|a, b| a.key() == b.key());
    stats.duplicates = before_dedup - events.len();
    stats.rows_out = events.len();

    tracing::debug!(
        rows_in = stats.rows_in,
        out_of_range = stats.out_of_range,
        other_event_type = stats.other_event_type,
        missing_user = stats.missing_user,
        duplicates = stats.duplicates,
        rows_out = stats.rows_out,
        "normalized events"
    );

    Ok((events, stats))
}

fn parse_event_date(value: Option<&str>) -> Result<NaiveDate> {
    let value = value.ok_or_else(|| {
        AnalyticsError::MalformedRow("missing partition date (event_date)".to_string())
    })?;
    parse_partition_date(value).ok_or_else(|| {
        AnalyticsError::MalformedRow(format!("unparseable partition date: {:?}", value))
    })
}

fn parse_timestamp(micros: Option<i64>, user_id: &str) -> Result<DateTime<Utc>> {
    let micros = micros.ok_or_else(|| {
        AnalyticsError::MalformedRow(format!("missing timestamp for user {}", user_id))
    })?;
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        AnalyticsError::MalformedRow(format!(
            "timestamp {} out of range for user {}",
            micros, user_id
        ))
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod normalize_test;

//! Inclusive partition-date ranges
//!
//! Event logs are partitioned by calendar date. A `DateRange` selects the
//! partitions a run reads, with both endpoints included.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// An inclusive range of partition dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First partition date (inclusive)
    pub start: NaiveDate,
    /// Last partition date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a new date range
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, QueryError> {
        if end < start {
            return Err(QueryError::InvalidDateRange(format!(
                "end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range string
    ///
    /// Format: `2021-01-01,2021-01-31`. Partition-style dates
    /// (`20210101`) are accepted for either endpoint.
    pub fn parse(s: &str) -> Result<Self, QueryError> {
        let parts: Vec<&str> = s.trim().split(',').collect();
        if parts.len() != 2 {
            return Err(QueryError::InvalidDateRange(format!(
                "expected START,END but got: {}",
                s
            )));
        }

        let start = parse_partition_date(parts[0].trim()).ok_or_else(|| {
            QueryError::InvalidDateRange(format!("invalid start date: {}", parts[0].trim()))
        })?;
        let end = parse_partition_date(parts[1].trim()).ok_or_else(|| {
            QueryError::InvalidDateRange(format!("invalid end date: {}", parts[1].trim()))
        })?;

        Self::new(start, end)
    }

    /// Check whether a date falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered (both endpoints included)
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl Default for DateRange {
    /// January 2021, the span of the public GA4 e-commerce sample
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2021, 1, 31).unwrap_or(NaiveDate::MIN),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

/// Parse a partition key
///
/// Accepts `YYYYMMDD` (GA4 export style) and `YYYY-MM-DD`.
pub fn parse_partition_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[0..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

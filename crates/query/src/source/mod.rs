//! Event source trait and implementations

pub mod memory;
pub mod polars;

use async_trait::async_trait;

use crate::error::QueryError;
use crate::event::RawEvent;
use crate::range::DateRange;

/// Event source trait
///
/// Implemented by the Polars file source and the in-memory source.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Read raw event rows covering the date range
    ///
    /// Sources may prune whole partitions outside the range but are not
    /// required to filter individual rows; the normalizer does that.
    async fn scan(&self, range: &DateRange) -> Result<Vec<RawEvent>, QueryError>;

    /// Check if the source is readable
    async fn health_check(&self) -> Result<(), QueryError>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

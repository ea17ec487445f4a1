//! In-memory event source

use async_trait::async_trait;

use crate::error::QueryError;
use crate::event::RawEvent;
use crate::range::DateRange;
use crate::source::EventSource;

/// Event source backed by a vector of rows
///
/// Returns every row on each scan; range filtering is left to the normalizer.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    events: Vec<RawEvent>,
}

impl MemorySource {
    /// Create a source over the given rows
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self { events }
    }

    /// Number of rows held
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the source holds no rows
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<RawEvent> for MemorySource {
    fn from_iter<I: IntoIterator<Item = RawEvent>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl EventSource for MemorySource {
    async fn scan(&self, _range: &DateRange) -> Result<Vec<RawEvent>, QueryError> {
        Ok(self.events.clone())
    }

    async fn health_check(&self) -> Result<(), QueryError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_returns_all_rows() {
        let source: MemorySource = vec![
            RawEvent::new("u1", "view_item", 1, "20210101"),
            RawEvent::new("u2", "purchase", 2, "20210301"),
        ]
        .into_iter()
        .collect();

        assert_eq!(source.len(), 2);
        let rows = source.scan(&DateRange::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].user_id.as_deref(), Some("u2"));
    }

    #[tokio::test]
    async fn test_empty_source_is_healthy() {
        let source = MemorySource::default();
        assert!(source.is_empty());
        assert!(source.health_check().await.is_ok());
        assert_eq!(source.name(), "memory");
    }
}

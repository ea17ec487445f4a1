//! Funnelscope Query - event log access
//!
//! Provides a unified interface for reading the raw event log:
//! - **Polars**: Local Arrow IPC, Parquet or CSV files
//! - **Memory**: Rows held in memory (tests, embedding)
//!
//! # Usage
//!
//! ```ignore
//! use funnelscope_query::{DateRange, SourceConfig, build_source};
//!
//! let config = SourceConfig::local("data/events");
//! let source = build_source(&config);
//!
//! let rows = source.scan(&DateRange::parse("2021-01-01,2021-01-31")?).await?;
//! println!("Rows: {}", rows.len());
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod range;
pub mod source;

// Re-exports
pub use config::{ColumnMapping, SourceConfig, SourceFormat};
pub use error::QueryError;
pub use event::RawEvent;
pub use range::{DateRange, parse_partition_date};
pub use source::EventSource;
pub use source::memory::MemorySource;
pub use source::polars::PolarsSource;

/// Build an event source from config
///
/// A configured path selects the Polars file source; otherwise an empty
/// in-memory source is returned.
pub fn build_source(config: &SourceConfig) -> Box<dyn EventSource> {
    match &config.path {
        Some(path) => Box::new(
            PolarsSource::new(path)
                .with_format(config.format)
                .with_columns(config.columns.clone()),
        ),
        None => {
            tracing::warn!("no source path configured, using an empty in-memory source");
            Box::new(MemorySource::default())
        }
    }
}

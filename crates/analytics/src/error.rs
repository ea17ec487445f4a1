//! Analytics error types

use thiserror::Error;

/// Analytics errors
///
/// Every variant aborts the whole run. Data-quality anomalies are reported
/// as [`crate::quality::QualityWarning`] instead.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Source row that cannot be typed (bad partition key, bad timestamp)
    #[error("malformed row: {0}")]
    MalformedRow(String),

    /// Invalid analysis parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Source error (from funnelscope-query)
    #[error("source error: {0}")]
    Source(#[from] funnelscope_query::QueryError),
}

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

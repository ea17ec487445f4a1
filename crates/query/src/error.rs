//! Event source error types

/// Errors that can occur while reading the event log
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Source path does not exist
    #[error("source path not found: {0}")]
    PathNotFound(String),

    /// No data files found
    #[error("no data files found: {0}")]
    NoDataFiles(String),

    /// A required column is missing from a data file
    #[error("column '{column}' not found in {file}")]
    MissingColumn {
        /// Column name that was expected
        column: String,
        /// File that was scanned
        file: String,
    },

    /// File extension does not map to a known format
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid date range
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Polars error
    #[error("polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for QueryError {
    fn from(err: polars::error::PolarsError) -> Self {
        QueryError::Polars(err.to_string())
    }
}

impl From<glob::PatternError> for QueryError {
    fn from(err: glob::PatternError) -> Self {
        QueryError::Config(format!("invalid glob pattern: {}", err))
    }
}

impl QueryError {
    /// Create a MissingColumn error
    pub fn missing_column(column: impl Into<String>, file: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            file: file.into(),
        }
    }
}

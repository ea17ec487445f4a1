//! Event source configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::event;

/// Event source configuration
///
/// A configured `path` selects the file source; no path selects an empty
/// in-memory source (useful for dry runs and tests).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// File or directory holding the event log
    pub path: Option<PathBuf>,

    /// File format (auto-detected from extensions by default)
    pub format: SourceFormat,

    /// Source column names
    pub columns: ColumnMapping,
}

impl SourceConfig {
    /// Create config for a local file source
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Data file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Detect from file extension
    #[default]
    Auto,
    /// Arrow IPC (`.arrow`, `.ipc`)
    Ipc,
    /// Apache Parquet (`.parquet`)
    Parquet,
    /// Comma-separated values with a header row (`.csv`)
    Csv,
}

impl SourceFormat {
    /// File extensions searched for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Auto => &["arrow", "ipc", "parquet", "csv"],
            Self::Ipc => &["arrow", "ipc"],
            Self::Parquet => &["parquet"],
            Self::Csv => &["csv"],
        }
    }

    /// Detect the format of a file from its extension
    pub fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "arrow" | "ipc" => Some(Self::Ipc),
            "parquet" => Some(Self::Parquet),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Mapping from canonical fields to source column names
///
/// Defaults are the canonical names. A GA4 export flattened to files
/// typically needs `user_id = "user_pseudo_id"`, `event_type = "event_name"`
/// and `timestamp = "event_timestamp"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub user_id: String,
    pub event_type: String,
    pub timestamp: String,
    pub event_date: String,
    pub device_category: String,
    pub purchase_revenue: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            user_id: event::USER_ID.into(),
            event_type: event::EVENT_TYPE.into(),
            timestamp: event::TIMESTAMP.into(),
            event_date: event::EVENT_DATE.into(),
            device_category: event::DEVICE_CATEGORY.into(),
            purchase_revenue: event::PURCHASE_REVENUE.into(),
        }
    }
}

impl ColumnMapping {
    /// Column names of a flattened GA4 e-commerce export
    pub fn ga4() -> Self {
        Self {
            user_id: "user_pseudo_id".into(),
            event_type: "event_name".into(),
            timestamp: "event_timestamp".into(),
            ..Default::default()
        }
    }
}

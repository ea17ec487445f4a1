//! Polars source for reading local event log files
//!
//! Scans Arrow IPC, Parquet and CSV files with Polars lazy frames and
//! projects them onto the canonical raw-event columns.
//!
//! # File Organization
//!
//! `path` may point at a single file or a directory. Directories are
//! searched recursively; date-named directories are treated as partitions
//! and pruned against the requested range:
//! ```text
//! {base_path}/
//! ├── 2021-01-01/
//! │   └── events.parquet
//! ├── 20210102/
//! │   └── events.arrow
//! └── event_date=2021-01-03/
//!     └── part-0.csv
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::*;

use crate::config::{ColumnMapping, SourceFormat};
use crate::error::QueryError;
use crate::event::{self, RawEvent};
use crate::range::{DateRange, parse_partition_date};
use crate::source::EventSource;

/// Polars source for local event files
///
/// A file under a date-named directory is assumed to hold only rows of
/// that date; when the date is outside the scanned range the whole file is
/// skipped without reading its `event_date` column. Point the source at a
/// single file to read it regardless of where it lives.
#[derive(Debug, Clone)]
pub struct PolarsSource {
    /// File or directory holding the event log
    base_path: PathBuf,

    /// File format to read
    format: SourceFormat,

    /// Source column names
    columns: ColumnMapping,
}

impl PolarsSource {
    /// Create a new Polars source
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            format: SourceFormat::Auto,
            columns: ColumnMapping::default(),
        }
    }

    /// Restrict discovery to one file format
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the source column names
    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    /// Discover all data files under the base path
    fn discover_files(&self) -> Result<Vec<PathBuf>, QueryError> {
        if self.base_path.is_file() {
            return Ok(vec![self.base_path.clone()]);
        }

        if !self.base_path.is_dir() {
            return Err(QueryError::PathNotFound(
                self.base_path.display().to_string(),
            ));
        }

        let mut files = Vec::new();
        for ext in self.format.extensions() {
            let pattern = format!("{}/**/*.{}", self.base_path.display(), ext);
            files.extend(glob::glob(&pattern)?.filter_map(Result::ok));
        }
        files.sort();
        files.dedup();

        if files.is_empty() {
            return Err(QueryError::NoDataFiles(format!(
                "no {} files found under {}",
                self.format.extensions().join("/"),
                self.base_path.display()
            )));
        }

        tracing::debug!(
            path = %self.base_path.display(),
            file_count = files.len(),
            "discovered event files"
        );

        Ok(files)
    }

    /// Partition date of a file, taken from its innermost date-named directory
    fn partition_date(&self, file: &Path) -> Option<NaiveDate> {
        let relative = file.strip_prefix(&self.base_path).unwrap_or(file);
        relative.parent()?.components().rev().find_map(|component| {
            let name = component.as_os_str().to_str()?;
            // Hive-style partitions: event_date=2021-01-03
            let value = name.rsplit_once('=').map_or(name, |(_, v)| v);
            parse_partition_date(value)
        })
    }

    /// Resolve the format of a single file
    fn file_format(&self, file: &Path) -> Result<SourceFormat, QueryError> {
        match self.format {
            SourceFormat::Auto => SourceFormat::for_path(file)
                .ok_or_else(|| QueryError::UnsupportedFormat(file.display().to_string())),
            format => Ok(format),
        }
    }

    /// Create a LazyFrame for one file
    fn scan_file(&self, file: &Path) -> Result<LazyFrame, QueryError> {
        let lf = match self.file_format(file)? {
            SourceFormat::Ipc => LazyFrame::scan_ipc(file, ScanArgsIpc::default())?,
            SourceFormat::Parquet => LazyFrame::scan_parquet(file, ScanArgsParquet::default())?,
            // Every column reads as text; `project` casts timestamp and revenue
            SourceFormat::Csv => LazyCsvReader::new(file)
                .with_has_header(true)
                .with_infer_schema_length(Some(0))
                .finish()?,
            SourceFormat::Auto => {
                return Err(QueryError::UnsupportedFormat(file.display().to_string()));
            }
        };
        Ok(lf)
    }

    /// Project a file onto the canonical columns
    ///
    /// User, event type, timestamp and partition date are required.
    /// Device and revenue read as null when the file lacks them.
    fn project(&self, mut lf: LazyFrame, file: &Path) -> Result<LazyFrame, QueryError> {
        let schema = lf.collect_schema()?;
        let file_name = file.display().to_string();

        let mut exprs = Vec::with_capacity(6);

        let required = [
            (&self.columns.user_id, event::USER_ID),
            (&self.columns.event_type, event::EVENT_TYPE),
            (&self.columns.event_date, event::EVENT_DATE),
        ];
        for (source, target) in required {
            if schema.get(source).is_none() {
                return Err(QueryError::missing_column(source.as_str(), &file_name));
            }
            exprs.push(col(source.as_str()).cast(DataType::String).alias(target));
        }

        let timestamp = self.columns.timestamp.as_str();
        let timestamp_expr = match schema.get(timestamp) {
            None => return Err(QueryError::missing_column(timestamp, &file_name)),
            // Physical datetime values depend on the unit; normalize to micros first
            Some(DataType::Datetime(_, _)) => col(timestamp)
                .cast(DataType::Datetime(TimeUnit::Microseconds, None))
                .cast(DataType::Int64),
            Some(_) => col(timestamp).cast(DataType::Int64),
        };
        exprs.push(timestamp_expr.alias(event::TIMESTAMP));

        let optional = [
            (&self.columns.device_category, event::DEVICE_CATEGORY, DataType::String),
            (&self.columns.purchase_revenue, event::PURCHASE_REVENUE, DataType::Float64),
        ];
        for (source, target, dtype) in optional {
            let expr = if schema.get(source).is_some() {
                col(source.as_str()).cast(dtype)
            } else {
                tracing::debug!(column = %source, file = %file_name, "optional column missing, reading as null");
                lit(NULL).cast(dtype)
            };
            exprs.push(expr.alias(target));
        }

        Ok(lf.select(exprs))
    }
}

#[async_trait]
impl EventSource for PolarsSource {
    async fn scan(&self, range: &DateRange) -> Result<Vec<RawEvent>, QueryError> {
        let start = Instant::now();
        let files = self.discover_files()?;

        let mut events = Vec::new();
        let mut pruned = 0usize;

        for file in &files {
            if let Some(date) = self.partition_date(file)
                && !range.contains(date)
            {
                tracing::debug!(file = %file.display(), %date, "pruned partition outside range");
                pruned += 1;
                continue;
            }

            let lf = self.project(self.scan_file(file)?, file)?;
            let df = lf.collect().map_err(|e| {
                QueryError::Polars(format!("failed to read {}: {}", file.display(), e))
            })?;

            events.extend(dataframe_to_events(&df)?);
        }

        tracing::debug!(
            files = files.len(),
            pruned,
            rows = events.len(),
            time_ms = start.elapsed().as_millis() as u64,
            "scanned event files"
        );

        Ok(events)
    }

    async fn health_check(&self) -> Result<(), QueryError> {
        self.discover_files().map(|_| ())
    }

    fn name(&self) -> &'static str {
        "polars"
    }
}

/// Convert projected DataFrame rows to raw events
fn dataframe_to_events(df: &DataFrame) -> Result<Vec<RawEvent>, QueryError> {
    let user_ids = df.column(event::USER_ID)?.as_materialized_series().str()?;
    let event_types = df.column(event::EVENT_TYPE)?.as_materialized_series().str()?;
    let timestamps = df.column(event::TIMESTAMP)?.as_materialized_series().i64()?;
    let event_dates = df.column(event::EVENT_DATE)?.as_materialized_series().str()?;
    let devices = df
        .column(event::DEVICE_CATEGORY)?
        .as_materialized_series()
        .str()?;
    let revenues = df
        .column(event::PURCHASE_REVENUE)?
        .as_materialized_series()
        .f64()?;

    let mut events = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        events.push(RawEvent {
            user_id: user_ids.get(idx).map(str::to_string),
            event_type: event_types.get(idx).map(str::to_string),
            timestamp_micros: timestamps.get(idx),
            event_date: event_dates.get(idx).map(str::to_string),
            device_category: devices.get(idx).map(str::to_string),
            purchase_revenue: revenues.get(idx),
        });
    }

    Ok(events)
}

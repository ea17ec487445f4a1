//! Analysis configuration
//!
//! Mirrors [`AnalysisParams`]; every field is optional and falls back to
//! the analysis defaults.

use chrono::NaiveDate;
use funnelscope_analytics::{
    AnalysisParams, DEFAULT_COHORT_SIZE_THRESHOLD, DEFAULT_FUNNEL_WINDOW_DAYS, DateRange,
    DeviceCategory,
};
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Analysis configuration
///
/// # Example
///
/// ```toml
/// [analysis]
/// start_date = "2021-01-01"
/// end_date = "2021-01-31"
/// funnel_window_days = 30
/// cohort_size_threshold = 100
/// device_filter = "mobile"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// First partition date (inclusive)
    pub start_date: NaiveDate,

    /// Last partition date (inclusive)
    pub end_date: NaiveDate,

    /// Funnel window in days
    pub funnel_window_days: u32,

    /// Minimum cohort size for retention rows
    pub cohort_size_threshold: u64,

    /// Optional device category restriction
    pub device_filter: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let range = DateRange::default();
        Self {
            start_date: range.start,
            end_date: range.end,
            funnel_window_days: DEFAULT_FUNNEL_WINDOW_DAYS,
            cohort_size_threshold: DEFAULT_COHORT_SIZE_THRESHOLD,
            device_filter: None,
        }
    }
}

impl AnalysisConfig {
    /// Parsed device filter
    pub fn device(&self) -> Result<Option<DeviceCategory>> {
        self.device_filter
            .as_deref()
            .map(|name| {
                DeviceCategory::parse(name).ok_or_else(|| {
                    ConfigError::invalid_value(
                        "analysis",
                        "device_filter",
                        format!(
                            "unknown device '{}' (expected desktop, mobile, tablet or unknown)",
                            name
                        ),
                    )
                })
            })
            .transpose()
    }

    /// Date range
    pub fn date_range(&self) -> Result<DateRange> {
        DateRange::new(self.start_date, self.end_date).map_err(|_| {
            ConfigError::invalid_value(
                "analysis",
                "end_date",
                format!(
                    "end_date {} is before start_date {}",
                    self.end_date, self.start_date
                ),
            )
        })
    }

    /// Build analysis parameters
    pub fn to_params(&self) -> Result<AnalysisParams> {
        Ok(AnalysisParams {
            date_range: self.date_range()?,
            funnel_window_days: self.funnel_window_days,
            cohort_size_threshold: self.cohort_size_threshold,
            device_filter: self.device()?,
        })
    }
}

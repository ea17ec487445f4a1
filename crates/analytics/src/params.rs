//! Analysis parameters
//!
//! Every parameter has a default and affects output determinism.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::event::DeviceCategory;

pub use funnelscope_query::DateRange;

/// Default funnel window (`W`) in days
pub const DEFAULT_FUNNEL_WINDOW_DAYS: u32 = 30;

/// Default minimum cohort size for a retention row to be emitted
pub const DEFAULT_COHORT_SIZE_THRESHOLD: u64 = 100;

/// Parameters for one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Inclusive partition-date filter
    pub date_range: DateRange,
    /// Maximum days from first view within which every stage must land
    pub funnel_window_days: u32,
    /// Minimum cohort size for retention rows
    pub cohort_size_threshold: u64,
    /// Restrict outputs to users assigned this device category
    pub device_filter: Option<DeviceCategory>,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            date_range: DateRange::default(),
            funnel_window_days: DEFAULT_FUNNEL_WINDOW_DAYS,
            cohort_size_threshold: DEFAULT_COHORT_SIZE_THRESHOLD,
            device_filter: None,
        }
    }
}

impl AnalysisParams {
    /// Set the date range
    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }

    /// Set the funnel window in days
    pub fn with_funnel_window_days(mut self, days: u32) -> Self {
        self.funnel_window_days = days;
        self
    }

    /// Set the minimum cohort size
    pub fn with_cohort_size_threshold(mut self, threshold: u64) -> Self {
        self.cohort_size_threshold = threshold;
        self
    }

    /// Restrict to one device category
    pub fn with_device_filter(mut self, device: DeviceCategory) -> Self {
        self.device_filter = Some(device);
        self
    }

    /// The funnel window as a duration
    pub fn funnel_window(&self) -> Duration {
        Duration::days(i64::from(self.funnel_window_days))
    }

    /// Check whether a user assigned to `device` passes the device filter
    pub fn includes_device(&self, device: DeviceCategory) -> bool {
        self.device_filter.is_none_or(|filter| filter == device)
    }

    /// Validate parameter consistency
    pub fn validate(&self) -> Result<()> {
        if self.date_range.end < self.date_range.start {
            return Err(AnalyticsError::InvalidParameter(format!(
                "date range end {} is before start {}",
                self.date_range.end, self.date_range.start
            )));
        }
        if self.funnel_window_days == 0 {
            return Err(AnalyticsError::InvalidParameter(
                "funnel_window_days must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_defaults() {
        let params = AnalysisParams::default();
        assert_eq!(params.date_range.to_string(), "2021-01-01,2021-01-31");
        assert_eq!(params.funnel_window_days, 30);
        assert_eq!(params.cohort_size_threshold, 100);
        assert_eq!(params.device_filter, None);
        assert_eq!(params.funnel_window(), Duration::days(30));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_zero_window_is_invalid() {
        let params = AnalysisParams::default().with_funnel_window_days(0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_reversed_range_is_invalid() {
        let mut params = AnalysisParams::default();
        params.date_range.start = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_device_filter() {
        let params = AnalysisParams::default();
        assert!(params.includes_device(DeviceCategory::Tablet));

        let params = params.with_device_filter(DeviceCategory::Mobile);
        assert!(params.includes_device(DeviceCategory::Mobile));
        assert!(!params.includes_device(DeviceCategory::Desktop));
    }
}

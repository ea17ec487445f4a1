//! Funnelscope Analytics
//!
//! Funnel and retention analysis over a commerce event log.
//!
//! # Overview
//!
//! This crate is the analysis layer, built on top of `funnelscope-query`.
//! It includes:
//!
//! - **Normalizer**: Raw rows to canonical, deduplicated events
//! - **Funnel**: Per-user view → add → checkout → purchase progression
//! - **Retention**: Weekly cohorts and D0/D1/D7/D30 day offsets
//! - **Quality**: Post-hoc data-quality warnings
//!
//! # Usage
//!
//! ```ignore
//! use funnelscope_analytics::{AnalysisEngine, AnalysisParams, DeviceCategory};
//! use funnelscope_query::{SourceConfig, build_source};
//!
//! let source = build_source(&SourceConfig::local("data/events"));
//! let engine = AnalysisEngine::new(source);
//!
//! let params = AnalysisParams::default().with_device_filter(DeviceCategory::Mobile);
//! let report = engine.run(&params).await?;
//!
//! for point in &report.weekly_retention {
//!     println!("{} +{}w {:.1}%", point.cohort_period, point.offset, point.retention_rate * 100.0);
//! }
//! ```
//!
//! The pipeline stages are plain functions and can be used without an
//! engine:
//!
//! ```ignore
//! let events = normalize(raw_rows, &params.date_range)?;
//! let funnel = build_funnel(&events, params.funnel_window());
//! let cohorts = build_cohorts(&events);
//! let weekly = weekly_retention(&events, &cohorts, params.cohort_size_threshold);
//! ```

pub mod engine;
pub mod error;
pub mod event;
pub mod funnel;
pub mod normalize;
pub mod params;
pub mod quality;
pub mod retention;

#[cfg(test)]
mod testutil;

// Re-exports for convenience
pub use engine::{AnalysisEngine, AnalysisReport, analyze};
pub use error::{AnalyticsError, Result};
pub use event::{DeviceCategory, Event, EventType};
pub use funnel::{
    FunnelGroupSummary, FunnelStageSummary, FunnelSummary, UserFunnelRecord, build_funnel,
    summarize_funnel,
};
pub use normalize::{NormalizeStats, normalize, normalize_with_stats};
pub use params::{
    AnalysisParams, DEFAULT_COHORT_SIZE_THRESHOLD, DEFAULT_FUNNEL_WINDOW_DAYS, DateRange,
};
pub use quality::{QualityWarning, check_quality};
pub use retention::{
    CohortRecord, DAY_OFFSETS, MAX_WEEK_OFFSET, RetentionPoint, WeeklyRetention, build_cohorts,
    day_offset_retention, weekly_retention,
};

/// `part / whole`, or 0.0 for an empty whole
pub(crate) fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

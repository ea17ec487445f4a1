//! Analysis engine
//!
//! Reads raw rows from an [`EventSource`] and runs the pipeline:
//! normalize, then build the funnel and both retention tables from the
//! same canonical events.

use std::time::Instant;

use funnelscope_query::EventSource;
use serde::Serialize;

use crate::error::Result;
use crate::event::Event;
use crate::funnel::{FunnelSummary, UserFunnelRecord, build_funnel, summarize_funnel};
use crate::normalize::{NormalizeStats, normalize_with_stats};
use crate::params::AnalysisParams;
use crate::quality::{QualityWarning, check_quality};
use crate::retention::{
    CohortRecord, RetentionPoint, WeeklyRetention, build_cohorts, day_offset_retention,
};

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub params: AnalysisParams,
    pub normalize: NormalizeStats,
    pub funnel: Vec<UserFunnelRecord>,
    pub summary: FunnelSummary,
    pub weekly_retention: Vec<RetentionPoint>,
    pub day_retention: Vec<RetentionPoint>,
    /// Events left out of weekly retention for predating the cohort week
    pub negative_week_offsets: u64,
    pub warnings: Vec<QualityWarning>,
}

/// Run the analysis over already-normalized events
///
/// The device filter is applied per user after device assignment, so it
/// never changes which device a user belongs to.
pub fn analyze(events: &[Event], params: &AnalysisParams, stats: NormalizeStats) -> AnalysisReport {
    let mut funnel = build_funnel(events, params.funnel_window());
    let mut cohorts = build_cohorts(events);

    if params.device_filter.is_some() {
        funnel.retain(|r| params.includes_device(r.device_category));
        cohorts.retain(|c| params.includes_device(c.device_category));
    }

    let summary = summarize_funnel(&funnel);
    let weekly = WeeklyRetention::compute(events, &cohorts, params.cohort_size_threshold);
    let day_retention = day_offset_retention(events, &cohorts, params.cohort_size_threshold);

    let mut report = AnalysisReport {
        params: params.clone(),
        normalize: stats,
        funnel,
        summary,
        weekly_retention: weekly.points,
        day_retention,
        negative_week_offsets: weekly.negative_offset_events,
        warnings: Vec::new(),
    };

    report.warnings = check_quality(&report);
    for warning in &report.warnings {
        tracing::warn!(%warning, "data quality");
    }

    report
}

/// Analysis engine over an event source
pub struct AnalysisEngine {
    source: Box<dyn EventSource>,
}

impl AnalysisEngine {
    /// Create a new engine with a source
    pub fn new(source: Box<dyn EventSource>) -> Self {
        Self { source }
    }

    /// Get a reference to the underlying source
    pub fn source(&self) -> &dyn EventSource {
        self.source.as_ref()
    }

    /// Get the source name
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Scan and normalize the events for `params`
    pub async fn load(&self, params: &AnalysisParams) -> Result<(Vec<Event>, NormalizeStats)> {
        params.validate()?;

        let started = Instant::now();
        let raw = self.source.scan(&params.date_range).await?;
        tracing::info!(
            source = self.source.name(),
            range = %params.date_range,
            rows = raw.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scanned events"
        );

        let (events, stats) = normalize_with_stats(raw, &params.date_range)?;
        tracing::info!(
            events = events.len(),
            duplicates = stats.duplicates,
            "normalized events"
        );
        Ok((events, stats))
    }

    /// Run the full pipeline
    pub async fn run(&self, params: &AnalysisParams) -> Result<AnalysisReport> {
        let (events, stats) = self.load(params).await?;

        let started = Instant::now();
        let report = analyze(&events, params, stats);
        tracing::info!(
            users = report.funnel.len(),
            weekly_rows = report.weekly_retention.len(),
            day_rows = report.day_retention.len(),
            warnings = report.warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis complete"
        );

        Ok(report)
    }

    /// Per-user funnel table
    pub async fn funnel(&self, params: &AnalysisParams) -> Result<Vec<UserFunnelRecord>> {
        let (events, _) = self.load(params).await?;
        let mut records = build_funnel(&events, params.funnel_window());
        records.retain(|r| params.includes_device(r.device_category));
        Ok(records)
    }

    /// Weekly retention table
    pub async fn weekly_retention(&self, params: &AnalysisParams) -> Result<Vec<RetentionPoint>> {
        let (events, _) = self.load(params).await?;
        let cohorts = self.cohorts(&events, params);
        Ok(WeeklyRetention::compute(&events, &cohorts, params.cohort_size_threshold).points)
    }

    /// Day-offset retention table
    pub async fn day_offset_retention(
        &self,
        params: &AnalysisParams,
    ) -> Result<Vec<RetentionPoint>> {
        let (events, _) = self.load(params).await?;
        let cohorts = self.cohorts(&events, params);
        Ok(day_offset_retention(
            &events,
            &cohorts,
            params.cohort_size_threshold,
        ))
    }

    fn cohorts(&self, events: &[Event], params: &AnalysisParams) -> Vec<CohortRecord> {
        let mut cohorts = build_cohorts(events);
        cohorts.retain(|c| params.includes_device(c.device_category));
        cohorts
    }
}

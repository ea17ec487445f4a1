//! Command implementations

pub mod funnel;
pub mod retention;
pub mod run;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use funnelscope_analytics::{AnalysisEngine, AnalysisParams, DateRange, DeviceCategory};
use funnelscope_config::Config;
use funnelscope_query::{SourceConfig, build_source};

use crate::output::OutputFormat;

/// Arguments shared by every analysis command
///
/// Each flag overrides the matching config file value.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Event log file or directory (overrides [source] path)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Partition date range, inclusive (e.g., 2021-01-01,2021-01-31)
    #[arg(short, long)]
    pub range: Option<String>,

    /// Funnel window in days
    #[arg(short, long)]
    pub window_days: Option<u32>,

    /// Minimum cohort size for retention rows
    #[arg(short, long)]
    pub min_cohort_size: Option<u64>,

    /// Restrict to one device category (desktop, mobile, tablet, unknown)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Also write the output tables as CSV files into this directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

impl AnalysisArgs {
    /// Parse the output format
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.format
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid format: {}", e))
    }

    /// Merge flags over the config file's analysis section
    pub fn params(&self, config: &Config) -> Result<AnalysisParams> {
        let mut params = config
            .analysis
            .to_params()
            .context("invalid [analysis] config")?;

        if let Some(range) = &self.range {
            params.date_range = DateRange::parse(range).context("invalid --range")?;
        }
        if let Some(days) = self.window_days {
            params.funnel_window_days = days;
        }
        if let Some(size) = self.min_cohort_size {
            params.cohort_size_threshold = size;
        }
        if let Some(device) = &self.device {
            let device = DeviceCategory::parse(device).ok_or_else(|| {
                anyhow::anyhow!(
                    "invalid --device '{}' (expected desktop, mobile, tablet or unknown)",
                    device
                )
            })?;
            params.device_filter = Some(device);
        }

        params.validate().context("invalid analysis parameters")?;
        Ok(params)
    }

    /// Source config with the --source override applied
    pub fn source_config(&self, config: &Config) -> SourceConfig {
        let mut source = config.source.clone();
        if let Some(path) = &self.source {
            source.path = Some(path.clone());
        }
        source
    }

    /// Build an engine over the configured source
    pub fn engine(&self, config: &Config) -> AnalysisEngine {
        AnalysisEngine::new(build_source(&self.source_config(config)))
    }
}

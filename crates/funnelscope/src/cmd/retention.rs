//! Retention command - cohort retention tables
//!
//! # Usage
//!
//! ```bash
//! # Weekly cohorts, weeks 0..=8
//! funnelscope retention weekly --source data/events
//!
//! # Monthly cohorts at D0/D1/D7/D30
//! funnelscope retention daily --source data/events --min-cohort-size 50 --device mobile
//! ```

use std::io;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use funnelscope_analytics::RetentionPoint;
use funnelscope_config::Config;

use super::AnalysisArgs;
use crate::output::{self, OutputFormat};

/// Retention command arguments
#[derive(Args, Debug)]
pub struct RetentionArgs {
    #[command(subcommand)]
    pub command: RetentionCommand,
}

#[derive(Subcommand, Debug)]
pub enum RetentionCommand {
    /// Weekly cohorts (Monday-aligned), offsets 0 to 8 weeks
    Weekly(AnalysisArgs),

    /// Monthly cohorts at day offsets 0, 1, 7 and 30
    Daily(AnalysisArgs),
}

/// Run the retention command
pub async fn run(args: RetentionArgs, config: &Config) -> Result<()> {
    let (analysis, weekly) = match &args.command {
        RetentionCommand::Weekly(analysis) => (analysis, true),
        RetentionCommand::Daily(analysis) => (analysis, false),
    };

    let format = analysis.output_format()?;
    let params = analysis.params(config)?;
    let engine = analysis.engine(config);

    let points = if weekly {
        engine
            .weekly_retention(&params)
            .await
            .context("weekly retention failed")?
    } else {
        engine
            .day_offset_retention(&params)
            .await
            .context("day-offset retention failed")?
    };

    let (offset_label, file_name) = if weekly {
        ("Week", output::WEEKLY_RETENTION_CSV)
    } else {
        ("Day", output::DAY_RETENTION_CSV)
    };

    print_points(&points, format, offset_label)?;

    if let Some(dir) = &analysis.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
        output::write_file(&dir.join(file_name), |out| output::retention_csv(out, &points))?;
    }

    Ok(())
}

fn print_points(points: &[RetentionPoint], format: OutputFormat, offset_label: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Json => output::write_json(&mut out, points)?,
        OutputFormat::Csv => output::retention_csv(&mut out, points)?,
        OutputFormat::Table => output::retention_table(&mut out, points, offset_label)?,
    }
    Ok(())
}

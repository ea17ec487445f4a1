//! Validate command - data-quality checks
//!
//! Runs the full pipeline and reports quality warnings. Exits non-zero
//! when any warning is found, so it can gate a reporting job.
//!
//! # Usage
//!
//! ```bash
//! funnelscope validate --config funnelscope.toml
//! funnelscope validate --source data/events --format json
//! ```

use std::io;

use anyhow::{Context, Result};
use clap::Args;
use funnelscope_config::Config;

use super::AnalysisArgs;
use crate::output::{self, OutputFormat};

/// Validate command arguments
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Run the validate command
pub async fn run(args: ValidateArgs, config: &Config) -> Result<()> {
    let format = args.analysis.output_format()?;
    let params = args.analysis.params(config)?;
    let engine = args.analysis.engine(config);

    engine
        .source()
        .health_check()
        .await
        .context("event source is not readable")?;

    let report = engine.run(&params).await.context("analysis failed")?;

    {
        let mut out = io::stdout().lock();
        match format {
            OutputFormat::Json => output::write_json(&mut out, &report.warnings)?,
            OutputFormat::Csv => output::warnings_csv(&mut out, &report.warnings)?,
            OutputFormat::Table => output::warnings_table(&mut out, &report.warnings)?,
        }
    }

    if let Some(dir) = &args.analysis.out_dir {
        output::write_csv_files(dir, &report)?;
    }

    if !report.warnings.is_empty() {
        anyhow::bail!("{} data-quality warning(s) found", report.warnings.len());
    }

    eprintln!(
        "checked {} users, {} weekly and {} day-offset rows [{}]",
        report.funnel.len(),
        report.weekly_retention.len(),
        report.day_retention.len(),
        engine.source_name()
    );
    Ok(())
}

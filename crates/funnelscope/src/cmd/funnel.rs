//! Funnel command - per-user funnel progression
//!
//! # Usage
//!
//! ```bash
//! funnelscope funnel --source data/events
//! funnelscope funnel --source data/events --window-days 7 --format csv
//! funnelscope funnel --source data/events --summary
//! ```

use std::io;

use anyhow::{Context, Result};
use clap::Args;
use funnelscope_analytics::summarize_funnel;
use funnelscope_config::Config;

use super::AnalysisArgs;
use crate::output::{self, OutputFormat};

/// Funnel command arguments
#[derive(Args, Debug)]
pub struct FunnelArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Print stage counts and conversion rates instead of per-user rows
    #[arg(long)]
    pub summary: bool,
}

/// Run the funnel command
pub async fn run(args: FunnelArgs, config: &Config) -> Result<()> {
    let format = args.analysis.output_format()?;
    let params = args.analysis.params(config)?;
    let engine = args.analysis.engine(config);

    let records = engine
        .funnel(&params)
        .await
        .context("funnel analysis failed")?;

    let mut out = io::stdout().lock();
    if args.summary {
        let summary = summarize_funnel(&records);
        match format {
            OutputFormat::Json => output::write_json(&mut out, &summary)?,
            OutputFormat::Csv => output::summary_csv(&mut out, &summary)?,
            OutputFormat::Table => output::summary_table(&mut out, &summary)?,
        }
    } else {
        match format {
            OutputFormat::Json => output::write_json(&mut out, &records)?,
            OutputFormat::Csv => output::funnel_csv(&mut out, &records)?,
            OutputFormat::Table => output::funnel_table(&mut out, &records)?,
        }
    }

    if let Some(dir) = &args.analysis.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
        output::write_file(&dir.join(output::FUNNEL_CSV), |out| {
            output::funnel_csv(out, &records)
        })?;
    }

    Ok(())
}

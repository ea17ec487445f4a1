//! Run command - full analysis report
//!
//! # Usage
//!
//! ```bash
//! funnelscope run --source data/events
//! funnelscope run --source data/events --format json > report.json
//! funnelscope run --source data/events --out-dir reports/2021-01
//! ```

use std::io;

use anyhow::{Context, Result};
use clap::Args;
use funnelscope_config::Config;

use super::AnalysisArgs;
use crate::output;

/// Run command arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Run the full analysis and print the report
pub async fn run(args: RunArgs, config: &Config) -> Result<()> {
    let format = args.analysis.output_format()?;
    let params = args.analysis.params(config)?;
    let engine = args.analysis.engine(config);

    let report = engine.run(&params).await.context("analysis failed")?;

    output::report(&mut io::stdout().lock(), &report, format)?;

    if let Some(dir) = &args.analysis.out_dir {
        output::write_csv_files(dir, &report)?;
    }

    Ok(())
}

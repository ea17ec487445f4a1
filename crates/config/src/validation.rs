//! Configuration validation
//!
//! Validates config consistency:
//! - Analysis date range is ordered
//! - Funnel window is positive
//! - Device filter names a known category
//! - Source path, when set, is not empty

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_analysis(config)?;
    validate_source(config)?;
    Ok(())
}

fn validate_analysis(config: &Config) -> Result<()> {
    let analysis = &config.analysis;

    analysis.date_range()?;

    if analysis.funnel_window_days == 0 {
        return Err(ConfigError::invalid_value(
            "analysis",
            "funnel_window_days",
            "must be greater than 0",
        ));
    }

    analysis.device()?;
    Ok(())
}

fn validate_source(config: &Config) -> Result<()> {
    if let Some(path) = &config.source.path
        && path.as_os_str().is_empty()
    {
        return Err(ConfigError::invalid_value("source", "path", "must not be empty"));
    }

    let columns = &config.source.columns;
    for (field, name) in [
        ("columns.user_id", &columns.user_id),
        ("columns.event_type", &columns.event_type),
        ("columns.timestamp", &columns.timestamp),
        ("columns.event_date", &columns.event_date),
    ] {
        if name.trim().is_empty() {
            return Err(ConfigError::invalid_value("source", field, "must not be empty"));
        }
    }

    Ok(())
}

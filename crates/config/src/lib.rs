//! Funnelscope Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid config: January 2021, a 30-day funnel window,
//! cohorts of at least 100 users and no device filter.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use funnelscope_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[analysis]\nfunnel_window_days = 7").unwrap();
//! assert_eq!(config.analysis.funnel_window_days, 7);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [source]
//! path = "data/events"
//! format = "parquet"
//!
//! [source.columns]
//! user_id = "user_pseudo_id"
//! event_type = "event_name"
//! timestamp = "event_timestamp"
//!
//! [analysis]
//! start_date = "2021-01-01"
//! end_date = "2021-01-31"
//! device_filter = "mobile"
//! ```

mod analysis;
mod error;
mod logging;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use analysis::AnalysisConfig;
pub use error::{ConfigError, Result};
pub use funnelscope_query::{ColumnMapping, SourceConfig, SourceFormat};
pub use logging::{LogConfig, LogFormat, LogLevel};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Event log location and column mapping
    pub source: SourceConfig,

    /// Analysis parameters
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnelscope_analytics::{AnalysisParams, DeviceCategory};
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.log.level, LogLevel::Info);
        assert!(config.source.path.is_none());
        assert_eq!(config.source.format, SourceFormat::Auto);
        assert_eq!(config.analysis.to_params().unwrap(), AnalysisParams::default());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"

[source]
path = "data/events"
format = "parquet"

[source.columns]
user_id = "user_pseudo_id"
event_type = "event_name"

[analysis]
start_date = "2021-01-04"
end_date = "2021-01-17"
funnel_window_days = 14
cohort_size_threshold = 50
device_filter = "desktop"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(
            config.source.path.as_deref(),
            Some(Path::new("data/events"))
        );
        assert_eq!(config.source.format, SourceFormat::Parquet);
        assert_eq!(config.source.columns.user_id, "user_pseudo_id");
        assert_eq!(config.source.columns.timestamp, "timestamp");

        let params = config.analysis.to_params().unwrap();
        assert_eq!(params.date_range.days(), 14);
        assert_eq!(params.funnel_window_days, 14);
        assert_eq!(params.cohort_size_threshold, 50);
        assert_eq!(params.device_filter, Some(DeviceCategory::Desktop));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_unknown_source_format() {
        assert!(Config::from_str("[source]\nformat = \"xlsx\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\ncohort_size_threshold = 5").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.analysis.cohort_size_threshold, 5);
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/funnelscope.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}

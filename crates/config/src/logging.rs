//! Logging configuration
//!
//! Reports are written to stdout, so logs always go to stderr and there is
//! no output setting. The level applies to funnelscope's own crates; every
//! other crate is capped at `warn`.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Crates whose logs follow the configured level
const OWN_CRATES: [&str; 4] = [
    "funnelscope",
    "funnelscope_query",
    "funnelscope_analytics",
    "funnelscope_config",
];

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-file scan and pruning detail
    Trace,
    Debug,
    /// Stage timings and row counts
    #[default]
    Info,
    /// Data-quality warnings only
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `EnvFilter` directive for this level
    ///
    /// Below `warn`, only funnelscope crates get the extra verbosity.
    pub fn directive(&self) -> String {
        if *self >= Self::Warn {
            return self.as_str().to_string();
        }
        let mut directive = String::from("warn");
        for name in OWN_CRATES {
            directive.push_str(&format!(",{}={}", name, self.as_str()));
        }
        directive
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown log level '{}' (expected trace, debug, info, warn or error)",
                other
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Log line format on stderr
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    /// One JSON object per line, for piping into log collectors
    Json,
}

/// `[log]` section
///
/// ```toml
/// [log]
/// level = "debug"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

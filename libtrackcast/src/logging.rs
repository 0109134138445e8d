//! Logging setup shared by the track-* binaries
//!
//! Everything goes to stderr; stdout is reserved for documents, post ids
//! and JSON output. `TRACKCAST_LOG_FORMAT` (`text`, `json`, `pretty`) and
//! `TRACKCAST_LOG_LEVEL` override the binary's defaults, `RUST_LOG` wins
//! over both, and `--verbose` forces `debug`.
//!
//! ```no_run
//! use libtrackcast::logging::LoggingConfig;
//!
//! LoggingConfig::from_env("warn", false).init();
//! ```

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

pub const FORMAT_ENV: &str = "TRACKCAST_LOG_FORMAT";
pub const LEVEL_ENV: &str = "TRACKCAST_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain lines without colors
    #[default]
    Text,
    /// One JSON object per event
    Json,
    /// Multi-line, colored, with source locations
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    /// Read the `TRACKCAST_LOG_*` variables, falling back to text at `default_level`
    ///
    /// An unparseable format is ignored rather than reported, since logging
    /// is not set up yet.
    pub fn from_env(default_level: &str, verbose: bool) -> Self {
        let format = std::env::var(FORMAT_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let level = std::env::var(LEVEL_ENV)
            .ok()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| default_level.to_string());

        Self {
            format,
            level,
            verbose,
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
        }
    }

    /// Install the global subscriber
    ///
    /// # Panics
    ///
    /// Panics if a subscriber is already installed.
    pub fn init(&self) {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr);

        match self.format {
            LogFormat::Text => builder.with_target(false).with_ansi(false).init(),
            LogFormat::Json => builder.json().flatten_event(true).init(),
            LogFormat::Pretty => builder.pretty().with_file(true).with_line_number(true).init(),
        }
    }
}

//! Logging setup using `tracing-subscriber`.
//!
//! Logs go to stderr so that command output on stdout stays clean.
//!
//! # Log Levels
//!
//! - `warn`: dependencies, and this workspace unless `-v` is given
//! - `info`: file hashes, summary counts
//! - `debug`: per-column and per-rule details
//! - `trace`: everything
//!
//! `RUST_LOG` overrides the level derived from `-v`.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for the framecheck crates.
    pub level: Level,
    /// Whether to use ANSI colors.
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// - 0 (no `-v`): info
    /// - 1 (`-v`): debug
    /// - 2+ (`-vv`): trace
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            ..Default::default()
        }
    }

    /// Filter directives for this config, used when `RUST_LOG` is unset.
    pub fn directives(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        format!("warn,framecheck={level},framecheck_cli={level}")
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();

    // A second call (e.g. from tests) leaves the first subscriber in place.
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}

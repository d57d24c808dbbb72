//! Logging initialization.
//!
//! Logs go to stderr so stdout stays free for command output. The level comes
//! from `[logging].level`, raised to DEBUG by `--verbose`; a set `RUST_LOG`
//! replaces both.

use std::str::FromStr;

use thumbvault_core::config::LoggingConfig;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Resolved subscriber settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub json: bool,
}

impl LogSettings {
    /// Combine the `[logging]` section with the global CLI flags.
    ///
    /// An unrecognized level falls back to INFO; `Config::validate` rejects
    /// those in files that load successfully.
    pub fn resolve(config: &LoggingConfig, verbose: bool, json_logs: bool) -> Self {
        let mut level = LevelFilter::from_str(config.level.trim()).unwrap_or(LevelFilter::INFO);
        if verbose && level < LevelFilter::DEBUG {
            level = LevelFilter::DEBUG;
        }
        Self {
            level,
            json: json_logs || config.format == "json",
        }
    }

    fn env_filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(self.level.into()))
    }
}

/// Install the global subscriber.
pub fn init(settings: LogSettings) {
    let filter = settings.env_filter();

    if settings.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

//! Structured Logger
//!
//! Wraps `tracing` with a console layer, an optional daily-rolling JSON file
//! layer, and `RUST_LOG` override of the configured level.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Rolling file prefix: `discore.log.YYYY-MM-DD`.
const LOG_FILE_NAME: &str = "discore.log";

/// Initialize the global subscriber.
///
/// Returns an error only when `level` is not a valid filter directive. A
/// subscriber that is already installed is left in place.
pub fn init_logger(level: &str, log_dir: Option<&Path>) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level directive: {level}"))?,
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    let file_layer = log_dir.map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
        fmt::layer()
            .json()
            .with_writer(appender)
            .with_ansi(false)
            .boxed()
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

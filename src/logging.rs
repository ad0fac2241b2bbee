// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The subscriber is built from the `[log]` config section:
//! - `level`: maximum level emitted
//! - `format`: `console` (human readable) or `json`
//! - `color`: ANSI colours on/off
//!
//! Logs are sent to STDERR so that stdout carries only the output of the
//! tools being run.

use anyhow::{Result, anyhow};
use tracing_subscriber::fmt;

use crate::config::LogConfig;
use crate::types::LogFormat;

/// Install the global subscriber described by `cfg`.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(cfg: &LogConfig) -> Result<()> {
    let builder = fmt()
        .with_max_level(tracing::Level::from(cfg.level))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(cfg.color)
        .with_writer(std::io::stderr);

    let installed = match cfg.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Console => builder.try_init(),
    };
    installed.map_err(|e| anyhow!("initialising logging: {e}"))
}

/// Install a default console subscriber unless one is already installed.
///
/// Used when the run fails before the configured subscriber exists, so the
/// failure still gets logged.
pub fn ensure_default_logging() {
    let _ = init_logging(&LogConfig::default());
}

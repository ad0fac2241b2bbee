// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag is optional: with no arguments the run is driven entirely by
//! the config file, environment variables and defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Overrides;
use crate::types::LogLevel;

/// Command-line arguments for `boot-k8s-cluster`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "boot-k8s-cluster",
    version,
    about = "Provision a managed Kubernetes cluster with terragrunt and install external-secrets with helm.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: the first of `configs/config.toml`, `config.toml`; running
    /// without any file is allowed.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Plan only: skip every mutating command.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// Overrides `log.level` and `LOG_LEVEL`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// The configuration layer these flags contribute.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            dry_run: self.dry_run,
            log_level: self.log_level,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

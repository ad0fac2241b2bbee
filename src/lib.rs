// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod types;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::errors::Result;
use crate::exec::{RealExecutor, RunScope};
use crate::pipeline::Pipeline;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - layered config loading
/// - logging
/// - the run scope (overall deadline + Ctrl-C cancellation)
/// - the pipeline, executed with real processes
pub async fn run(args: CliArgs) -> Result<()> {
    let loaded = config::load(&args.overrides())?;
    let cfg = &loaded.config;

    logging::init_logging(&cfg.log)?;
    match &loaded.source {
        Some(path) => info!(path = %path.display(), "config loaded"),
        None => info!("no config file found, using defaults + env"),
    }
    debug!(config = ?cfg, "effective configuration");

    let scope = RunScope::with_timeout(cfg.timeout);

    // Ctrl-C → cancel whatever command is running.
    {
        let scope = scope.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            warn!("interrupt received; cancelling run");
            scope.cancel();
        });
    }

    let pipeline = Pipeline::new(cfg, &RealExecutor, scope);
    pipeline.run().await
}

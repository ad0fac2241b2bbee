// src/pipeline/cluster.rs

//! Provision-cluster step.

use tracing::debug;

use crate::config::Config;
use crate::errors::{BootError, ExecError, Result};
use crate::pipeline::Pipeline;
use crate::pipeline::terragrunt::{self, ApplyOutcome, ModuleContext};
use crate::types::PlanFailurePolicy;

pub const CLUSTER_MODULE: &str = "k8s-cluster";

pub fn cluster_module(cfg: &Config) -> ModuleContext {
    let mut extra_args = Vec::new();
    if !cfg.color_enabled() {
        extra_args.push("--no-color".to_string());
    }
    ModuleContext::from_config(cfg, CLUSTER_MODULE, extra_args)
}

/// Plan, then apply (or skip in dry-run) the cluster module.
///
/// With `terragrunt.plan_failure = "continue"` a plan that ran and failed is
/// logged at debug level and apply still runs. A plan that could not run at
/// all (binary missing, bad invocation, spawn or pipe failure) or was
/// interrupted always aborts.
pub async fn provision_cluster(pipeline: &Pipeline<'_>) -> Result<ApplyOutcome> {
    let module = cluster_module(pipeline.config());

    if let Err(err) = terragrunt::plan(pipeline, &module).await {
        match pipeline.config().terragrunt.plan_failure {
            PlanFailurePolicy::Continue if plan_ran_and_failed(&err) => {
                debug!(error = %err, "recovering from terragrunt plan failure");
            }
            _ => return Err(err),
        }
    }

    terragrunt::apply_or_skip(pipeline, &module).await
}

fn plan_ran_and_failed(err: &BootError) -> bool {
    match err {
        BootError::Step { source, .. } | BootError::Exec(source) => matches!(
            source,
            ExecError::Failed { .. } | ExecError::Signaled { .. }
        ),
        _ => false,
    }
}

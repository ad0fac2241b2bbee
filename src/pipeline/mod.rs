// src/pipeline/mod.rs

//! The two fixed deployment steps and the driver that runs them in order.
//!
//! - [`cluster`] provisions the Kubernetes cluster (terragrunt plan + apply).
//! - [`secrets`] configures the external-secrets operator (terragrunt plan +
//!   apply, then `helm template` and `helm upgrade`).
//! - [`terragrunt`] holds the module context and plan / apply stages shared by
//!   both steps.
//!
//! Every failure is fatal to the run; completed steps are not rolled back.

pub mod cluster;
pub mod secrets;
pub mod terragrunt;

use tracing::{Instrument, info, info_span};

use crate::config::Config;
use crate::errors::{BootError, Result};
use crate::exec::{CommandExecutor, CommandSpec, RunScope};

pub use terragrunt::{ApplyOutcome, ModuleContext};

pub struct Pipeline<'a> {
    config: &'a Config,
    executor: &'a dyn CommandExecutor,
    scope: RunScope,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, executor: &'a dyn CommandExecutor, scope: RunScope) -> Self {
        Self {
            config,
            executor,
            scope,
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn scope(&self) -> &RunScope {
        &self.scope
    }

    /// Start a command bound to the run's scope.
    pub fn command(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program).scope(self.scope.clone())
    }

    /// Run `spec`, tagging a failure with the stage name.
    pub async fn execute(&self, stage: &'static str, spec: CommandSpec) -> Result<()> {
        self.executor
            .execute(spec)
            .await
            .map_err(|source| BootError::Step {
                step: stage,
                source,
            })
    }

    /// Provision the cluster, then configure the secrets operator.
    pub async fn run(&self) -> Result<()> {
        info!(
            environment = %self.config.environment,
            dry_run = self.config.dry_run,
            "starting pipeline"
        );

        cluster::provision_cluster(self)
            .instrument(info_span!("step", name = "provision-cluster"))
            .await?;
        secrets::configure_secrets_operator(self)
            .instrument(info_span!("step", name = "configure-secrets-operator"))
            .await?;

        info!("pipeline finished");
        Ok(())
    }
}

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use boot_k8s_cluster::config::{Config, RawConfigFile};
use boot_k8s_cluster::types::PlanFailurePolicy;

/// Builder for `Config` to simplify test setup.
///
/// Starts from the built-in defaults with `environment = "dev"` and
/// `terragrunt.root_path = "/infra/live"` so the result always validates.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.environment = "dev".to_string();
        config.terragrunt.root_path = PathBuf::from("/infra/live");
        Self { config }
    }

    pub fn environment(mut self, env: &str) -> Self {
        self.config.environment = env.to_string();
        self
    }

    pub fn dry_run(mut self, val: bool) -> Self {
        self.config.dry_run = val;
        self
    }

    pub fn root_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.terragrunt.root_path = path.as_ref().to_path_buf();
        self
    }

    pub fn base_modules_path(mut self, base: &str) -> Self {
        self.config.terragrunt.base_modules_path = Some(base.to_string());
        self
    }

    pub fn plan_failure(mut self, policy: PlanFailurePolicy) -> Self {
        self.config.terragrunt.plan_failure = policy;
        self
    }

    pub fn color(mut self, val: bool) -> Self {
        self.config.log.color = val;
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.config.timeout = timeout.to_string();
        self
    }

    pub fn build(self) -> Config {
        Config::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

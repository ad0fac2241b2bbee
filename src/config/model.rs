// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{LogFormat, LogLevel, PlanFailurePolicy};

/// Configuration as read from the TOML file, before validation.
///
/// ```toml
/// environment = "dev"
/// dry_run = false
/// timeout = "10m"
///
/// [log]
/// level = "info"
/// format = "console"
/// color = true
///
/// [terragrunt]
/// root_path = "infra/live"
/// base_modules_path = "git::https://example.com/modules.git"
///
/// [secrets_operator]
/// kube_context = "do-sfo2-dev"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Environment directory under `terragrunt.root_path` (e.g. `"dev"`).
    #[serde(default)]
    pub environment: String,

    #[serde(default, alias = "dry-run")]
    pub dry_run: bool,

    /// Deadline for the whole run, e.g. `"10m"`.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Where generated artifacts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub terragrunt: TerragruntConfig,

    #[serde(default)]
    pub secrets_operator: SecretsOperatorConfig,
}

fn default_timeout() -> String {
    "10m".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            environment: String::new(),
            dry_run: false,
            timeout: default_timeout(),
            output_dir: default_output_dir(),
            log: LogConfig::default(),
            terragrunt: TerragruntConfig::default(),
            secrets_operator: SecretsOperatorConfig::default(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            color: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[terragrunt]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TerragruntConfig {
    /// Root of the live configuration tree; modules live under
    /// `<root_path>/<environment>/<module>`.
    #[serde(default)]
    pub root_path: PathBuf,

    /// When set, every module is planned/applied with
    /// `--source <base_modules_path>//<module>`.
    #[serde(default)]
    pub base_modules_path: Option<String>,

    #[serde(default)]
    pub plan_failure: PlanFailurePolicy,

    #[serde(default)]
    pub log: TerragruntLogConfig,
}

impl Default for TerragruntConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::new(),
            base_modules_path: None,
            plan_failure: PlanFailurePolicy::default(),
            log: TerragruntLogConfig::default(),
        }
    }
}

/// `[terragrunt.log]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TerragruntLogConfig {
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for TerragruntLogConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

/// `[secrets_operator]` section: terragrunt feature flags for the
/// external-secrets module.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretsOperatorConfig {
    #[serde(default = "default_state_path_prefix")]
    pub state_path_prefix: String,

    #[serde(default = "default_kube_context")]
    pub kube_context: String,
}

fn default_state_path_prefix() -> String {
    "do-k8s".to_string()
}

fn default_kube_context() -> String {
    "do-sfo2-dev-leonomano-projects".to_string()
}

impl Default for SecretsOperatorConfig {
    fn default() -> Self {
        Self {
            state_path_prefix: default_state_path_prefix(),
            kube_context: default_kube_context(),
        }
    }
}

/// Validated configuration used by the rest of the application.
///
/// Built from a [`RawConfigFile`] with `Config::try_from`.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub dry_run: bool,
    pub timeout: Duration,
    pub output_dir: PathBuf,
    pub log: LogConfig,
    pub terragrunt: TerragruntConfig,
    pub secrets_operator: SecretsOperatorConfig,
}

impl Config {
    /// Whether tool output should be colourised.
    pub fn color_enabled(&self) -> bool {
        self.log.color && self.terragrunt.log.color
    }
}

// src/config/loader.rs

//! Layered configuration loading.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, environment
//! variables, command-line overrides. Environment variable names are the
//! config keys with `.` replaced by `_`, upper-cased (`log.level` becomes
//! `LOG_LEVEL`).

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::model::{Config, RawConfigFile};
use crate::errors::{BootError, Result};
use crate::types::LogLevel;

/// Files searched, in order, when no explicit path is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["configs/config.toml", "config.toml"];

/// Every key that can be overridden from the environment.
pub const OVERRIDABLE_KEYS: &[&str] = &[
    "environment",
    "dry_run",
    "timeout",
    "output_dir",
    "log.level",
    "log.format",
    "log.color",
    "terragrunt.root_path",
    "terragrunt.base_modules_path",
    "terragrunt.plan_failure",
    "terragrunt.log.color",
    "secrets_operator.state_path_prefix",
    "secrets_operator.kube_context",
];

/// Top layer, usually filled from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Explicit config file; it must exist.
    pub config_path: Option<PathBuf>,
    /// Force dry-run on.
    pub dry_run: bool,
    pub log_level: Option<LogLevel>,
}

/// A validated config plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// The file that was read, `None` when running on defaults + env.
    pub source: Option<PathBuf>,
}

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** apply env
/// overrides or validate.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load every layer using the process environment.
pub fn load(overrides: &Overrides) -> Result<LoadedConfig> {
    load_with_env(overrides, |key| std::env::var(key).ok())
}

/// Load every layer, reading environment variables through `env`.
pub fn load_with_env<F>(overrides: &Overrides, env: F) -> Result<LoadedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let source = match &overrides.config_path {
        Some(path) if !path.is_file() => {
            return Err(BootError::ConfigError(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        Some(path) => Some(path.clone()),
        None => discover_config_file(Path::new(".")),
    };

    let mut raw = match &source {
        Some(path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };

    apply_env_overrides(&mut raw, env)?;
    apply_overrides(&mut raw, overrides);

    let config = Config::try_from(raw)?;
    Ok(LoadedConfig { config, source })
}

/// First existing entry of [`DEFAULT_CONFIG_PATHS`] under `base`.
pub fn discover_config_file(base: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_PATHS
        .iter()
        .map(|rel| base.join(rel))
        .find(|path| path.is_file())
}

/// Environment variable consulted for a config key.
pub fn env_key(key: &str) -> String {
    key.replace('.', "_").to_uppercase()
}

pub fn apply_env_overrides<F>(raw: &mut RawConfigFile, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    for key in OVERRIDABLE_KEYS {
        let var = env_key(key);
        if let Some(value) = env(&var) {
            set_key(raw, key, &value).map_err(|e| {
                BootError::ConfigError(format!("environment variable {var}: {e}"))
            })?;
        }
    }
    Ok(())
}

fn apply_overrides(raw: &mut RawConfigFile, overrides: &Overrides) {
    if overrides.dry_run {
        raw.dry_run = true;
    }
    if let Some(level) = overrides.log_level {
        raw.log.level = level;
    }
}

/// Set one dotted key from its string form.
pub fn set_key(raw: &mut RawConfigFile, key: &str, value: &str) -> std::result::Result<(), String> {
    match key {
        "environment" => raw.environment = value.to_string(),
        "dry_run" => raw.dry_run = parse_bool(value)?,
        "timeout" => raw.timeout = value.to_string(),
        "output_dir" => raw.output_dir = PathBuf::from(value),
        "log.level" => raw.log.level = parse_enum(value)?,
        "log.format" => raw.log.format = parse_enum(value)?,
        "log.color" => raw.log.color = parse_bool(value)?,
        "terragrunt.root_path" => raw.terragrunt.root_path = PathBuf::from(value),
        "terragrunt.base_modules_path" => {
            raw.terragrunt.base_modules_path = Some(value.to_string())
        }
        "terragrunt.plan_failure" => raw.terragrunt.plan_failure = parse_enum(value)?,
        "terragrunt.log.color" => raw.terragrunt.log.color = parse_bool(value)?,
        "secrets_operator.state_path_prefix" => {
            raw.secrets_operator.state_path_prefix = value.to_string()
        }
        "secrets_operator.kube_context" => raw.secrets_operator.kube_context = value.to_string(),
        other => return Err(format!("unknown configuration key `{other}`")),
    }
    Ok(())
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("invalid boolean {other:?}")),
    }
}

fn parse_enum<T>(value: &str) -> std::result::Result<T, String>
where
    T: FromStr<Err = String>,
{
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogFormat;

    #[test]
    fn env_key_replaces_dots_and_uppercases() {
        assert_eq!(env_key("log.level"), "LOG_LEVEL");
        assert_eq!(env_key("terragrunt.root_path"), "TERRAGRUNT_ROOT_PATH");
        assert_eq!(env_key("terragrunt.log.color"), "TERRAGRUNT_LOG_COLOR");
        assert_eq!(env_key("dry_run"), "DRY_RUN");
    }

    #[test]
    fn every_overridable_key_is_settable() {
        let mut raw = RawConfigFile::default();
        for key in OVERRIDABLE_KEYS {
            let value = match *key {
                "dry_run" | "log.color" | "terragrunt.log.color" => "true",
                "log.level" => "debug",
                "log.format" => "json",
                "terragrunt.plan_failure" => "continue",
                "timeout" => "5m",
                _ => "x",
            };
            assert_eq!(set_key(&mut raw, key, value), Ok(()), "key {key}");
        }
        assert_eq!(raw.log.format, LogFormat::Json);
    }

    #[test]
    fn bad_env_value_names_the_variable() {
        let mut raw = RawConfigFile::default();
        let err = apply_env_overrides(&mut raw, |k| (k == "LOG_COLOR").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, BootError::ConfigError(msg) if msg.contains("LOG_COLOR")));
    }

    #[test]
    fn discovery_prefers_configs_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(discover_config_file(tmp.path()), None);

        std::fs::write(tmp.path().join("config.toml"), "").unwrap();
        assert_eq!(
            discover_config_file(tmp.path()),
            Some(tmp.path().join("config.toml"))
        );

        std::fs::create_dir(tmp.path().join("configs")).unwrap();
        std::fs::write(tmp.path().join("configs/config.toml"), "").unwrap();
        assert_eq!(
            discover_config_file(tmp.path()),
            Some(tmp.path().join("configs/config.toml"))
        );
    }
}

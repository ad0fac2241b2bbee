// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{Config, RawConfigFile};
use crate::errors::{BootError, Result};

impl TryFrom<RawConfigFile> for Config {
    type Error = BootError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let timeout = parse_duration(&raw.timeout)
            .map_err(|e| BootError::ConfigError(format!("timeout: {e}")))?;

        let mut terragrunt = raw.terragrunt;
        terragrunt.base_modules_path = terragrunt
            .base_modules_path
            .map(|p| p.trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty());

        Ok(Config {
            environment: raw.environment.trim().to_string(),
            dry_run: raw.dry_run,
            timeout,
            output_dir: raw.output_dir,
            log: raw.log,
            terragrunt,
            secrets_operator: raw.secrets_operator,
        })
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_environment(cfg)?;
    ensure_root_path(cfg)?;
    validate_secrets_operator(cfg)?;
    Ok(())
}

fn ensure_environment(cfg: &RawConfigFile) -> Result<()> {
    let env = cfg.environment.trim();
    if env.is_empty() {
        return Err(BootError::ConfigError(
            "`environment` must be set (file key `environment` or env ENVIRONMENT)".to_string(),
        ));
    }
    if env.contains(['/', '\\']) {
        return Err(BootError::ConfigError(format!(
            "`environment` must be a single directory name (got {env:?})"
        )));
    }
    Ok(())
}

fn ensure_root_path(cfg: &RawConfigFile) -> Result<()> {
    if cfg.terragrunt.root_path.as_os_str().is_empty() {
        return Err(BootError::ConfigError(
            "`terragrunt.root_path` must be set (env TERRAGRUNT_ROOT_PATH)".to_string(),
        ));
    }
    Ok(())
}

fn validate_secrets_operator(cfg: &RawConfigFile) -> Result<()> {
    let so = &cfg.secrets_operator;
    for (key, value) in [
        ("secrets_operator.state_path_prefix", &so.state_path_prefix),
        ("secrets_operator.kube_context", &so.kube_context),
    ] {
        if value.trim().is_empty() {
            return Err(BootError::ConfigError(format!("`{key}` must not be empty")));
        }
    }
    Ok(())
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"10m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}

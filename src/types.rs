use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// Log verbosity, shared by the config file, env overrides and `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!(
                "invalid log level: {other} (expected error, warn, info, debug or trace)"
            )),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    Console,
    /// One JSON object per event.
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Console
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            other => Err(format!(
                "invalid log format: {other} (expected \"console\" or \"json\")"
            )),
        }
    }
}

/// What the provisioning step does when `terragrunt plan` fails.
///
/// - `Abort`: the failure is fatal, apply is never attempted (default).
/// - `Continue`: the failure is logged at debug level and apply still runs,
///   relying on apply to fail loudly if the plan was actually needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanFailurePolicy {
    Abort,
    Continue,
}

impl Default for PlanFailurePolicy {
    fn default() -> Self {
        PlanFailurePolicy::Abort
    }
}

impl FromStr for PlanFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(PlanFailurePolicy::Abort),
            "continue" => Ok(PlanFailurePolicy::Continue),
            other => Err(format!(
                "invalid plan failure policy: {other} (expected \"abort\" or \"continue\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!(" warning ".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn plan_failure_policy_defaults_to_abort() {
        assert_eq!(PlanFailurePolicy::default(), PlanFailurePolicy::Abort);
        assert_eq!(
            "continue".parse::<PlanFailurePolicy>(),
            Ok(PlanFailurePolicy::Continue)
        );
    }
}

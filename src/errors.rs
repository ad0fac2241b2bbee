// src/errors.rs

//! Crate-wide error types and exit-code mapping.

use thiserror::Error;

/// Exit code for invocations that could not be executed at all
/// (bad options, spawn failure, broken pipes, signal termination).
pub const EXIT_CANNOT_EXECUTE: i32 = 5;

/// Conventional exit code for a command stopped by a deadline or cancellation.
pub const EXIT_TIMEOUT: i32 = 124;

/// Conventional shell exit code for "command not found".
pub const EXIT_NOT_FOUND: i32 = 127;

/// Sentinel used when a child's exit status cannot be determined.
pub const EXIT_UNKNOWN: i32 = -1;

/// Failure of a single external command.
#[derive(Error, Debug)]
pub enum ExecError {
    /// An invocation option was invalid; the process was never started.
    #[error("invalid command option: {0}")]
    Config(String),

    #[error("binary `{program}` not found in PATH")]
    NotFound { program: String },

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context} for `{command}`: {source}")]
    Io {
        command: String,
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` was terminated by signal {signal}")]
    Signaled { command: String, signal: i32 },

    #[error("`{command}` exceeded its deadline and was killed")]
    TimedOut { command: String },

    #[error("`{command}` was cancelled and killed")]
    Cancelled { command: String },

    #[error("`{command}` exited with code {code}")]
    Failed { command: String, code: i32 },

    #[error("post-run hook for `{command}` failed: {reason}")]
    PostRun { command: String, reason: String },
}

impl ExecError {
    /// Exit code this failure maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::Config(_)
            | ExecError::Spawn { .. }
            | ExecError::Io { .. }
            | ExecError::Signaled { .. } => EXIT_CANNOT_EXECUTE,
            ExecError::TimedOut { .. } | ExecError::Cancelled { .. } => EXIT_TIMEOUT,
            ExecError::NotFound { .. } => EXIT_NOT_FOUND,
            ExecError::Failed { code, .. } => *code,
            ExecError::PostRun { .. } => 1,
        }
    }

    /// True when the command was stopped by its scope rather than exiting on its own.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ExecError::TimedOut { .. } | ExecError::Cancelled { .. })
    }
}

/// Exit code of a finished invocation: `0` on success, the mapped code otherwise.
pub fn exit_code_of(result: &std::result::Result<(), ExecError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => err.exit_code(),
    }
}

#[derive(Error, Debug)]
pub enum BootError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: ExecError,
    },

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BootError {
    /// Process exit status for this failure; never `0`.
    pub fn exit_code(&self) -> i32 {
        let code = match self {
            BootError::Step { source, .. } | BootError::Exec(source) => source.exit_code(),
            _ => 1,
        };
        if code > 0 { code } else { 1 }
    }
}

pub type Result<T> = std::result::Result<T, BootError>;

// src/exec/command.rs

//! Process invocation spec: everything needed to launch one external command.
//!
//! Options are applied in call order. An option that cannot be applied (for
//! example a malformed `KEY=VALUE` entry) is remembered, every later option is
//! ignored, and the error is returned by [`crate::exec::run`] before the
//! binary is resolved or spawned.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::errors::ExecError;
use crate::exec::scope::RunScope;

/// Destination for a child's output stream.
pub type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Source for a child's standard input.
pub type Source = Box<dyn AsyncRead + Send + Unpin>;

/// Callback invoked with the child's exit status once it has exited.
pub type PostRunHook = Box<dyn FnOnce(&ExitStatus) -> anyhow::Result<()> + Send>;

pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    /// Working directory; created (with parents) before spawning if missing.
    dir: Option<PathBuf>,
    stdin: Option<Source>,
    /// Every sink receives the full stdout stream. Empty means discarded.
    stdout: Vec<Sink>,
    stderr: Vec<Sink>,
    /// Overrides on top of the inherited environment, one entry per key.
    env: Vec<(String, String)>,
    scope: Option<RunScope>,
    /// Execution budget for this command alone, on top of the scope deadline.
    timeout: Option<Duration>,
    post_run: Option<PostRunHook>,
    error: Option<ExecError>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            stdin: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
            env: Vec::new(),
            scope: None,
            timeout: None,
            post_run: None,
            error: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        if self.error.is_none() {
            self.args.push(arg.into());
        }
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.error.is_none() {
            self.args.extend(args.into_iter().map(Into::into));
        }
        self
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        if self.error.is_none() {
            self.dir = Some(dir.into());
        }
        self
    }

    pub fn stdin(mut self, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        if self.error.is_none() {
            self.stdin = Some(Box::new(reader));
        }
        self
    }

    /// Add a stdout sink. Earlier sinks are kept; all of them get every byte.
    pub fn stdout(mut self, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        if self.error.is_none() {
            self.stdout.push(Box::new(writer));
        }
        self
    }

    /// Add a stderr sink. Earlier sinks are kept; all of them get every byte.
    pub fn stderr(mut self, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        if self.error.is_none() {
            self.stderr.push(Box::new(writer));
        }
        self
    }

    /// Set an environment variable, replacing an earlier value for the same key.
    ///
    /// Setting `PATH` also changes where the program itself is looked up.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let key = key.into();
        if let Err(reason) = validate_env_key(&key) {
            self.error = Some(ExecError::Config(reason));
            return self;
        }
        let value = value.into();
        match self.env.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.env.push((key, value)),
        }
        self
    }

    /// Set environment variables from `KEY=VALUE` strings.
    ///
    /// An entry without `=` is a construction error.
    pub fn environs<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entry in entries {
            if self.error.is_some() {
                break;
            }
            let entry = entry.as_ref();
            self = match entry.split_once('=') {
                Some((key, value)) => self.env(key, value),
                None => {
                    self.error = Some(ExecError::Config(format!(
                        "environment entry {entry:?} is not formatted as KEY=VALUE"
                    )));
                    self
                }
            };
        }
        self
    }

    pub fn scope(mut self, scope: RunScope) -> Self {
        if self.error.is_none() {
            self.scope = Some(scope);
        }
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        if self.error.is_none() {
            self.timeout = Some(timeout);
        }
        self
    }

    pub fn post_run(
        mut self,
        hook: impl FnOnce(&ExitStatus) -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        if self.error.is_none() {
            self.post_run = Some(Box::new(hook));
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn get_env(&self) -> &[(String, String)] {
        &self.env
    }

    /// The first option error recorded, if any.
    pub fn error(&self) -> Option<&ExecError> {
        self.error.as_ref()
    }

    pub(crate) fn take_error(&mut self) -> Option<ExecError> {
        self.error.take()
    }

    /// Detach the stdout sinks, e.g. to feed them from somewhere other than a child.
    pub fn take_stdout(&mut self) -> Vec<Sink> {
        std::mem::take(&mut self.stdout)
    }

    /// `program arg1 arg2 ...`, for logs and error messages.
    pub fn display(&self) -> String {
        display_command(&self.program, &self.args)
    }

    /// Finish construction: surface a recorded option error, then make sure
    /// the working directory exists.
    pub(crate) fn prepare(self) -> Result<PreparedCommand, ExecError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if let Some(dir) = &self.dir {
            ensure_dir(dir)?;
        }
        Ok(PreparedCommand {
            program: self.program,
            args: self.args,
            dir: self.dir,
            stdin: self.stdin,
            stdout: self.stdout,
            stderr: self.stderr,
            env: self.env,
            scope: self.scope,
            timeout: self.timeout,
            post_run: self.post_run,
        })
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("dir", &self.dir)
            .field("stdin", &self.stdin.is_some())
            .field("stdout_sinks", &self.stdout.len())
            .field("stderr_sinks", &self.stderr.len())
            .field("env", &self.env)
            .field("scope", &self.scope.is_some())
            .field("timeout", &self.timeout)
            .field("error", &self.error)
            .finish()
    }
}

/// A spec whose options all applied cleanly.
pub(crate) struct PreparedCommand {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub stdin: Option<Source>,
    pub stdout: Vec<Sink>,
    pub stderr: Vec<Sink>,
    pub env: Vec<(String, String)>,
    pub scope: Option<RunScope>,
    pub timeout: Option<Duration>,
    pub post_run: Option<PostRunHook>,
}

pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

fn validate_env_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("environment variable name must not be empty".to_string());
    }
    if key.contains(['=', '\0']) {
        return Err(format!(
            "environment variable name {key:?} must not contain '=' or NUL"
        ));
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), ExecError> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|err| {
        ExecError::Config(format!(
            "creating working directory {}: {err}",
            dir.display()
        ))
    })
}

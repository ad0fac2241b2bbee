// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! Pipeline steps hand a fully described [`CommandSpec`] to a
//! `CommandExecutor` instead of calling the runner directly. Production code
//! uses [`RealExecutor`], which spawns the process; tests can provide an
//! implementation that records the invocation and replays canned output.

use std::future::Future;
use std::pin::Pin;

use crate::errors::ExecError;

use super::command::CommandSpec;
use super::runner::run;

pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ExecError>> + Send + 'a>>;

/// Trait abstracting how a single command is executed.
pub trait CommandExecutor: Send + Sync {
    /// Run `spec` to completion.
    ///
    /// The implementation must drop the spec's output sinks before the
    /// returned future completes, so readers on the other end see EOF.
    fn execute(&self, spec: CommandSpec) -> ExecFuture<'_>;
}

/// Executor that resolves the binary on `PATH` and spawns it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealExecutor;

impl CommandExecutor for RealExecutor {
    fn execute(&self, spec: CommandSpec) -> ExecFuture<'_> {
        Box::pin(run(spec))
    }
}

// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for launching the external tools the pipeline
//! drives, using `tokio::process::Command`.
//!
//! - [`command`] holds [`CommandSpec`], the description of one invocation.
//! - [`runner`] spawns it, copies its output to the configured sinks and maps
//!   the outcome to an [`crate::errors::ExecError`].
//! - [`scope`] provides the deadline / cancellation scope shared by a run.
//! - [`splitter`] routes a line stream to two sinks around a marker line.
//! - [`lookup`] resolves program names on `PATH`.
//! - [`backend`] provides the `CommandExecutor` trait and the concrete
//!   `RealExecutor`, which tests can replace with a fake implementation.

pub mod backend;
pub mod command;
pub mod lookup;
pub mod runner;
pub mod scope;
pub mod splitter;

pub use backend::{CommandExecutor, ExecFuture, RealExecutor};
pub use command::{CommandSpec, Sink};
pub use runner::run;
pub use scope::{RunScope, ScopeExit};
pub use splitter::{OutputSplitter, SplitSummary};

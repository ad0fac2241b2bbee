// src/exec/runner.rs

//! Launch one external process and wait for it.
//!
//! Output is copied to the configured sinks while the process runs. The child
//! is raced against its scope and execution budget; whichever ends first
//! decides the outcome.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::{EXIT_UNKNOWN, ExecError};
use crate::exec::command::{CommandSpec, PreparedCommand, Sink, Source, display_command};
use crate::exec::lookup::{find_binary, find_binary_in};
use crate::exec::scope::{RunScope, ScopeExit};

const DRAIN_CHUNK: usize = 8 * 1024;

enum Completion {
    Exited(io::Result<ExitStatus>),
    Interrupted(ScopeExit),
}

/// Resolve the spec's program on `PATH`, build the invocation and run it to
/// completion.
///
/// A `PATH` set on the spec is the one searched; otherwise the parent's.
/// `Ok(())` means the process exited with status zero and all of its output
/// was drained before the scope or budget ran out.
pub async fn run(mut spec: CommandSpec) -> Result<(), ExecError> {
    if let Some(err) = spec.take_error() {
        return Err(err);
    }
    let binary = resolve_program(&spec).ok_or_else(|| ExecError::NotFound {
        program: spec.program().to_string(),
    })?;
    let prepared = spec.prepare()?;
    run_prepared(binary, prepared).await
}

async fn run_prepared(binary: PathBuf, cmd_spec: PreparedCommand) -> Result<(), ExecError> {
    let PreparedCommand {
        program,
        args,
        dir,
        stdin,
        stdout,
        stderr,
        env,
        scope,
        timeout,
        post_run,
    } = cmd_spec;
    let command = display_command(&program, &args);

    if let Some(exit) = scope.as_ref().and_then(RunScope::exited) {
        warn!(command = %command, ?exit, "scope already ended; not starting command");
        return Err(interrupted(command, exit));
    }

    let mut cmd = Command::new(&binary);
    cmd.args(&args)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(stdio_for(stdin.is_some()))
        .stdout(stdio_for(!stdout.is_empty()))
        .stderr(stdio_for(!stderr.is_empty()))
        .kill_on_drop(true);
    if let Some(dir) = &dir {
        cmd.current_dir(dir);
    }

    info!(command = %command, dir = ?dir.as_deref().map(Path::display), "running command");

    let budget_deadline = timeout.and_then(|budget| Instant::now().checked_add(budget));

    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        command: command.clone(),
        source,
    })?;

    let mut stdin_task = match (stdin, child.stdin.take()) {
        (Some(source), Some(pipe)) => Some(tokio::spawn(feed_stdin(source, pipe))),
        _ => None,
    };
    let mut stdout_task = child
        .stdout
        .take()
        .map(|pipe| tokio::spawn(drain(pipe, stdout)));
    let mut stderr_task = child
        .stderr
        .take()
        .map(|pipe| tokio::spawn(drain(pipe, stderr)));

    let completion = tokio::select! {
        status = child.wait() => Completion::Exited(status),
        exit = wait_interrupt(scope.as_ref(), budget_deadline) => Completion::Interrupted(exit),
    };

    let status = match completion {
        Completion::Interrupted(exit) => {
            warn!(command = %command, ?exit, "command interrupted; killing process");
            if let Err(e) = child.kill().await {
                warn!(command = %command, error = %e, "failed to kill child process");
            }
            for task in [stdin_task, stdout_task, stderr_task].into_iter().flatten() {
                task.abort();
            }
            return Err(interrupted(command, exit));
        }
        Completion::Exited(status) => status.map_err(|source| ExecError::Io {
            command: command.clone(),
            context: "waiting for process",
            source,
        })?,
    };

    // A descendant can keep the pipes open after the child exits; the
    // deadline still applies while draining.
    let drained = {
        let joined = async {
            if let Some(task) = stdin_task.as_mut() {
                if let Ok(Err(e)) = task.await {
                    debug!(command = %command, error = %e, "stdin copy ended early");
                }
            }
            let stdout_res = join_drain(&command, "stdout", stdout_task.as_mut()).await;
            let stderr_res = join_drain(&command, "stderr", stderr_task.as_mut()).await;
            (stdout_res, stderr_res)
        };
        tokio::select! {
            biased;
            res = joined => Ok(res),
            exit = wait_interrupt(scope.as_ref(), budget_deadline) => Err(exit),
        }
    };
    let (stdout_res, stderr_res) = match drained {
        Ok(res) => res,
        Err(exit) => {
            warn!(command = %command, ?exit, "output still open when command was interrupted");
            for task in [stdin_task, stdout_task, stderr_task].into_iter().flatten() {
                task.abort();
            }
            return Err(interrupted(command, exit));
        }
    };

    let code = status.code().unwrap_or(EXIT_UNKNOWN);
    info!(
        command = %command,
        exit_code = code,
        success = status.success(),
        "command exited"
    );

    if let Some(hook) = post_run {
        hook(&status).map_err(|err| ExecError::PostRun {
            command: command.clone(),
            reason: format!("{err:#}"),
        })?;
    }

    map_status(&command, status)?;

    for (context, res) in [("copying stdout", stdout_res), ("copying stderr", stderr_res)] {
        res.map_err(|source| ExecError::Io {
            command: command.clone(),
            context,
            source,
        })?;
    }

    Ok(())
}

fn resolve_program(spec: &CommandSpec) -> Option<PathBuf> {
    match spec.get_env().iter().find(|(key, _)| key == "PATH") {
        Some((_, path)) => find_binary_in(spec.program(), Some(OsStr::new(path))),
        None => find_binary(spec.program()),
    }
}

fn stdio_for(piped: bool) -> Stdio {
    if piped { Stdio::piped() } else { Stdio::null() }
}

fn interrupted(command: String, exit: ScopeExit) -> ExecError {
    match exit {
        ScopeExit::DeadlineExceeded => ExecError::TimedOut { command },
        ScopeExit::Cancelled => ExecError::Cancelled { command },
    }
}

/// Map an exit status to the runner's result.
pub fn map_status(command: &str, status: ExitStatus) -> Result<(), ExecError> {
    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        return Err(ExecError::Failed {
            command: command.to_string(),
            code,
        });
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(ExecError::Signaled {
                command: command.to_string(),
                signal,
            });
        }
    }
    Err(ExecError::Failed {
        command: command.to_string(),
        code: EXIT_UNKNOWN,
    })
}

/// Resolve when the scope ends or the execution budget deadline passes.
/// Never resolves when neither is set.
async fn wait_interrupt(scope: Option<&RunScope>, budget_deadline: Option<Instant>) -> ScopeExit {
    let budget = async {
        match budget_deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };

    match scope {
        Some(scope) => tokio::select! {
            exit = scope.done() => exit,
            _ = budget => ScopeExit::DeadlineExceeded,
        },
        None => {
            budget.await;
            ScopeExit::DeadlineExceeded
        }
    }
}

async fn feed_stdin(mut source: Source, mut pipe: tokio::process::ChildStdin) -> io::Result<u64> {
    let copied = tokio::io::copy(&mut source, &mut pipe).await?;
    pipe.shutdown().await?;
    Ok(copied)
}

/// Copy `reader` into every sink until EOF.
///
/// A sink that fails is dropped from the fan-out; reading continues so the
/// child never blocks on a full pipe. The first sink error is returned.
pub async fn drain<R>(mut reader: R, mut sinks: Vec<Sink>) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; DRAIN_CHUNK];
    let mut total = 0u64;
    let mut first_err: Option<io::Error> = None;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;

        let mut i = 0;
        while i < sinks.len() {
            match sinks[i].write_all(&buf[..n]).await {
                Ok(()) => i += 1,
                Err(e) => {
                    sinks.swap_remove(i);
                    first_err.get_or_insert(e);
                }
            }
        }
    }

    for sink in sinks.iter_mut() {
        if let Err(e) = sink.flush().await {
            first_err.get_or_insert(e);
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(total),
    }
}

async fn join_drain(
    command: &str,
    stream: &'static str,
    task: Option<&mut JoinHandle<io::Result<u64>>>,
) -> io::Result<u64> {
    let Some(task) = task else {
        return Ok(0);
    };
    match task.await {
        Ok(Ok(bytes)) => {
            debug!(command = %command, stream, bytes, "output drained");
            Ok(bytes)
        }
        Ok(Err(e)) => {
            warn!(command = %command, stream, error = %e, "output copy failed");
            Err(e)
        }
        Err(join_err) => Err(io::Error::other(join_err)),
    }
}

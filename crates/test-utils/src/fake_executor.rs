use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;

use boot_k8s_cluster::errors::ExecError;
use boot_k8s_cluster::exec::{CommandExecutor, CommandSpec, ExecFuture};

/// One command as seen by the fake executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl RecordedCommand {
    /// First argument, e.g. `"plan"` for `terragrunt plan ...`.
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

type Key = (String, String);

/// A fake executor that:
/// - records every command it is asked to run
/// - writes scripted stdout for `(program, subcommand)` pairs
/// - fails with a scripted exit code for `(program, subcommand)` pairs
/// - reports programs marked missing as not found on `PATH`
/// - otherwise reports success without spawning anything.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<RecordedCommand>>>,
    stdout: HashMap<Key, String>,
    failures: HashMap<Key, i32>,
    missing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stdout(mut self, program: &str, subcommand: &str, output: &str) -> Self {
        self.stdout
            .insert((program.to_string(), subcommand.to_string()), output.to_string());
        self
    }

    pub fn failing(mut self, program: &str, subcommand: &str, code: i32) -> Self {
        self.failures
            .insert((program.to_string(), subcommand.to_string()), code);
        self
    }

    /// Behave as if `program` is not installed.
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    pub fn executed(&self) -> Vec<RecordedCommand> {
        self.executed.lock().unwrap().clone()
    }

    pub fn executed_by(&self, program: &str) -> Vec<RecordedCommand> {
        self.executed()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }
}

impl CommandExecutor for FakeExecutor {
    fn execute(&self, mut spec: CommandSpec) -> ExecFuture<'_> {
        let record = RecordedCommand {
            program: spec.program().to_string(),
            args: spec.get_args().to_vec(),
            dir: spec.working_dir().map(|d| d.to_path_buf()),
        };
        let key = (record.program.clone(), record.subcommand().to_string());
        let output = self.stdout.get(&key).cloned();
        let failure = self.failures.get(&key).copied();
        let command = spec.display();

        if self.missing.contains(&record.program) {
            let program = record.program.clone();
            self.executed.lock().unwrap().push(record);
            return Box::pin(async move { Err(ExecError::NotFound { program }) });
        }

        self.executed.lock().unwrap().push(record);
        let mut sinks = spec.take_stdout();
        drop(spec);

        Box::pin(async move {
            if let Some(output) = output {
                for sink in sinks.iter_mut() {
                    sink.write_all(output.as_bytes())
                        .await
                        .and(sink.flush().await)
                        .map_err(|source| ExecError::Io {
                            command: command.clone(),
                            context: "writing scripted stdout",
                            source,
                        })?;
                }
            }
            drop(sinks);

            match failure {
                Some(code) => Err(ExecError::Failed { command, code }),
                None => Ok(()),
            }
        })
    }
}

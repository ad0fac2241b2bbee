// src/pipeline/terragrunt.rs

//! Terragrunt plan / apply stages for a single module.

use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::errors::Result;
use crate::exec::command::display_command;
use crate::pipeline::Pipeline;

pub const TERRAGRUNT_BIN: &str = "terragrunt";

/// Everything the plan and apply stages need to know about one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleContext {
    pub environment: String,
    /// Module path relative to the environment, e.g. `"k8s-cluster"`.
    pub module: String,
    /// `<root_path>/<environment>/<module>`.
    pub work_dir: PathBuf,
    /// `--source` override, `<base_modules_path>//<module>`.
    pub source: Option<String>,
    /// Plan file written by plan and consumed by apply. `None` in dry-run mode.
    pub plan_out: Option<String>,
    pub extra_args: Vec<String>,
}

impl ModuleContext {
    pub fn from_config(cfg: &Config, module: &str, extra_args: Vec<String>) -> Self {
        Self {
            environment: cfg.environment.clone(),
            module: module.to_string(),
            work_dir: cfg.terragrunt.root_path.join(&cfg.environment).join(module),
            source: cfg
                .terragrunt
                .base_modules_path
                .as_ref()
                .map(|base| format!("{base}//{module}")),
            plan_out: (!cfg.dry_run).then(|| plan_file_name(module)),
            extra_args,
        }
    }

    /// `plan [--source S] [-out P] <extra...>`
    pub fn plan_args(&self) -> Vec<String> {
        let mut args = vec!["plan".to_string()];
        if let Some(source) = &self.source {
            args.extend(["--source".to_string(), source.clone()]);
        }
        if let Some(plan_out) = &self.plan_out {
            args.extend(["-out".to_string(), plan_out.clone()]);
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// `apply -auto-approve <extra...> [P] [--source S]`
    pub fn apply_args(&self) -> Vec<String> {
        let mut args = vec!["apply".to_string(), "-auto-approve".to_string()];
        args.extend(self.extra_args.iter().cloned());
        if let Some(plan_out) = &self.plan_out {
            args.push(plan_out.clone());
        }
        if let Some(source) = &self.source {
            args.extend(["--source".to_string(), source.clone()]);
        }
        args
    }
}

/// Plan file name for a module: path separators become `_`.
pub fn plan_file_name(module: &str) -> String {
    format!("{}.plan", module.replace('/', "_"))
}

/// Result of a stage that is skipped in dry-run mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Dry-run: nothing ran. `command` is what would have run.
    Skipped { command: String },
}

pub async fn plan(pipeline: &Pipeline<'_>, module: &ModuleContext) -> Result<()> {
    info!(
        module = %module.module,
        source = module.source.as_deref().unwrap_or(""),
        "running terragrunt plan"
    );

    let spec = pipeline
        .command(TERRAGRUNT_BIN)
        .dir(&module.work_dir)
        .args(module.plan_args())
        .stdout(tokio::io::stdout())
        .stderr(tokio::io::stderr());
    pipeline.execute("terragrunt plan", spec).await?;

    info!(module = %module.module, "terragrunt plan finished");
    Ok(())
}

/// Apply the module, or only log what would be applied in dry-run mode.
pub async fn apply_or_skip(pipeline: &Pipeline<'_>, module: &ModuleContext) -> Result<ApplyOutcome> {
    let args = module.apply_args();

    if pipeline.config().dry_run {
        let command = display_command(TERRAGRUNT_BIN, &args);
        info!(
            module = %module.module,
            command = %command,
            "dry mode enabled, skipping apply execution"
        );
        return Ok(ApplyOutcome::Skipped { command });
    }

    info!(
        module = %module.module,
        source = module.source.as_deref().unwrap_or(""),
        "running terragrunt apply"
    );
    let spec = pipeline
        .command(TERRAGRUNT_BIN)
        .dir(&module.work_dir)
        .args(args)
        .stdout(tokio::io::stdout())
        .stderr(tokio::io::stderr());
    pipeline.execute("terragrunt apply", spec).await?;

    info!(module = %module.module, "terragrunt apply finished");
    Ok(ApplyOutcome::Applied)
}

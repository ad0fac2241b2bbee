// src/pipeline/secrets.rs

//! Configure-secrets-operator step: terragrunt plan / apply of the operator
//! module, then render and install the external-secrets helm chart.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::BufReader;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::{BootError, Result};
use crate::exec::command::display_command;
use crate::exec::OutputSplitter;
use crate::pipeline::Pipeline;
use crate::pipeline::terragrunt::{self, ApplyOutcome, ModuleContext};

pub const SECRETS_OPERATOR_MODULE: &str = "cluster-configuration/external-secrets-operator";

pub const HELM_BIN: &str = "helm";
pub const RELEASE_NAME: &str = "external-secrets";
pub const CHART: &str = "external-secrets/external-secrets";
pub const NAMESPACE: &str = "external-secrets";

/// Rendered chart manifests.
pub const TEMPLATE_FILE: &str = "eso-generated-template.yaml";
/// Values echoed back by `helm upgrade --debug`.
pub const VALUES_FILE: &str = "eso-supplied-values.yaml";
/// Header helm prints before the user-supplied values.
pub const VALUES_MARKER: &str = "USER-SUPPLIED VALUES:";

const PIPE_CAPACITY: usize = 64 * 1024;

pub fn secrets_operator_module(cfg: &Config) -> ModuleContext {
    let so = &cfg.secrets_operator;
    let extra_args = vec![
        format!("--feature=state_path_prefix={}", so.state_path_prefix),
        format!("--feature=kube_ctx={}", so.kube_context),
    ];
    ModuleContext::from_config(cfg, SECRETS_OPERATOR_MODULE, extra_args)
}

pub fn helm_template_args() -> Vec<String> {
    [
        "template",
        RELEASE_NAME,
        CHART,
        "-n",
        NAMESPACE,
        "--set",
        "installCRDs=true",
    ]
    .map(String::from)
    .to_vec()
}

pub fn helm_upgrade_args() -> Vec<String> {
    [
        "upgrade",
        RELEASE_NAME,
        CHART,
        "--install",
        "-n",
        NAMESPACE,
        "--create-namespace",
        "--set",
        "installCRDs=true",
        "--debug",
        "--wait",
    ]
    .map(String::from)
    .to_vec()
}

pub async fn configure_secrets_operator(pipeline: &Pipeline<'_>) -> Result<()> {
    let module = secrets_operator_module(pipeline.config());

    terragrunt::plan(pipeline, &module).await?;
    terragrunt::apply_or_skip(pipeline, &module).await?;
    helm_template(pipeline).await?;
    helm_upgrade(pipeline).await?;
    Ok(())
}

/// Render the chart to [`TEMPLATE_FILE`] in the output directory.
pub async fn helm_template(pipeline: &Pipeline<'_>) -> Result<PathBuf> {
    let path = pipeline.config().output_dir.join(TEMPLATE_FILE);
    let file = create_artifact(&path).await?;

    let spec = pipeline
        .command(HELM_BIN)
        .args(helm_template_args())
        .stdout(file)
        .stderr(tokio::io::stderr());
    pipeline.execute("helm template", spec).await?;

    info!(path = %path.display(), "helm template finished");
    Ok(path)
}

/// Install or upgrade the release, persisting the echoed values to
/// [`VALUES_FILE`] and passing the rest of the debug output to stdout.
///
/// Skipped in dry-run mode. The splitter task is always joined before
/// returning, so the values file is complete once this resolves.
pub async fn helm_upgrade(pipeline: &Pipeline<'_>) -> Result<ApplyOutcome> {
    let args = helm_upgrade_args();

    if pipeline.config().dry_run {
        let command = display_command(HELM_BIN, &args);
        info!(command = %command, "dry mode enabled, skipping helm upgrade");
        return Ok(ApplyOutcome::Skipped { command });
    }

    let values_path = pipeline.config().output_dir.join(VALUES_FILE);
    let values_file = create_artifact(&values_path).await?;

    let (pipe_writer, pipe_reader) = tokio::io::duplex(PIPE_CAPACITY);
    let splitter = OutputSplitter::new(VALUES_MARKER).spawn(
        BufReader::new(pipe_reader),
        tokio::io::stdout(),
        values_file,
    );

    let spec = pipeline
        .command(HELM_BIN)
        .args(args)
        .stdout(pipe_writer)
        .stderr(tokio::io::stderr());
    let executed = pipeline.execute("helm upgrade", spec).await;

    match splitter.await {
        Ok(Ok(summary)) if !summary.marker_seen => warn!(
            marker = VALUES_MARKER,
            "marker not found in helm output; values file is empty"
        ),
        Ok(Ok(summary)) => info!(
            lines = summary.redirected_lines,
            path = %values_path.display(),
            "user-supplied values written"
        ),
        Ok(Err(e)) => error!(error = %e, "scanning helm upgrade stdout failed"),
        Err(e) => error!(error = %e, "helm output splitter task failed"),
    }
    executed?;

    info!("helm upgrade finished");
    Ok(ApplyOutcome::Applied)
}

async fn create_artifact(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    File::create(path).await.map_err(|e| {
        BootError::Other(anyhow::anyhow!("creating {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfigFile;

    #[test]
    fn feature_flags_come_from_config() {
        let mut raw = RawConfigFile::default();
        raw.environment = "prod".to_string();
        raw.terragrunt.root_path = PathBuf::from("live");
        raw.secrets_operator.kube_context = "ctx-prod".to_string();
        let cfg = Config::try_from(raw).unwrap();

        let module = secrets_operator_module(&cfg);
        assert_eq!(
            module.extra_args,
            [
                "--feature=state_path_prefix=do-k8s",
                "--feature=kube_ctx=ctx-prod"
            ]
        );
        assert_eq!(
            module.work_dir,
            PathBuf::from("live/prod/cluster-configuration/external-secrets-operator")
        );
    }

    #[test]
    fn helm_upgrade_runs_in_debug_mode() {
        let args = helm_upgrade_args();
        assert_eq!(args[0], "upgrade");
        assert!(args.contains(&"--debug".to_string()));
        assert!(args.contains(&"--install".to_string()));
    }
}

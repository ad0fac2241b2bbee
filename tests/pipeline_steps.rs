mod common;
use crate::common::builders::ConfigBuilder;
use crate::common::{FakeExecutor, init_tracing, with_timeout};

use std::path::PathBuf;

use boot_k8s_cluster::errors::{BootError, ExecError};
use boot_k8s_cluster::exec::RunScope;
use boot_k8s_cluster::pipeline::cluster::provision_cluster;
use boot_k8s_cluster::pipeline::secrets::{TEMPLATE_FILE, VALUES_FILE, helm_upgrade};
use boot_k8s_cluster::pipeline::{ApplyOutcome, Pipeline};
use boot_k8s_cluster::types::PlanFailurePolicy;

const HELM_DEBUG_OUTPUT: &str =
    "debug: starting\nUSER-SUPPLIED VALUES:\nreplicas: 3\ndebug: done\n";

#[tokio::test]
async fn dry_run_provision_only_plans() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .dry_run(true)
        .base_modules_path("git::https://example.com/modules.git")
        .build();
    let exec = FakeExecutor::new();
    let pipeline = Pipeline::new(&cfg, &exec, RunScope::unbounded());

    let outcome = with_timeout(provision_cluster(&pipeline)).await.unwrap();

    let executed = exec.executed();
    assert_eq!(executed.len(), 1);
    let plan = &executed[0];
    assert_eq!(plan.program, "terragrunt");
    assert_eq!(
        plan.args,
        [
            "plan",
            "--source",
            "git::https://example.com/modules.git//k8s-cluster"
        ]
    );
    assert!(!plan.has_arg("-out"));
    assert_eq!(plan.dir, Some(PathBuf::from("/infra/live/dev/k8s-cluster")));
    assert!(matches!(outcome, ApplyOutcome::Skipped { command } if command.starts_with("terragrunt apply")));
}

#[tokio::test]
async fn provision_plans_then_applies_the_plan_file() {
    init_tracing();
    let cfg = ConfigBuilder::new().color(false).build();
    let exec = FakeExecutor::new();
    let pipeline = Pipeline::new(&cfg, &exec, RunScope::unbounded());

    let outcome = with_timeout(provision_cluster(&pipeline)).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Applied);

    let executed = exec.executed_by("terragrunt");
    let subcommands: Vec<_> = executed.iter().map(|c| c.subcommand()).collect();
    assert_eq!(subcommands, ["plan", "apply"]);
    assert_eq!(
        executed[0].args,
        ["plan", "-out", "k8s-cluster.plan", "--no-color"]
    );
    assert_eq!(
        executed[1].args,
        ["apply", "-auto-approve", "--no-color", "k8s-cluster.plan"]
    );
}

#[tokio::test]
async fn failed_plan_aborts_by_default() {
    init_tracing();
    let cfg = ConfigBuilder::new().build();
    let exec = FakeExecutor::new().failing("terragrunt", "plan", 1);
    let pipeline = Pipeline::new(&cfg, &exec, RunScope::unbounded());

    let err = with_timeout(provision_cluster(&pipeline)).await.unwrap_err();

    assert!(matches!(
        &err,
        BootError::Step {
            step: "terragrunt plan",
            source: ExecError::Failed { code: 1, .. }
        }
    ));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(exec.executed().len(), 1);
}

#[tokio::test]
async fn failed_plan_can_be_tolerated() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .plan_failure(PlanFailurePolicy::Continue)
        .build();
    let exec = FakeExecutor::new().failing("terragrunt", "plan", 2);
    let pipeline = Pipeline::new(&cfg, &exec, RunScope::unbounded());

    let outcome = with_timeout(provision_cluster(&pipeline)).await.unwrap();

    assert_eq!(outcome, ApplyOutcome::Applied);
    assert_eq!(exec.executed_by("terragrunt").len(), 2);
}

#[tokio::test]
async fn tolerated_plan_failure_does_not_cover_a_missing_binary() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .dry_run(true)
        .plan_failure(PlanFailurePolicy::Continue)
        .build();
    let exec = FakeExecutor::new().missing("terragrunt");
    let pipeline = Pipeline::new(&cfg, &exec, RunScope::unbounded());

    let err = with_timeout(provision_cluster(&pipeline)).await.unwrap_err();

    assert!(matches!(
        &err,
        BootError::Step {
            step: "terragrunt plan",
            source: ExecError::NotFound { .. }
        }
    ));
    assert_eq!(err.exit_code(), 127);
    assert_eq!(exec.executed().len(), 1);
}

#[tokio::test]
async fn full_run_writes_template_and_values_files() {
    init_tracing();
    let out = tempfile::tempdir().unwrap();
    let cfg = ConfigBuilder::new().output_dir(out.path()).build();
    let exec = FakeExecutor::new()
        .with_stdout("helm", "template", "kind: Deployment\n")
        .with_stdout("helm", "upgrade", HELM_DEBUG_OUTPUT);
    let pipeline = Pipeline::new(&cfg, &exec, RunScope::unbounded());

    with_timeout(pipeline.run()).await.unwrap();

    let order: Vec<_> = exec
        .executed()
        .iter()
        .map(|c| format!("{} {}", c.program, c.subcommand()))
        .collect();
    assert_eq!(
        order,
        [
            "terragrunt plan",
            "terragrunt apply",
            "terragrunt plan",
            "terragrunt apply",
            "helm template",
            "helm upgrade",
        ]
    );

    let secrets_plan = &exec.executed()[2];
    assert_eq!(
        secrets_plan.dir,
        Some(PathBuf::from(
            "/infra/live/dev/cluster-configuration/external-secrets-operator"
        ))
    );
    assert!(secrets_plan.has_arg("--feature=state_path_prefix=do-k8s"));
    assert!(secrets_plan.has_arg("--feature=kube_ctx=do-sfo2-dev-leonomano-projects"));

    let template = std::fs::read_to_string(out.path().join(TEMPLATE_FILE)).unwrap();
    assert_eq!(template, "kind: Deployment\n");
    let values = std::fs::read_to_string(out.path().join(VALUES_FILE)).unwrap();
    assert_eq!(values, "replicas: 3\ndebug: done\n");
}

#[tokio::test]
async fn dry_run_renders_the_template_but_skips_the_upgrade() {
    init_tracing();
    let out = tempfile::tempdir().unwrap();
    let cfg = ConfigBuilder::new()
        .dry_run(true)
        .output_dir(out.path())
        .build();
    let exec = FakeExecutor::new().with_stdout("helm", "template", "kind: Deployment\n");
    let pipeline = Pipeline::new(&cfg, &exec, RunScope::unbounded());

    with_timeout(pipeline.run()).await.unwrap();

    let helm: Vec<_> = exec
        .executed_by("helm")
        .iter()
        .map(|c| c.subcommand().to_string())
        .collect();
    assert_eq!(helm, ["template"]);
    assert!(
        exec.executed_by("terragrunt")
            .iter()
            .all(|c| c.subcommand() == "plan")
    );
    assert!(out.path().join(TEMPLATE_FILE).is_file());
    assert!(!out.path().join(VALUES_FILE).exists());
}

#[tokio::test]
async fn apply_failure_stops_the_run() {
    init_tracing();
    let cfg = ConfigBuilder::new().build();
    let exec = FakeExecutor::new().failing("terragrunt", "apply", 3);
    let pipeline = Pipeline::new(&cfg, &exec, RunScope::unbounded());

    let err = with_timeout(pipeline.run()).await.unwrap_err();

    assert!(matches!(err, BootError::Step { step: "terragrunt apply", .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(exec.executed_by("helm").is_empty());
    assert_eq!(exec.executed().len(), 2);
}

#[tokio::test]
async fn helm_upgrade_failure_still_persists_the_values() {
    init_tracing();
    let out = tempfile::tempdir().unwrap();
    let cfg = ConfigBuilder::new().output_dir(out.path()).build();
    let exec = FakeExecutor::new()
        .with_stdout("helm", "upgrade", HELM_DEBUG_OUTPUT)
        .failing("helm", "upgrade", 1);
    let pipeline = Pipeline::new(&cfg, &exec, RunScope::unbounded());

    let err = with_timeout(helm_upgrade(&pipeline)).await.unwrap_err();

    assert!(matches!(err, BootError::Step { step: "helm upgrade", .. }));
    let values = std::fs::read_to_string(out.path().join(VALUES_FILE)).unwrap();
    assert_eq!(values, "replicas: 3\ndebug: done\n");
}

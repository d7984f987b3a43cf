//! Config Connector install and removal.
//!
//! Install order: services, iam, then the system group in two phases
//! (namespaces and CRDs file by file, then everything), then the readiness
//! barrier: operator Ready, installed workload present, installed workload
//! Available.

use crate::error::Result;
use crate::models::{ManifestGroup, TaskName};
use crate::orchestrator::executor::run_checked;
use crate::orchestrator::phases::TaskContext;
use crate::orchestrator::readiness::{poll_until_ready, BackoffPolicy};
use std::path::{Path, PathBuf};

pub const SYSTEM_NAMESPACE: &str = "cnrm-system";
pub const OPERATOR_WORKLOAD: &str = "pod/cnrm-controller-manager-0";
pub const INSTALLED_WORKLOAD: &str = "deployment/cnrm-webhook-manager";
pub const CONFIG_CONNECTOR: &str = "configconnector.core.cnrm.cloud.google.com";

/// Files that must exist in the cluster before the rest of the system group.
pub fn is_priority_manifest(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .map_or(false, |name| {
            name.ends_with(".yaml")
                && (name.contains("_namespace_") || name.contains("_customresourcedefinition_"))
        })
}

/// `apply-kcc`
pub async fn apply_kcc(ctx: &TaskContext<'_>) -> Result<()> {
    let task = TaskName::ApplyKcc;

    for group in [ManifestGroup::KccServices, ManifestGroup::KccIam] {
        apply_path(ctx, &ctx.layout.group_dir(group)).await?;
    }

    for file in priority_manifests(ctx)? {
        apply_path(ctx, &file).await?;
    }
    apply_path(ctx, &ctx.layout.group_dir(ManifestGroup::KccSystem)).await?;

    let readiness = &ctx.settings.readiness;
    let timeout = format!("--timeout={}s", readiness.wait_timeout_secs);

    let wait_operator = ctx
        .kubectl()
        .args(["wait", "--for=condition=Ready", OPERATOR_WORKLOAD, "-n", SYSTEM_NAMESPACE])
        .arg(&timeout);
    run_checked(ctx.runner, task, &wait_operator).await?;

    let check = ctx
        .kubectl()
        .args(["get", INSTALLED_WORKLOAD, "-n", SYSTEM_NAMESPACE, "-o", "name"]);
    poll_until_ready(
        ctx.runner,
        &check,
        INSTALLED_WORKLOAD,
        BackoffPolicy::from(readiness),
    )
    .await?;

    let wait_installed = ctx
        .kubectl()
        .args(["wait", "--for=condition=Available", INSTALLED_WORKLOAD, "-n", SYSTEM_NAMESPACE])
        .arg(&timeout);
    run_checked(ctx.runner, task, &wait_installed).await?;

    crate::log_parsed!("[apply-kcc] Config Connector installed and available");
    Ok(())
}

/// `uninstall-kcc`: deletes the ConfigConnector object. The operator removes
/// its in-cluster resources; the cloud resources they manage are left alone.
pub async fn uninstall_kcc(ctx: &TaskContext<'_>) -> Result<()> {
    let cmd = ctx
        .kubectl()
        .args(["delete", "configconnector", CONFIG_CONNECTOR, "--wait=true"]);
    run_checked(ctx.runner, TaskName::UninstallKcc, &cmd).await
}

async fn apply_path(ctx: &TaskContext<'_>, path: &Path) -> Result<()> {
    let cmd = ctx
        .kubectl()
        .args(["apply", "-f"])
        .arg(path.display().to_string());
    run_checked(ctx.runner, TaskName::ApplyKcc, &cmd).await
}

fn priority_manifests(ctx: &TaskContext<'_>) -> Result<Vec<PathBuf>> {
    let files = match ctx.layout.manifest_files(ManifestGroup::KccSystem) {
        Ok(files) => files,
        Err(e) if ctx.dry_run() => {
            log::info!("[DRY-RUN] {}; namespace/CRD files would be applied first", e);
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    Ok(files.into_iter().filter(|f| is_priority_manifest(f)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_manifest_names() {
        assert!(is_priority_manifest(Path::new("/b/v1_namespace_cnrm-system.yaml")));
        assert!(is_priority_manifest(Path::new(
            "apiextensions.k8s.io_v1_customresourcedefinition_x.cnrm.cloud.google.com.yaml"
        )));
        assert!(!is_priority_manifest(Path::new("apps_v1_deployment_cnrm-webhook-manager.yaml")));
        assert!(!is_priority_manifest(Path::new("v1_namespace_cnrm-system.yml")));
        assert!(!is_priority_manifest(Path::new("namespace.yaml")));
    }
}

//! Hydration: render manifest sources into the build layout with `kustomize`.
//!
//! Each group directory is reset immediately before its render so the output
//! only ever holds artifacts of the current source.

use crate::error::Result;
use crate::models::{ManifestGroup, TaskName};
use crate::orchestrator::executor::{run_checked, ToolCommand};
use crate::orchestrator::phases::TaskContext;
use std::path::Path;

/// `kustomize build` of `source` into the directory `out`.
pub fn kustomize_build(ctx: &TaskContext<'_>, source: &Path, out: &Path) -> ToolCommand {
    ToolCommand::new(&ctx.settings.tools.kustomize)
        .args(["build", "--load-restrictor", "LoadRestrictionsNone"])
        .arg(source.display().to_string())
        .arg("-o")
        .arg(out.display().to_string())
}

/// Reset and render each (group, source) pair in order.
pub async fn hydrate_groups(
    ctx: &TaskContext<'_>,
    task: TaskName,
    groups: &[(ManifestGroup, &Path)],
) -> Result<()> {
    for (group, source) in groups {
        let out = if ctx.dry_run() {
            let dir = ctx.layout.group_dir(*group);
            log::info!("[DRY-RUN] Would reset {}", dir.display());
            dir
        } else {
            ctx.layout.reset_group(*group)?
        };
        run_checked(ctx.runner, task, &kustomize_build(ctx, source, &out)).await?;
    }
    Ok(())
}

/// `hydrate-cluster`
pub async fn hydrate_cluster(ctx: &TaskContext<'_>) -> Result<()> {
    hydrate_groups(
        ctx,
        TaskName::HydrateCluster,
        &[(ManifestGroup::Cluster, ctx.settings.cluster_src.as_path())],
    )
    .await
}

/// `hydrate-kcc`
pub async fn hydrate_kcc(ctx: &TaskContext<'_>) -> Result<()> {
    let s = ctx.settings;
    hydrate_groups(
        ctx,
        TaskName::HydrateKcc,
        &[
            (ManifestGroup::KccServices, s.kcc_services_src.as_path()),
            (ManifestGroup::KccIam, s.kcc_iam_src.as_path()),
            (ManifestGroup::KccSystem, s.kcc_system_src.as_path()),
        ],
    )
    .await
}

/// `clean`
pub fn clean(ctx: &TaskContext<'_>) -> Result<()> {
    if ctx.dry_run() {
        log::info!("[DRY-RUN] Would remove {}", ctx.layout.root().display());
        return Ok(());
    }
    ctx.layout.clean()
}

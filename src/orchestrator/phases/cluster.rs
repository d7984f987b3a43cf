//! Cluster lifecycle: apply the hydrated cluster, materialize a local
//! context, and delete the cluster with its operator service account.

use crate::error::Result;
use crate::models::{ClusterConfig, ManifestGroup, TaskName};
use crate::orchestrator::executor::{run_best_effort, run_checked, ToolCommand};
use crate::orchestrator::phases::TaskContext;

/// `apply-cluster`: hand the hydrated cluster manifests to `anthoscli`.
pub async fn apply_cluster(ctx: &TaskContext<'_>) -> Result<()> {
    let dir = ctx.layout.group_dir(ManifestGroup::Cluster);
    let cmd = ToolCommand::new(&ctx.settings.tools.anthoscli)
        .args(["apply", "-f"])
        .arg(dir.display().to_string());
    run_checked(ctx.runner, TaskName::ApplyCluster, &cmd).await
}

/// `create-context`: run the context script with PROJECT, REGION and NAME.
pub async fn create_context(ctx: &TaskContext<'_>, config: &ClusterConfig) -> Result<()> {
    let cmd = ToolCommand::new(ctx.settings.context_script.display().to_string())
        .env("PROJECT", &config.project)
        .env("REGION", &config.location)
        .env("NAME", &config.name)
        .current_dir(&ctx.settings.workdir);
    run_checked(ctx.runner, TaskName::CreateContext, &cmd).await
}

/// `delete-cluster`: both deletions tolerate failure, so deleting an
/// already deleted cluster still succeeds.
pub async fn delete_cluster(ctx: &TaskContext<'_>, config: &ClusterConfig) -> Result<()> {
    let gcloud = &ctx.settings.tools.gcloud;
    let project = format!("--project={}", config.project);

    let delete_account = ToolCommand::new(gcloud)
        .args(["iam", "service-accounts", "delete"])
        .arg(config.service_account())
        .arg(&project)
        .arg("--quiet");
    if !run_best_effort(ctx.runner, TaskName::DeleteCluster, &delete_account).await {
        log::warn!(
            "[delete-cluster] Service account {} not deleted (may already be gone)",
            config.service_account()
        );
    }

    let delete_cluster = ToolCommand::new(gcloud)
        .args(["container", "clusters", "delete"])
        .arg(&config.name)
        .arg(format!("--region={}", config.location))
        .arg(&project)
        .arg("--quiet");
    if !run_best_effort(ctx.runner, TaskName::DeleteCluster, &delete_cluster).await {
        log::warn!(
            "[delete-cluster] Cluster {} not deleted (may already be gone)",
            config.name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::system::BuildLayout;
    use crate::test_support::RecordingRunner;

    fn config() -> ClusterConfig {
        ClusterConfig::new("mgmt1", "us-central1", "my-proj")
    }

    #[tokio::test]
    async fn test_delete_cluster_tolerates_failures() {
        let settings = Settings::with_workdir("/work");
        let layout = BuildLayout::new(&settings.build_dir);
        let runner = RecordingRunner::new();
        runner.fail_always("gcloud", 1);
        let ctx = TaskContext {
            settings: &settings,
            layout: &layout,
            runner: &runner,
        };

        delete_cluster(&ctx, &config()).await.unwrap();
        assert_eq!(
            runner.lines(),
            vec![
                "gcloud iam service-accounts delete mgmt1-cnrm-system@my-proj.iam.gserviceaccount.com --project=my-proj --quiet",
                "gcloud container clusters delete mgmt1 --region=us-central1 --project=my-proj --quiet",
            ]
        );
    }

    #[tokio::test]
    async fn test_create_context_passes_env() {
        let settings = Settings::with_workdir("/work");
        let layout = BuildLayout::new(&settings.build_dir);
        let runner = RecordingRunner::new();
        let ctx = TaskContext {
            settings: &settings,
            layout: &layout,
            runner: &runner,
        };

        create_context(&ctx, &config()).await.unwrap();
        let cmd = &runner.commands()[0];
        assert_eq!(cmd.program, "/work/hack/create_context.sh");
        assert!(cmd.env.contains(&("REGION".to_string(), "us-central1".to_string())));
        assert!(cmd.env.contains(&("PROJECT".to_string(), "my-proj".to_string())));
        assert!(cmd.env.contains(&("NAME".to_string(), "mgmt1".to_string())));
    }

    #[tokio::test]
    async fn test_apply_cluster_failure_propagates() {
        let settings = Settings::with_workdir("/work");
        let layout = BuildLayout::new(&settings.build_dir);
        let runner = RecordingRunner::new();
        runner.fail_always("anthoscli", 9);
        let ctx = TaskContext {
            settings: &settings,
            layout: &layout,
            runner: &runner,
        };

        let err = apply_cluster(&ctx).await.unwrap_err();
        assert_eq!(err.exit_code(), 9);
        assert_eq!(runner.lines(), vec!["anthoscli apply -f /work/.build/cluster"]);
    }
}

//! Command-line surface. Every directory and tool override is also read from
//! its environment variable, so the flag beats the env var which beats the
//! settings file.

use crate::config::{SettingsOverrides, ToolOverrides};
use crate::models::TaskName;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mgmt-cluster",
    version,
    about = "Provision and tear down a management cluster with Config Connector"
)]
pub struct Cli {
    /// Tasks to run; prerequisites are added automatically
    #[arg(value_enum, required_unless_present = "list_tasks")]
    pub tasks: Vec<TaskName>,

    /// Print every task with its prerequisites and exit
    #[arg(long)]
    pub list_tasks: bool,

    /// Log commands instead of running them
    #[arg(long, env = "MGMT_DRY_RUN", value_parser = BoolishValueParser::new())]
    pub dry_run: bool,

    /// Fail validate-values on an invalid cluster name
    #[arg(long, env = "MGMT_STRICT_VALIDATION", value_parser = BoolishValueParser::new())]
    pub strict_validation: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    #[arg(long, env = "WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// Cluster configuration document
    #[arg(long, env = "MGMT_CONFIG")]
    pub config: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, env = "MGMT_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[arg(long, env = "BUILDDIR")]
    pub build_dir: Option<PathBuf>,

    /// Cluster manifest source
    #[arg(long, env = "MANIFESTS_DIR")]
    pub manifests_dir: Option<PathBuf>,

    #[arg(long, env = "KCC_SERVICES_DIR")]
    pub kcc_services_dir: Option<PathBuf>,

    #[arg(long, env = "KCC_IAM_DIR")]
    pub kcc_iam_dir: Option<PathBuf>,

    #[arg(long, env = "KCC_SYSTEM_DIR")]
    pub kcc_system_dir: Option<PathBuf>,

    /// kubectl context for every kubectl call
    #[arg(long, env = "KFCTXT")]
    pub context: Option<String>,

    #[arg(long, env = "CONTEXT_SCRIPT")]
    pub context_script: Option<PathBuf>,

    #[arg(long, env = "KUSTOMIZE")]
    pub kustomize: Option<String>,

    #[arg(long, env = "KUBECTL")]
    pub kubectl: Option<String>,

    #[arg(long, env = "ANTHOSCLI")]
    pub anthoscli: Option<String>,

    #[arg(long, env = "GCLOUD")]
    pub gcloud: Option<String>,

    /// Also write session logs under this directory
    #[arg(long, env = "MGMT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            workdir: self.workdir.clone(),
            config: self.config.clone(),
            build_dir: self.build_dir.clone(),
            cluster_src: self.manifests_dir.clone(),
            kcc_services_src: self.kcc_services_dir.clone(),
            kcc_iam_src: self.kcc_iam_dir.clone(),
            kcc_system_src: self.kcc_system_dir.clone(),
            context: self.context.clone(),
            context_script: self.context_script.clone(),
            strict_validation: self.strict_validation,
            dry_run: self.dry_run,
            tools: ToolOverrides {
                kustomize: self.kustomize.clone(),
                kubectl: self.kubectl.clone(),
                anthoscli: self.anthoscli.clone(),
                gcloud: self.gcloud.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tasks_and_flags() {
        let cli = Cli::try_parse_from([
            "mgmt-cluster",
            "apply-cluster",
            "apply-kcc",
            "--context",
            "mgmt",
            "--kubectl",
            "/opt/kubectl",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.tasks, vec![TaskName::ApplyCluster, TaskName::ApplyKcc]);
        assert_eq!(cli.verbose, 2);

        let overrides = cli.overrides();
        assert_eq!(overrides.context.as_deref(), Some("mgmt"));
        assert_eq!(overrides.tools.kubectl.as_deref(), Some("/opt/kubectl"));
    }

    #[test]
    fn test_tasks_required_unless_listing() {
        assert!(Cli::try_parse_from(["mgmt-cluster"]).is_err());
        assert!(Cli::try_parse_from(["mgmt-cluster", "--list-tasks"]).is_ok());
        assert!(Cli::try_parse_from(["mgmt-cluster", "no-such-task"]).is_err());
    }
}

//! Core data structures: cluster configuration, manifest groups and task names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration key holding the cluster name.
pub const KEY_NAME: &str = "name";
/// Configuration key holding the cluster location (region).
pub const KEY_LOCATION: &str = "location";
/// Configuration key holding the cloud project.
pub const KEY_PROJECT: &str = "gcloud.core.project";

/// The three values every config-requiring task is derived from.
///
/// Loaded once at process start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: String,
    pub location: String,
    pub project: String,
}

impl ClusterConfig {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        ClusterConfig {
            name: name.into(),
            location: location.into(),
            project: project.into(),
        }
    }

    /// Identity of the operator's cloud service account.
    ///
    /// `name` is capped at 18 characters so that `<name>-cnrm-system` stays
    /// within the 30 character account id limit.
    pub fn service_account(&self) -> String {
        format!(
            "{}-cnrm-system@{}.iam.gserviceaccount.com",
            self.name, self.project
        )
    }

    /// (key, value, sentinel) triples in document order.
    pub fn fields(&self) -> [(&'static str, &str, &'static str); 3] {
        [
            (KEY_NAME, self.name.as_str(), "NAME"),
            (KEY_LOCATION, self.location.as_str(), "LOCATION"),
            (KEY_PROJECT, self.project.as_str(), "PROJECT"),
        ]
    }
}

/// A hydrated manifest set, each rendered into its own build subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManifestGroup {
    Cluster,
    KccServices,
    KccIam,
    KccSystem,
}

impl ManifestGroup {
    /// The three groups making up a Config Connector install, in apply order.
    pub const KCC: [ManifestGroup; 3] = [
        ManifestGroup::KccServices,
        ManifestGroup::KccIam,
        ManifestGroup::KccSystem,
    ];

    /// Subdirectory name under the build root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ManifestGroup::Cluster => "cluster",
            ManifestGroup::KccServices => "cnrm-install-services",
            ManifestGroup::KccIam => "cnrm-install-iam",
            ManifestGroup::KccSystem => "cnrm-install-system",
        }
    }
}

impl fmt::Display for ManifestGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Named tasks invokable from the command line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum TaskName {
    ValidateValues,
    HydrateCluster,
    ApplyCluster,
    CreateContext,
    HydrateKcc,
    ApplyKcc,
    UninstallKcc,
    DeleteCluster,
    Clean,
}

impl TaskName {
    pub const ALL: [TaskName; 9] = [
        TaskName::ValidateValues,
        TaskName::HydrateCluster,
        TaskName::ApplyCluster,
        TaskName::CreateContext,
        TaskName::HydrateKcc,
        TaskName::ApplyKcc,
        TaskName::UninstallKcc,
        TaskName::DeleteCluster,
        TaskName::Clean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::ValidateValues => "validate-values",
            TaskName::HydrateCluster => "hydrate-cluster",
            TaskName::ApplyCluster => "apply-cluster",
            TaskName::CreateContext => "create-context",
            TaskName::HydrateKcc => "hydrate-kcc",
            TaskName::ApplyKcc => "apply-kcc",
            TaskName::UninstallKcc => "uninstall-kcc",
            TaskName::DeleteCluster => "delete-cluster",
            TaskName::Clean => "clean",
        }
    }

    /// Direct prerequisites of this task.
    pub fn dependencies(&self) -> &'static [TaskName] {
        match self {
            TaskName::HydrateCluster
            | TaskName::CreateContext
            | TaskName::HydrateKcc
            | TaskName::DeleteCluster => &[TaskName::ValidateValues],
            TaskName::ApplyCluster => &[TaskName::HydrateCluster],
            TaskName::ApplyKcc => &[TaskName::HydrateKcc],
            TaskName::ValidateValues | TaskName::UninstallKcc | TaskName::Clean => &[],
        }
    }

    /// Whether this task reads the cluster configuration.
    pub fn requires_config(&self) -> bool {
        !matches!(self, TaskName::UninstallKcc | TaskName::Clean)
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

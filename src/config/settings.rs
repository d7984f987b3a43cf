//! Orchestrator settings: directories, tool binaries, kubectl context and
//! readiness timings.
//!
//! Resolution order, lowest to highest: built-in defaults, the optional TOML
//! settings file, environment variables, command line flags. The last two
//! arrive together as [`SettingsOverrides`] because clap reads both.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "Kptfile";
pub const DEFAULT_BUILD_DIR: &str = ".build";
pub const DEFAULT_CLUSTER_SRC: &str = "cluster";
pub const DEFAULT_KCC_SERVICES_SRC: &str = "cnrm-install/services";
pub const DEFAULT_KCC_IAM_SRC: &str = "cnrm-install/iam";
pub const DEFAULT_KCC_SYSTEM_SRC: &str = "cnrm-install/install-system";
pub const DEFAULT_CONTEXT_SCRIPT: &str = "hack/create_context.sh";

/// External binaries the orchestrator shells out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub kustomize: String,
    pub kubectl: String,
    pub anthoscli: String,
    pub gcloud: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            kustomize: "kustomize".to_string(),
            kubectl: "kubectl".to_string(),
            anthoscli: "anthoscli".to_string(),
            gcloud: "gcloud".to_string(),
        }
    }
}

/// Upper bound for any readiness timing, in seconds (one day).
pub const MAX_READINESS_SECS: u64 = 24 * 60 * 60;

/// Timings for the Config Connector readiness barrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessSettings {
    /// `--timeout` handed to each blocking `kubectl wait`.
    pub wait_timeout_secs: u64,
    /// Total time allowed for the installed workload to appear.
    pub settle_budget_secs: u64,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        ReadinessSettings {
            wait_timeout_secs: 300,
            settle_budget_secs: 120,
            initial_backoff_secs: 2,
            max_backoff_secs: 15,
        }
    }
}

impl ReadinessSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn settle_budget(&self) -> Duration {
        Duration::from_secs(self.settle_budget_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    /// Reject timings that would spin the check without pause or overflow a deadline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("readiness.wait_timeout_secs", self.wait_timeout_secs),
            ("readiness.settle_budget_secs", self.settle_budget_secs),
            ("readiness.initial_backoff_secs", self.initial_backoff_secs),
            ("readiness.max_backoff_secs", self.max_backoff_secs),
        ];
        for (key, value) in fields {
            if value > MAX_READINESS_SECS {
                return Err(ConfigError::InvalidSetting {
                    key: key.to_string(),
                    reason: format!("{} exceeds the limit of {}", value, MAX_READINESS_SECS),
                });
            }
        }
        for (key, value) in [
            ("readiness.initial_backoff_secs", self.initial_backoff_secs),
            ("readiness.max_backoff_secs", self.max_backoff_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidSetting {
                    key: key.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Optional TOML settings file. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub config: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub cluster_src: Option<PathBuf>,
    pub kcc_services_src: Option<PathBuf>,
    pub kcc_iam_src: Option<PathBuf>,
    pub kcc_system_src: Option<PathBuf>,
    pub context: Option<String>,
    pub context_script: Option<PathBuf>,
    pub strict_validation: Option<bool>,
    pub tools: Option<ToolOverrides>,
    pub readiness: Option<ReadinessSettings>,
}

/// Per-binary overrides, shared by the settings file and the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolOverrides {
    pub kustomize: Option<String>,
    pub kubectl: Option<String>,
    pub anthoscli: Option<String>,
    pub gcloud: Option<String>,
}

impl ToolOverrides {
    fn apply_to(&self, tools: &mut ToolPaths) {
        if let Some(ref v) = self.kustomize {
            tools.kustomize = v.clone();
        }
        if let Some(ref v) = self.kubectl {
            tools.kubectl = v.clone();
        }
        if let Some(ref v) = self.anthoscli {
            tools.anthoscli = v.clone();
        }
        if let Some(ref v) = self.gcloud {
            tools.gcloud = v.clone();
        }
    }
}

/// Values coming from environment variables and command line flags.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub workdir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub cluster_src: Option<PathBuf>,
    pub kcc_services_src: Option<PathBuf>,
    pub kcc_iam_src: Option<PathBuf>,
    pub kcc_system_src: Option<PathBuf>,
    pub context: Option<String>,
    pub context_script: Option<PathBuf>,
    pub strict_validation: bool,
    pub dry_run: bool,
    pub tools: ToolOverrides,
}

/// Fully resolved settings. Paths are absolute or relative to the process
/// working directory, never to `workdir` implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub workdir: PathBuf,
    pub config_path: PathBuf,
    pub build_dir: PathBuf,
    pub cluster_src: PathBuf,
    pub kcc_services_src: PathBuf,
    pub kcc_iam_src: PathBuf,
    pub kcc_system_src: PathBuf,
    pub context: Option<String>,
    pub context_script: PathBuf,
    pub strict_validation: bool,
    pub dry_run: bool,
    pub tools: ToolPaths,
    pub readiness: ReadinessSettings,
}

impl Settings {
    /// Defaults rooted at `workdir`.
    pub fn with_workdir(workdir: impl Into<PathBuf>) -> Self {
        Self::resolve(SettingsFile::default(), SettingsOverrides {
            workdir: Some(workdir.into()),
            ..Default::default()
        })
    }

    /// Merge defaults, the settings file and overrides.
    pub fn resolve(file: SettingsFile, overrides: SettingsOverrides) -> Self {
        let workdir = overrides.workdir.unwrap_or_else(|| PathBuf::from("."));
        let pick = |flag: Option<PathBuf>, from_file: Option<PathBuf>, default: &str| {
            let chosen = flag.or(from_file).unwrap_or_else(|| PathBuf::from(default));
            anchor(&workdir, chosen)
        };

        let mut tools = ToolPaths::default();
        if let Some(ref file_tools) = file.tools {
            file_tools.apply_to(&mut tools);
        }
        overrides.tools.apply_to(&mut tools);

        Settings {
            config_path: pick(overrides.config, file.config, DEFAULT_CONFIG_FILE),
            build_dir: pick(overrides.build_dir, file.build_dir, DEFAULT_BUILD_DIR),
            cluster_src: pick(overrides.cluster_src, file.cluster_src, DEFAULT_CLUSTER_SRC),
            kcc_services_src: pick(
                overrides.kcc_services_src,
                file.kcc_services_src,
                DEFAULT_KCC_SERVICES_SRC,
            ),
            kcc_iam_src: pick(overrides.kcc_iam_src, file.kcc_iam_src, DEFAULT_KCC_IAM_SRC),
            kcc_system_src: pick(
                overrides.kcc_system_src,
                file.kcc_system_src,
                DEFAULT_KCC_SYSTEM_SRC,
            ),
            context_script: pick(
                overrides.context_script,
                file.context_script,
                DEFAULT_CONTEXT_SCRIPT,
            ),
            context: overrides.context.or(file.context).filter(|c| !c.is_empty()),
            strict_validation: overrides.strict_validation
                || file.strict_validation.unwrap_or(false),
            dry_run: overrides.dry_run,
            tools,
            readiness: file.readiness.unwrap_or_default(),
            workdir,
        }
    }
}

/// Resolve `path` against `workdir` unless it is already absolute.
fn anchor(workdir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        workdir.join(path)
    }
}

/// Load a TOML settings file.
pub fn load_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.display().to_string())
        } else {
            ConfigError::IoError(e)
        }
    })?;
    let file: SettingsFile = toml::from_str(&content)?;
    if let Some(ref readiness) = file.readiness {
        readiness.validate()?;
    }
    Ok(file)
}

//! Orchestrator phases: the body of every named task.
//!
//! - **validate** (`validate-values`) - cluster name diagnostics
//! - **hydrate** (`hydrate-cluster`, `hydrate-kcc`, `clean`) - manifest rendering into the build layout
//! - **cluster** (`apply-cluster`, `create-context`, `delete-cluster`) - cluster lifecycle
//! - **kcc** (`apply-kcc`, `uninstall-kcc`) - Config Connector install and removal
//!
//! Each phase receives a [`TaskContext`] and, when it needs one, the loaded
//! [`ClusterConfig`](crate::models::ClusterConfig).

pub mod cluster;
pub mod hydrate;
pub mod kcc;
pub mod validate;

use crate::config::Settings;
use crate::orchestrator::executor::{CommandRunner, ToolCommand};
use crate::system::BuildLayout;

/// Everything a task body may touch.
pub struct TaskContext<'a> {
    pub settings: &'a Settings,
    pub layout: &'a BuildLayout,
    pub runner: &'a dyn CommandRunner,
}

impl<'a> TaskContext<'a> {
    pub fn dry_run(&self) -> bool {
        self.settings.dry_run
    }

    /// `kubectl` with the configured context selector, if any.
    pub fn kubectl(&self) -> ToolCommand {
        let cmd = ToolCommand::new(&self.settings.tools.kubectl);
        match self.settings.context {
            Some(ref ctx) => cmd.arg(format!("--context={}", ctx)),
            None => cmd,
        }
    }
}

//! Task Orchestration: plan the requested tasks over the dependency graph,
//! load the cluster configuration once, and run each task in order,
//! stopping at the first fatal failure.

pub mod executor;
pub mod graph;
pub mod phases;
pub mod readiness;
pub mod state;

pub use executor::{
    run_best_effort, run_checked, CommandOutcome, CommandRunner, DryRunRunner, ProcessRunner,
    ToolCommand,
};
pub use graph::TaskGraph;
pub use state::{RunReport, TaskRecord, TaskState};

use crate::config::{ensure_values_set, load_cluster_config, Settings};
use crate::error::{ConfigError, Result};
use crate::models::{ClusterConfig, TaskName};
use crate::system::BuildLayout;
use phases::{cluster, hydrate, kcc, validate, TaskContext};
use std::sync::Arc;
use std::time::Instant;

/// Runs named tasks against one management cluster.
#[derive(Clone)]
pub struct Orchestrator {
    settings: Settings,
    layout: BuildLayout,
    runner: Arc<dyn CommandRunner>,
    graph: TaskGraph,
}

impl Orchestrator {
    /// Create an orchestrator over `settings`, shelling out through `runner`.
    ///
    /// # Examples
    /// ```ignore
    /// let orch = Orchestrator::new(Settings::with_workdir("."), Arc::new(ProcessRunner));
    /// let report = orch.run(&[TaskName::ApplyCluster]).await;
    /// ```
    pub fn new(settings: Settings, runner: Arc<dyn CommandRunner>) -> Self {
        let layout = BuildLayout::new(&settings.build_dir);
        Orchestrator {
            settings,
            layout,
            runner,
            graph: TaskGraph::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Run `targets` and their prerequisites.
    ///
    /// The cluster configuration is loaded and checked for placeholders only
    /// when a planned task needs it, and before any task runs.
    pub async fn run(&self, targets: &[TaskName]) -> RunReport {
        let plan = match self.graph.plan(targets) {
            Ok(plan) => plan,
            Err(e) => {
                log::error!("[Orchestrator] {}", e);
                return RunReport::aborted(e);
            }
        };
        crate::log_parsed!(
            "PLAN: {}",
            plan.iter().map(TaskName::as_str).collect::<Vec<_>>().join(" -> ")
        );

        let mut report = RunReport::new(&plan);

        let config = if plan.iter().any(TaskName::requires_config) {
            match self.load_config() {
                Ok(config) => Some(config),
                Err(e) => {
                    log::error!("[Orchestrator] {}", e);
                    report.fail(e);
                    return report;
                }
            }
        } else {
            None
        };

        for task in plan {
            report.transition(task, TaskState::Running);
            crate::log_parsed!("TASK START: {}", task);
            let started = Instant::now();

            let result = self.run_task(task, config.as_ref()).await;
            report.set_elapsed(task, started.elapsed());

            match result {
                Ok(()) => {
                    report.transition(task, TaskState::Succeeded);
                    crate::log_parsed!("TASK DONE: {} ({:?})", task, started.elapsed());
                }
                Err(e) => {
                    log::error!("[Orchestrator] {}", e);
                    crate::log_parsed!("TASK FAILED: {}", task);
                    report.transition(task, TaskState::Failed(e.to_string()));
                    report.fail(e);
                    break;
                }
            }
        }
        report
    }

    fn load_config(&self) -> Result<ClusterConfig> {
        let config = load_cluster_config(&self.settings.config_path)?;
        ensure_values_set(&config)?;
        Ok(config)
    }

    async fn run_task(&self, task: TaskName, config: Option<&ClusterConfig>) -> Result<()> {
        let ctx = TaskContext {
            settings: &self.settings,
            layout: &self.layout,
            runner: self.runner.as_ref(),
        };
        let required = || {
            config.ok_or_else(|| ConfigError::MissingValue("cluster configuration".to_string()))
        };

        match task {
            TaskName::ValidateValues => validate::validate_values(&ctx, required()?),
            TaskName::HydrateCluster => hydrate::hydrate_cluster(&ctx).await,
            TaskName::ApplyCluster => cluster::apply_cluster(&ctx).await,
            TaskName::CreateContext => cluster::create_context(&ctx, required()?).await,
            TaskName::HydrateKcc => hydrate::hydrate_kcc(&ctx).await,
            TaskName::ApplyKcc => kcc::apply_kcc(&ctx).await,
            TaskName::UninstallKcc => kcc::uninstall_kcc(&ctx).await,
            TaskName::DeleteCluster => cluster::delete_cluster(&ctx, required()?).await,
            TaskName::Clean => hydrate::clean(&ctx),
        }
    }
}

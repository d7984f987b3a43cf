//! Task State Tracking and Run Report
//!
//! Each planned task moves `Pending -> Running -> Succeeded | Failed`.
//! When a task fails, every task still pending is marked `Skipped`.

use crate::error::TaskError;
use crate::models::TaskName;
use serde::Serialize;
use std::time::Duration;

/// Lifecycle of one task within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed(String),
    Skipped,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed(_) => "failed",
            TaskState::Skipped => "skipped",
        }
    }

    /// Whether a transition to `next` is legal.
    pub fn can_transition_to(&self, next: &TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Running)
                | (TaskState::Pending, TaskState::Skipped)
                | (TaskState::Running, TaskState::Succeeded)
                | (TaskState::Running, TaskState::Failed(_))
        )
    }
}

/// One row of the run report.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub task: TaskName,
    #[serde(flatten)]
    pub state: TaskState,
    pub elapsed_ms: u128,
}

/// Outcome of an orchestrator run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub tasks: Vec<TaskRecord>,
    pub exit_code: i32,
    #[serde(skip)]
    pub error: Option<TaskError>,
}

impl RunReport {
    /// A report with every planned task pending.
    pub fn new(plan: &[TaskName]) -> Self {
        RunReport {
            tasks: plan
                .iter()
                .map(|task| TaskRecord {
                    task: *task,
                    state: TaskState::Pending,
                    elapsed_ms: 0,
                })
                .collect(),
            exit_code: 0,
            error: None,
        }
    }

    /// A report for a run that failed before any task was planned.
    pub fn aborted(error: TaskError) -> Self {
        let mut report = RunReport::new(&[]);
        report.exit_code = error.exit_code();
        report.error = Some(error);
        report
    }

    pub fn state_of(&self, task: TaskName) -> Option<&TaskState> {
        self.tasks.iter().find(|r| r.task == task).map(|r| &r.state)
    }

    /// Move `task` to `next`, ignoring illegal transitions with a warning.
    pub fn transition(&mut self, task: TaskName, next: TaskState) {
        if let Some(record) = self.tasks.iter_mut().find(|r| r.task == task) {
            if record.state.can_transition_to(&next) {
                record.state = next;
            } else {
                log::warn!(
                    "[State] Ignoring invalid transition for {}: {} -> {}",
                    task,
                    record.state.as_str(),
                    next.as_str()
                );
            }
        }
    }

    pub fn set_elapsed(&mut self, task: TaskName, elapsed: Duration) {
        if let Some(record) = self.tasks.iter_mut().find(|r| r.task == task) {
            record.elapsed_ms = elapsed.as_millis();
        }
    }

    /// Record the fatal error and skip everything still pending.
    pub fn fail(&mut self, error: TaskError) {
        for record in self.tasks.iter_mut() {
            if record.state == TaskState::Pending {
                record.state = TaskState::Skipped;
            }
        }
        self.exit_code = error.exit_code();
        self.error = Some(error);
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// One line per task, for the end-of-run summary.
    pub fn summary_lines(&self) -> Vec<String> {
        self.tasks
            .iter()
            .map(|r| match &r.state {
                TaskState::Failed(reason) => {
                    format!("{:<16} {:<10} {}", r.task.as_str(), r.state.as_str(), reason)
                }
                state => format!(
                    "{:<16} {:<10} {}ms",
                    r.task.as_str(),
                    state.as_str(),
                    r.elapsed_ms
                ),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(TaskState::Pending.can_transition_to(&TaskState::Running));
        assert!(TaskState::Running.can_transition_to(&TaskState::Failed("x".into())));
        assert!(!TaskState::Succeeded.can_transition_to(&TaskState::Running));
        assert!(!TaskState::Pending.can_transition_to(&TaskState::Succeeded));
    }

    #[test]
    fn test_fail_skips_pending_tasks() {
        let plan = [
            TaskName::ValidateValues,
            TaskName::HydrateCluster,
            TaskName::ApplyCluster,
        ];
        let mut report = RunReport::new(&plan);
        report.transition(TaskName::ValidateValues, TaskState::Running);
        report.transition(TaskName::ValidateValues, TaskState::Succeeded);
        report.transition(TaskName::HydrateCluster, TaskState::Running);
        report.transition(TaskName::HydrateCluster, TaskState::Failed("boom".into()));
        report.fail(TaskError::CommandFailed {
            task: "hydrate-cluster".into(),
            command: "kustomize build".into(),
            code: Some(1),
        });

        assert_eq!(report.state_of(TaskName::ValidateValues), Some(&TaskState::Succeeded));
        assert_eq!(report.state_of(TaskName::ApplyCluster), Some(&TaskState::Skipped));
        assert_eq!(report.exit_code, 1);
        assert!(!report.succeeded());
    }

    #[test]
    fn test_invalid_transition_is_ignored() {
        let mut report = RunReport::new(&[TaskName::Clean]);
        report.transition(TaskName::Clean, TaskState::Succeeded);
        assert_eq!(report.state_of(TaskName::Clean), Some(&TaskState::Pending));
    }

    #[test]
    fn test_report_serializes() {
        let mut report = RunReport::new(&[TaskName::Clean]);
        report.transition(TaskName::Clean, TaskState::Running);
        report.transition(TaskName::Clean, TaskState::Succeeded);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["tasks"][0]["task"], "clean");
        assert_eq!(json["tasks"][0]["state"], "succeeded");
        assert_eq!(json["exit_code"], 0);
    }
}

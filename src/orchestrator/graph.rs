//! Task dependency graph and topological planning.
//!
//! The graph is a DAG of [`TaskName`] nodes. A plan for a set of requested
//! tasks is the dependency closure in topological order: prerequisites
//! first, each task once, independent requests in the order given.

use crate::error::{Result, TaskError};
use crate::models::TaskName;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct TaskGraph {
    edges: HashMap<TaskName, Vec<TaskName>>,
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::from_edges(
            TaskName::ALL
                .iter()
                .map(|task| (*task, task.dependencies().to_vec())),
        )
    }
}

impl TaskGraph {
    /// Build a graph from (task, prerequisites) pairs.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (TaskName, Vec<TaskName>)>,
    {
        TaskGraph {
            edges: edges.into_iter().collect(),
        }
    }

    pub fn dependencies(&self, task: TaskName) -> &[TaskName] {
        self.edges.get(&task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Topologically ordered dependency closure of `targets`.
    pub fn plan(&self, targets: &[TaskName]) -> Result<Vec<TaskName>> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = HashSet::new();
        for target in targets {
            self.visit(*target, &mut visiting, &mut done, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        task: TaskName,
        visiting: &mut HashSet<TaskName>,
        done: &mut HashSet<TaskName>,
        order: &mut Vec<TaskName>,
    ) -> Result<()> {
        if done.contains(&task) {
            return Ok(());
        }
        if !visiting.insert(task) {
            return Err(TaskError::CycleDetected(task.to_string()));
        }
        for dep in self.dependencies(task) {
            self.visit(*dep, visiting, done, order)?;
        }
        visiting.remove(&task);
        done.insert(task);
        order.push(task);
        Ok(())
    }

    /// Every task with its direct prerequisites, in declaration order.
    pub fn describe(&self) -> Vec<(TaskName, Vec<TaskName>)> {
        TaskName::ALL
            .iter()
            .map(|task| (*task, self.dependencies(*task).to_vec()))
            .collect()
    }
}

// src/registry/mod.rs

//! Task registry: task name → ordered steps, flattened on resolution.

pub mod task;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::types::TaskName;

pub use task::{StageInvocation, Task, TaskStep};

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a validated manifest.
    ///
    /// Each step name is looked up among the stages first and otherwise taken
    /// as a task reference; validation guarantees the two never clash.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let stages: HashMap<&str, Arc<StageInvocation>> = cfg
            .stages()
            .iter()
            .map(|(name, spec)| {
                (
                    name.as_str(),
                    Arc::new(StageInvocation::new(name.clone(), spec.clone())),
                )
            })
            .collect();

        let mut registry = Self::new();
        for (name, task) in cfg.tasks().iter() {
            let steps = task
                .steps
                .iter()
                .map(|step| match stages.get(step.as_str()) {
                    Some(inv) => TaskStep::Stage(Arc::clone(inv)),
                    None => TaskStep::Task(step.clone()),
                })
                .collect();
            registry.register_task(Task {
                name: name.clone(),
                description: task.description.clone(),
                steps,
            })?;
        }

        debug!(tasks = registry.tasks.len(), "task registry built");
        Ok(registry)
    }

    /// Register `name` with its step sequence.
    pub fn register(&mut self, name: impl Into<TaskName>, steps: Vec<TaskStep>) -> Result<()> {
        self.register_task(Task {
            name: name.into(),
            description: None,
            steps,
        })
    }

    fn register_task(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.name) {
            return Err(PipelineError::DuplicateTask(task.name));
        }
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Registered task names in sorted order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    /// Flatten `name` into the ordered list of stages it runs.
    ///
    /// Fails with `UnknownTask` if `name` or any nested reference is not
    /// registered, and with `CyclicTask` if a task reappears in its own
    /// expansion chain.
    pub fn resolve(&self, name: &str) -> Result<Vec<Arc<StageInvocation>>> {
        let mut chain = Vec::new();
        let mut out = Vec::new();
        self.flatten_into(name, &mut chain, &mut out)?;
        Ok(out)
    }

    fn flatten_into(
        &self,
        name: &str,
        chain: &mut Vec<TaskName>,
        out: &mut Vec<Arc<StageInvocation>>,
    ) -> Result<()> {
        if chain.iter().any(|n| n == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(PipelineError::CyclicTask { chain: cycle });
        }

        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| PipelineError::UnknownTask(name.to_string()))?;

        chain.push(name.to_string());
        for step in task.steps.iter() {
            match step {
                TaskStep::Stage(inv) => out.push(Arc::clone(inv)),
                TaskStep::Task(nested) => self.flatten_into(nested, chain, out)?,
            }
        }
        chain.pop();

        Ok(())
    }
}

// src/registry/task.rs

use std::sync::Arc;

use crate::stages::StageSpec;
use crate::types::TaskName;

/// A named stage with its immutable configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInvocation {
    pub name: String,
    pub spec: StageSpec,
}

impl StageInvocation {
    pub fn new(name: impl Into<String>, spec: StageSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

/// One entry of a task's sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStep {
    /// Run this stage.
    Stage(Arc<StageInvocation>),
    /// Run every step of another task, in place.
    Task(TaskName),
}

impl TaskStep {
    pub fn stage(name: impl Into<String>, spec: StageSpec) -> Self {
        TaskStep::Stage(Arc::new(StageInvocation::new(name, spec)))
    }

    pub fn task(name: impl Into<TaskName>) -> Self {
        TaskStep::Task(name.into())
    }
}

/// A registered task.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    pub description: Option<String>,
    pub steps: Vec<TaskStep>,
}

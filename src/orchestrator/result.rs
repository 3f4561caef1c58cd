// src/orchestrator/result.rs

use std::time::Duration;

use crate::errors::PipelineError;
use crate::stages::StageOutput;
use crate::types::TaskName;

/// How a single stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Succeeded(StageOutput),
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: String,
    pub status: StageStatus,
    pub duration: Duration,
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, StageStatus::Succeeded(_))
    }
}

/// Record of one orchestrator run.
///
/// `outcomes` holds every attempted stage in order; a failed run ends with
/// exactly one failed outcome and lists the stages it never reached in
/// `not_attempted`.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub task: TaskName,
    pub outcomes: Vec<StageOutcome>,
    pub not_attempted: Vec<String>,
    pub duration: Duration,
}

impl BuildResult {
    pub fn new(task: impl Into<TaskName>) -> Self {
        Self {
            task: task.into(),
            outcomes: Vec::new(),
            not_attempted: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    /// The failed stage, if the run failed.
    pub fn failure(&self) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|o| !o.is_success())
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Convert a failed run into a `StageExecution` error naming the stage
    /// and cause; successful runs pass through.
    pub fn into_result(self) -> Result<Self, PipelineError> {
        let failed = self.failure().and_then(|o| match &o.status {
            StageStatus::Failed { error } => Some((o.stage.clone(), error.clone())),
            StageStatus::Succeeded(_) => None,
        });
        match failed {
            Some((stage, message)) => Err(PipelineError::StageExecution {
                task: self.task,
                stage,
                message,
            }),
            None => Ok(self),
        }
    }
}

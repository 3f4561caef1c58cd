// src/orchestrator/mod.rs

//! Sequential execution of a resolved task.

pub mod result;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tracing::{error, info, warn};

use crate::errors::Result;
use crate::registry::{StageInvocation, TaskRegistry};
use crate::stages::{StageOutput, StageRunner};

pub use result::{BuildResult, StageOutcome, StageStatus};

#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestratorOptions {
    /// Fail a stage that runs longer than this. `None` waits indefinitely.
    pub stage_timeout: Option<Duration>,
}

/// Runs tasks from a [`TaskRegistry`] through a [`StageRunner`].
///
/// Stages of one run execute strictly one after another, because a stage may
/// consume files its predecessor produced. Separate `run` calls are
/// independent and may overlap.
pub struct BuildOrchestrator {
    registry: Arc<TaskRegistry>,
    runner: Arc<dyn StageRunner>,
    options: OrchestratorOptions,
}

impl fmt::Debug for BuildOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOrchestrator")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl BuildOrchestrator {
    pub fn new(
        registry: Arc<TaskRegistry>,
        runner: Arc<dyn StageRunner>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            registry,
            runner,
            options,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Resolve and execute `task`.
    ///
    /// Resolution problems (`UnknownTask`, `CyclicTask`) are returned as
    /// errors before anything runs. Stage failures are not errors here: the
    /// run stops at the first one and the returned [`BuildResult`] records
    /// it. Files written by earlier stages are left in place.
    pub async fn run(&self, task: &str) -> Result<BuildResult> {
        let stages = self.registry.resolve(task)?;
        info!(task, stages = stages.len(), "starting run");

        let started = Instant::now();
        let mut result = BuildResult::new(task);

        for (idx, invocation) in stages.iter().enumerate() {
            let stage_started = Instant::now();
            let outcome = self.run_stage(invocation).await;
            let duration = stage_started.elapsed();

            match outcome {
                Ok(output) => {
                    info!(
                        task,
                        stage = %invocation.name,
                        written = output.written.len(),
                        removed = output.removed.len(),
                        elapsed_ms = duration.as_millis() as u64,
                        "stage finished"
                    );
                    result.outcomes.push(StageOutcome {
                        stage: invocation.name.clone(),
                        status: StageStatus::Succeeded(output),
                        duration,
                    });
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    error!(task, stage = %invocation.name, error = %message, "stage failed");
                    result.outcomes.push(StageOutcome {
                        stage: invocation.name.clone(),
                        status: StageStatus::Failed { error: message },
                        duration,
                    });
                    result.not_attempted = stages[idx + 1..]
                        .iter()
                        .map(|s| s.name.clone())
                        .collect();
                    if !result.not_attempted.is_empty() {
                        warn!(task, skipped = ?result.not_attempted, "remaining stages not attempted");
                    }
                    break;
                }
            }
        }

        result.duration = started.elapsed();
        info!(
            task,
            success = result.is_success(),
            elapsed_ms = result.duration.as_millis() as u64,
            "run finished"
        );
        Ok(result)
    }

    async fn run_stage(&self, invocation: &Arc<StageInvocation>) -> anyhow::Result<StageOutput> {
        let runner = Arc::clone(&self.runner);
        let inv = Arc::clone(invocation);
        let handle = tokio::task::spawn_blocking(move || runner.run_stage(&inv));

        let joined = match self.options.stage_timeout {
            // The blocking thread cannot be interrupted; it finishes in the
            // background and its output is discarded.
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => return Err(anyhow!("stage timed out after {limit:?}")),
            },
            None => handle.await,
        };

        joined.map_err(|e| anyhow!("stage worker failed: {e}"))?
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetpipe::registry::StageInvocation;
use assetpipe::stages::{StageOutput, StageRunner};

/// A fake stage runner that:
/// - records the name of every stage it is asked to run, in order
/// - fails on stages listed in `fail_on`
/// - sleeps on stages given a delay, to simulate slow work
#[derive(Default)]
pub struct FakeStageRunner {
    executed: Arc<Mutex<Vec<String>>>,
    fail_on: Mutex<Vec<String>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl FakeStageRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(self, stage: &str) -> Self {
        self.fail_on.lock().unwrap().push(stage.to_string());
        self
    }

    pub fn with_delay(self, stage: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(stage.to_string(), delay);
        self
    }

    /// Stop failing on `stage` from now on.
    pub fn heal(&self, stage: &str) {
        self.fail_on.lock().unwrap().retain(|s| s != stage);
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn count(&self, stage: &str) -> usize {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.as_str() == stage)
            .count()
    }
}

impl StageRunner for FakeStageRunner {
    fn run_stage(&self, invocation: &StageInvocation) -> anyhow::Result<StageOutput> {
        self.executed.lock().unwrap().push(invocation.name.clone());

        let delay = self.delays.lock().unwrap().get(&invocation.name).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if self.fail_on.lock().unwrap().contains(&invocation.name) {
            anyhow::bail!("stage '{}' configured to fail", invocation.name);
        }
        Ok(StageOutput::default())
    }
}

// src/watch/scheduler.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::orchestrator::{BuildOrchestrator, BuildResult};
use crate::paths::{relative_str, PathResolver};
use crate::types::{TaskName, TriggerReason};
use crate::watch::hash::compute_hash_for_paths;
use crate::watch::matcher::PatternMatcher;

/// Per-registration trigger buffer. One queued trigger is enough to mark a
/// registration dirty, so overflow is harmless.
const TRIGGER_BUFFER: usize = 16;

/// A glob list bound to the task it triggers.
#[derive(Debug, Clone)]
pub struct WatchRegistration {
    pub name: String,
    pub task: TaskName,
    pub matcher: PatternMatcher,
    /// Skip runs when the content of the matched files has not changed.
    pub use_hash: bool,
}

/// How a triggered run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Finished(BuildResult),
    /// `use_hash` registration whose files hash to the last built state.
    Unchanged,
    /// The orchestrator could not start the run (e.g. the task vanished).
    Error(String),
}

/// Emitted once per debounced run.
#[derive(Debug)]
pub struct RunReport {
    pub registration: String,
    pub task: TaskName,
    pub reason: TriggerReason,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            RunOutcome::Finished(result) => result.is_success(),
            RunOutcome::Unchanged => true,
            RunOutcome::Error(_) => false,
        }
    }
}

/// Maps file changes to debounced task runs.
///
/// Each registration runs its own state machine:
///
/// ```text
/// IDLE --change--> DEBOUNCING --quiet for `debounce`--> RUNNING --done--> IDLE
///                   ^    |                                |
///                   +----+ change: restart window         | change: mark pending
///                                                         v
///                                       done with pending -> DEBOUNCING
/// ```
///
/// Any number of changes during a run collapse into one follow-up run.
/// Registrations are independent and their runs may overlap.
#[derive(Debug)]
pub struct WatchScheduler {
    orchestrator: Arc<BuildOrchestrator>,
    resolver: PathResolver,
    root: PathBuf,
    debounce: Duration,
    registrations: Vec<WatchRegistration>,
}

impl WatchScheduler {
    pub fn new(
        orchestrator: Arc<BuildOrchestrator>,
        resolver: PathResolver,
        root: impl Into<PathBuf>,
        debounce: Duration,
    ) -> Self {
        Self {
            orchestrator,
            resolver,
            root: root.into(),
            debounce,
            registrations: Vec::new(),
        }
    }

    /// Build a scheduler with one registration per `[watch.<name>]` entry.
    pub fn from_config(
        cfg: &ConfigFile,
        orchestrator: Arc<BuildOrchestrator>,
        resolver: PathResolver,
        root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mut scheduler = Self::new(
            orchestrator,
            resolver,
            root,
            cfg.config_section().debounce(),
        );
        for (name, entry) in cfg.watches() {
            scheduler.register(name.as_str(), &entry.files, &entry.task, entry.use_hash)?;
        }
        Ok(scheduler)
    }

    /// Watch `globs` (relative to the root) and run `task` when they change.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        globs: &[String],
        task: &str,
        use_hash: bool,
    ) -> Result<()> {
        let name = name.into();
        if globs.is_empty() {
            return Err(PipelineError::Config(format!(
                "watch registration '{name}' has no file patterns"
            )));
        }
        if !self.orchestrator.registry().contains(task) {
            return Err(PipelineError::UnknownTask(task.to_string()));
        }
        let matcher = PatternMatcher::new(globs)?;

        debug!(registration = %name, task, ?globs, use_hash, "watch registered");
        self.registrations.push(WatchRegistration {
            name,
            task: task.to_string(),
            matcher,
            use_hash,
        });
        Ok(())
    }

    pub fn registrations(&self) -> &[WatchRegistration] {
        &self.registrations
    }

    /// Start consuming `events` (changed paths, absolute or relative to the
    /// root). Completed runs are sent to `reports` when given.
    pub fn start(
        self,
        events: mpsc::Receiver<PathBuf>,
        reports: Option<mpsc::UnboundedSender<RunReport>>,
    ) -> WatchHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut routes = Vec::with_capacity(self.registrations.len());
        let mut loops = Vec::with_capacity(self.registrations.len());

        for registration in self.registrations {
            let registration = Arc::new(registration);
            let (tx, rx) = mpsc::channel::<()>(TRIGGER_BUFFER);
            routes.push((Arc::clone(&registration), tx));

            let ctx = LoopContext {
                registration,
                orchestrator: Arc::clone(&self.orchestrator),
                resolver: self.resolver.clone(),
                root: self.root.clone(),
                debounce: self.debounce,
                reports: reports.clone(),
            };
            loops.push(tokio::spawn(registration_loop(ctx, rx, shutdown_rx.clone())));
        }

        info!(
            registrations = routes.len(),
            root = ?self.root,
            debounce_ms = self.debounce.as_millis() as u64,
            "watch scheduler started"
        );

        let dispatcher = tokio::spawn(dispatch(self.root, events, routes, shutdown_rx));

        WatchHandle {
            shutdown: shutdown_tx,
            dispatcher,
            loops,
        }
    }
}

/// Controls a running scheduler.
#[derive(Debug)]
pub struct WatchHandle {
    shutdown: watch::Sender<bool>,
    dispatcher: JoinHandle<()>,
    loops: Vec<JoinHandle<()>>,
}

impl WatchHandle {
    /// Stop observing changes. Runs already in flight complete first;
    /// pending follow-ups and debounce windows are dropped.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.dispatcher.await {
            warn!("watch dispatcher ended abnormally: {err}");
        }
        for handle in self.loops {
            if let Err(err) = handle.await {
                warn!("watch loop ended abnormally: {err}");
            }
        }
        info!("watch scheduler stopped");
    }

    /// Wait until the event source closes and every registration has gone
    /// idle.
    pub async fn wait(self) {
        let _ = self.dispatcher.await;
        for handle in self.loops {
            let _ = handle.await;
        }
    }
}

/// Route each changed path to every registration whose globs match it.
async fn dispatch(
    root: PathBuf,
    mut events: mpsc::Receiver<PathBuf>,
    routes: Vec<(Arc<WatchRegistration>, mpsc::Sender<()>)>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let path = tokio::select! {
            _ = shutdown.changed() => break,
            next = events.recv() => match next {
                Some(path) => path,
                None => break,
            },
        };

        let Some(rel) = relativize(&root, &path) else {
            debug!(path = ?path, root = ?root, "change outside project root ignored");
            continue;
        };

        for (registration, tx) in &routes {
            if registration.matcher.is_match(&rel) {
                debug!(registration = %registration.name, path = %rel, "watch match");
                // A full buffer already guarantees a run.
                if let Err(mpsc::error::TrySendError::Closed(_)) = tx.try_send(()) {
                    debug!(registration = %registration.name, "registration loop gone");
                }
            }
        }
    }
    debug!("watch dispatcher ended");
}

fn relativize(root: &Path, path: &Path) -> Option<String> {
    if path.is_absolute() {
        relative_str(root, path)
    } else {
        Some(path.to_string_lossy().trim_start_matches("./").replace('\\', "/"))
    }
}

struct LoopContext {
    registration: Arc<WatchRegistration>,
    orchestrator: Arc<BuildOrchestrator>,
    resolver: PathResolver,
    root: PathBuf,
    debounce: Duration,
    reports: Option<mpsc::UnboundedSender<RunReport>>,
}

impl LoopContext {
    fn report(&self, reason: TriggerReason, outcome: RunOutcome) {
        if let Some(tx) = &self.reports {
            let _ = tx.send(RunReport {
                registration: self.registration.name.clone(),
                task: self.registration.task.clone(),
                reason,
                outcome,
            });
        }
    }

    async fn content_hash(&self) -> Option<String> {
        let resolver = self.resolver.clone();
        let root = self.root.clone();
        let patterns = self.registration.matcher.patterns().to_vec();
        let joined = tokio::task::spawn_blocking(move || {
            let files = resolver.expand_files(&patterns, &root)?;
            compute_hash_for_paths(resolver.fs().as_ref(), files)
        })
        .await;

        match joined {
            Ok(Ok(hash)) => Some(hash),
            Ok(Err(err)) => {
                warn!(registration = %self.registration.name, "hashing watched files failed: {err:#}");
                None
            }
            Err(err) => {
                warn!(registration = %self.registration.name, "hashing task failed: {err}");
                None
            }
        }
    }
}

async fn registration_loop(
    ctx: LoopContext,
    mut triggers: mpsc::Receiver<()>,
    mut shutdown: watch::Receiver<bool>,
) {
    let name = ctx.registration.name.clone();
    let mut last_hash = if ctx.registration.use_hash {
        ctx.content_hash().await
    } else {
        None
    };
    let mut closed = false;

    'idle: loop {
        // IDLE
        if closed {
            break;
        }
        tokio::select! {
            _ = shutdown.changed() => break,
            next = triggers.recv() => if next.is_none() { break },
        }

        let mut reason = TriggerReason::FileWatch;
        loop {
            // DEBOUNCING
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break 'idle,
                    next = triggers.recv(), if !closed => {
                        if next.is_none() {
                            closed = true;
                        }
                    }
                    _ = tokio::time::sleep(ctx.debounce) => break,
                }
            }

            // RUNNING
            let current_hash = if ctx.registration.use_hash {
                ctx.content_hash().await
            } else {
                None
            };
            if current_hash.is_some() && current_hash == last_hash {
                debug!(registration = %name, "watched files unchanged; skipping run");
                ctx.report(reason, RunOutcome::Unchanged);
                continue 'idle;
            }

            info!(registration = %name, task = %ctx.registration.task, ?reason, "watch run starting");
            let orchestrator = Arc::clone(&ctx.orchestrator);
            let task = ctx.registration.task.clone();
            let mut run = tokio::spawn(async move { orchestrator.run(&task).await });

            let mut pending = false;
            let joined = loop {
                tokio::select! {
                    joined = &mut run => break joined,
                    next = triggers.recv(), if !closed => match next {
                        Some(()) => pending = true,
                        None => closed = true,
                    },
                }
            };

            let outcome = match joined {
                Ok(Ok(result)) => {
                    if result.is_success() {
                        last_hash = current_hash;
                    } else if let Some(failure) = result.failure() {
                        error!(
                            registration = %name,
                            task = %result.task,
                            stage = %failure.stage,
                            "watch run failed"
                        );
                    }
                    RunOutcome::Finished(result)
                }
                Ok(Err(err)) => {
                    error!(registration = %name, "watch run could not start: {err}");
                    RunOutcome::Error(err.to_string())
                }
                Err(err) => {
                    error!(registration = %name, "watch run aborted: {err}");
                    RunOutcome::Error(err.to_string())
                }
            };
            ctx.report(reason, outcome);

            if *shutdown.borrow() {
                break 'idle;
            }
            if !pending {
                continue 'idle;
            }
            debug!(registration = %name, "changes arrived during run; scheduling follow-up");
            reason = TriggerReason::Coalesced;
        }
    }

    debug!(registration = %name, "watch loop ended");
}

// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod orchestrator;
pub mod paths;
pub mod registry;
pub mod stages;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::default_config_path;
use crate::config::{load_or_builtin, ConfigFile};
use crate::fs::{FileSystem, RealFileSystem};
use crate::orchestrator::{BuildOrchestrator, OrchestratorOptions};
use crate::paths::PathResolver;
use crate::registry::TaskRegistry;
use crate::stages::{CommandToolchain, ToolchainStageRunner};
use crate::types::WATCH_TASK;
use crate::watch::{spawn_fs_watcher, RunOutcome, RunReport, WatchScheduler};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading (file or built-in)
/// - task registry, stage runner and orchestrator
/// - either a single run, or the watch scheduler + file watcher
/// - Ctrl-C handling in watch mode
pub async fn run(args: CliArgs) -> Result<()> {
    let (config_path, explicit) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (default_config_path(), false),
    };
    let cfg = load_or_builtin(&config_path, explicit)
        .with_context(|| format!("loading manifest {config_path:?}"))?;

    if args.list {
        print_listing(&cfg);
        return Ok(());
    }

    let registry = Arc::new(TaskRegistry::from_config(&cfg)?);
    let task = match &args.task {
        Some(task) => task.clone(),
        None => {
            let default_task = &cfg.config_section().default_task;
            if !registry.contains(default_task) {
                debug!(task = %default_task, "no task given and no default task declared; nothing to do");
                return Ok(());
            }
            default_task.clone()
        }
    };

    if args.dry_run {
        return print_dry_run(&cfg, &registry, &task);
    }

    let root = project_root(args.root.as_deref(), &config_path)?;
    debug!(root = ?root, task = %task, "resolved project root");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let resolver = PathResolver::new(fs);
    let toolchain = Arc::new(CommandToolchain::new(cfg.tools().clone(), root.clone()));
    let runner = Arc::new(ToolchainStageRunner::new(
        root.clone(),
        resolver.clone(),
        toolchain,
        cfg.config_section().banner.clone(),
    ));
    let options = OrchestratorOptions {
        stage_timeout: cfg.config_section().stage_timeout(),
    };
    let orchestrator = Arc::new(BuildOrchestrator::new(registry, runner, options));

    if task == WATCH_TASK {
        return watch_mode(&cfg, orchestrator, resolver, root).await;
    }

    let result = orchestrator.run(&task).await?;
    let result = result.into_result()?;
    println!(
        "task '{}' finished: {} stage(s) in {} ms",
        result.task,
        result.succeeded_count(),
        result.duration.as_millis()
    );
    Ok(())
}

async fn watch_mode(
    cfg: &ConfigFile,
    orchestrator: Arc<BuildOrchestrator>,
    resolver: PathResolver,
    root: PathBuf,
) -> Result<()> {
    let scheduler = WatchScheduler::from_config(cfg, orchestrator, resolver, root.clone())?;
    if scheduler.registrations().is_empty() {
        warn!("manifest declares no [watch] entries; nothing will trigger");
    }

    let (watcher, events) = spawn_fs_watcher(&root)?;
    let (report_tx, mut report_rx) = mpsc::unbounded_channel::<RunReport>();
    let handle = scheduler.start(events, Some(report_tx));

    let reporter = tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            print_report(&report);
        }
    });

    println!("watching {} (Ctrl-C to stop)", root.display());
    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl-C")?;
    info!("shutdown requested; waiting for in-flight runs");

    drop(watcher);
    handle.stop().await;
    let _ = reporter.await;
    Ok(())
}

fn print_report(report: &RunReport) {
    match &report.outcome {
        RunOutcome::Finished(result) => match result.failure() {
            None => println!(
                "[{}] {} ok ({} ms)",
                report.registration,
                report.task,
                result.duration.as_millis()
            ),
            Some(failed) => println!(
                "[{}] {} FAILED at {}",
                report.registration, report.task, failed.stage
            ),
        },
        RunOutcome::Unchanged => {
            println!("[{}] unchanged, skipped", report.registration)
        }
        RunOutcome::Error(msg) => println!("[{}] {} error: {msg}", report.registration, report.task),
    }
}

/// The project root: `--root` if given, else the manifest's directory.
fn project_root(explicit: Option<&Path>, config_path: &Path) -> Result<PathBuf> {
    let root = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => match config_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    root.canonicalize()
        .with_context(|| format!("resolving project root {root:?}"))
}

fn print_listing(cfg: &ConfigFile) {
    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks() {
        match &task.description {
            Some(desc) => println!("  {name:<12} {desc}"),
            None => println!("  {name}"),
        }
    }

    println!();
    println!("watch ({}):", cfg.watches().len());
    for (name, entry) in cfg.watches() {
        println!("  {name:<12} -> {} {:?}", entry.task, entry.files);
    }
}

fn print_dry_run(cfg: &ConfigFile, registry: &TaskRegistry, task: &str) -> Result<()> {
    println!("assetpipe dry-run");

    if task == WATCH_TASK {
        println!("  debounce: {} ms", cfg.config_section().debounce_ms);
        for (name, entry) in cfg.watches() {
            println!("  watch {name}: {:?} -> {}", entry.files, entry.task);
        }
        return Ok(());
    }

    let stages = registry.resolve(task)?;
    println!("task '{task}' ({} stage(s)):", stages.len());
    for (idx, stage) in stages.iter().enumerate() {
        println!("  {:>2}. {} [{}]", idx + 1, stage.name, stage.spec.kind());
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

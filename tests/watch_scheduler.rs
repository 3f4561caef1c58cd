// tests/watch_scheduler.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assetpipe::errors::PipelineError;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::fs::RealFileSystem;
use assetpipe::orchestrator::{BuildOrchestrator, OrchestratorOptions};
use assetpipe::paths::PathResolver;
use assetpipe::registry::TaskRegistry;
use assetpipe::types::TriggerReason;
use assetpipe::watch::{RunOutcome, RunReport, WatchHandle, WatchScheduler};
use assetpipe_test_utils::builders::ConfigFileBuilder;
use assetpipe_test_utils::fake_runner::FakeStageRunner;
use assetpipe_test_utils::init_tracing;
use tokio::sync::mpsc;

const DEBOUNCE: Duration = Duration::from_millis(50);
const QUIET: Duration = Duration::from_millis(300);

struct Harness {
    events: mpsc::Sender<PathBuf>,
    reports: mpsc::UnboundedReceiver<RunReport>,
    handle: WatchHandle,
}

impl Harness {
    async fn touch(&self, path: &str) {
        self.events.send(PathBuf::from(path)).await.unwrap();
    }

    async fn next_report(&mut self, within: Duration) -> Option<RunReport> {
        tokio::time::timeout(within, self.reports.recv())
            .await
            .ok()
            .flatten()
    }
}

fn orchestrator(runner: Arc<FakeStageRunner>) -> Arc<BuildOrchestrator> {
    let cfg = ConfigFileBuilder::new()
        .with_noop_stage("compile_styles")
        .with_noop_stage("compile_scripts")
        .with_task("styles", &["compile_styles"])
        .with_task("scripts", &["compile_scripts"])
        .build();
    let registry = Arc::new(TaskRegistry::from_config(&cfg).unwrap());
    Arc::new(BuildOrchestrator::new(
        registry,
        runner,
        OrchestratorOptions::default(),
    ))
}

fn scheduler(runner: Arc<FakeStageRunner>) -> WatchScheduler {
    let mut scheduler = WatchScheduler::new(
        orchestrator(runner),
        PathResolver::new(Arc::new(RealFileSystem)),
        "/project",
        DEBOUNCE,
    );
    scheduler
        .register("styles", &["src/assets/scss/**/*.scss".to_string()], "styles", false)
        .unwrap();
    scheduler
        .register("scripts", &["src/assets/coffee/**/*.coffee".to_string()], "scripts", false)
        .unwrap();
    scheduler
}

fn spawn(scheduler: WatchScheduler) -> Harness {
    let (events, events_rx) = mpsc::channel(64);
    let (reports_tx, reports) = mpsc::unbounded_channel();
    let handle = scheduler.start(events_rx, Some(reports_tx));
    Harness {
        events,
        reports,
        handle,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_of_changes_yields_one_run() {
    init_tracing();
    let runner = Arc::new(FakeStageRunner::new());
    let mut h = spawn(scheduler(Arc::clone(&runner)));

    for _ in 0..10 {
        h.touch("src/assets/scss/app.scss").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let report = h.next_report(Duration::from_secs(2)).await.expect("one run");
    assert_eq!(report.task, "styles");
    assert_eq!(report.reason, TriggerReason::FileWatch);
    assert!(report.is_success());

    assert!(h.next_report(QUIET).await.is_none(), "no second run expected");
    assert_eq!(runner.count("compile_styles"), 1);
    assert_eq!(runner.count("compile_scripts"), 0);

    h.handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn changes_during_a_run_coalesce_into_one_follow_up() {
    init_tracing();
    let runner = Arc::new(
        FakeStageRunner::new().with_delay("compile_styles", Duration::from_millis(300)),
    );
    let mut h = spawn(scheduler(Arc::clone(&runner)));

    h.touch("src/assets/scss/app.scss").await;
    // Past the debounce window, inside the run.
    tokio::time::sleep(Duration::from_millis(150)).await;
    for _ in 0..5 {
        h.touch("src/assets/scss/_grid.scss").await;
    }

    let first = h.next_report(Duration::from_secs(2)).await.expect("first run");
    assert_eq!(first.reason, TriggerReason::FileWatch);

    let second = h.next_report(Duration::from_secs(2)).await.expect("follow-up run");
    assert_eq!(second.reason, TriggerReason::Coalesced);

    assert!(h.next_report(QUIET).await.is_none(), "exactly one follow-up");
    assert_eq!(runner.count("compile_styles"), 2);

    h.handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn registrations_run_independently() {
    init_tracing();
    let runner = Arc::new(
        FakeStageRunner::new().with_delay("compile_styles", Duration::from_millis(400)),
    );
    let mut h = spawn(scheduler(Arc::clone(&runner)));

    h.touch("src/assets/scss/app.scss").await;
    h.touch("src/assets/coffee/app.coffee").await;

    let first = h.next_report(Duration::from_secs(2)).await.unwrap();
    let second = h.next_report(Duration::from_secs(2)).await.unwrap();

    // The slow styles run does not hold up scripts.
    assert_eq!(first.task, "scripts");
    assert_eq!(second.task, "styles");
    assert!(first.is_success() && second.is_success());

    h.handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_run_does_not_stop_watching() {
    init_tracing();
    let runner = Arc::new(FakeStageRunner::new().failing_on("compile_styles"));
    let mut h = spawn(scheduler(Arc::clone(&runner)));

    h.touch("src/assets/scss/app.scss").await;
    let failed = h.next_report(Duration::from_secs(2)).await.unwrap();
    assert!(!failed.is_success());
    match &failed.outcome {
        RunOutcome::Finished(result) => {
            assert_eq!(result.failure().unwrap().stage, "compile_styles")
        }
        other => panic!("expected a finished run, got {other:?}"),
    }

    runner.heal("compile_styles");
    h.touch("src/assets/scss/app.scss").await;
    let fixed = h.next_report(Duration::from_secs(2)).await.unwrap();
    assert!(fixed.is_success());

    h.handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unmatched_and_absolute_paths() {
    init_tracing();
    let runner = Arc::new(FakeStageRunner::new());
    let mut h = spawn(scheduler(Arc::clone(&runner)));

    h.touch("src/assets/img/logo.png").await;
    h.touch("/elsewhere/src/assets/scss/app.scss").await;
    assert!(h.next_report(QUIET).await.is_none());

    h.touch("/project/src/assets/coffee/nav/menu.coffee").await;
    let report = h.next_report(Duration::from_secs(2)).await.unwrap();
    assert_eq!(report.task, "scripts");

    h.handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_lets_the_in_flight_run_finish() {
    init_tracing();
    let runner = Arc::new(
        FakeStageRunner::new().with_delay("compile_styles", Duration::from_millis(200)),
    );
    let mut h = spawn(scheduler(Arc::clone(&runner)));

    h.touch("src/assets/scss/app.scss").await;
    tokio::time::sleep(Duration::from_millis(120)).await;

    let Harness {
        events: _events,
        mut reports,
        handle,
    } = h;
    handle.stop().await;

    let report = reports.try_recv().expect("in-flight run reported before stop returned");
    assert!(report.is_success());
    assert_eq!(runner.count("compile_styles"), 1);
}

#[tokio::test]
async fn register_validates_task_and_globs() {
    let runner = Arc::new(FakeStageRunner::new());
    let mut scheduler = WatchScheduler::new(
        orchestrator(runner),
        PathResolver::new(Arc::new(RealFileSystem)),
        "/project",
        DEBOUNCE,
    );

    let err = scheduler
        .register("x", &["src/**".to_string()], "deploy", false)
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownTask(_)));

    let err = scheduler
        .register("x", &["src/[".to_string()], "styles", false)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));

    let err = scheduler.register("x", &[], "styles", false).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hashed_registration_skips_unchanged_content() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("./src/assets/img/logo.png", "v1");

    let runner = Arc::new(FakeStageRunner::new());
    let mut scheduler = WatchScheduler::new(
        orchestrator(Arc::clone(&runner)),
        PathResolver::new(Arc::new(fs.clone())),
        ".",
        DEBOUNCE,
    );
    scheduler
        .register("images", &["src/assets/img/**/*.*".to_string()], "styles", true)
        .unwrap();
    let mut h = spawn(scheduler);
    // Let the loop record the starting hash.
    tokio::time::sleep(Duration::from_millis(50)).await;

    h.touch("src/assets/img/logo.png").await;
    let unchanged = h.next_report(Duration::from_secs(2)).await.unwrap();
    assert!(matches!(unchanged.outcome, RunOutcome::Unchanged));
    assert_eq!(runner.count("compile_styles"), 0);

    fs.add_file("./src/assets/img/logo.png", "v2");
    h.touch("src/assets/img/logo.png").await;
    let ran = h.next_report(Duration::from_secs(2)).await.unwrap();
    assert!(matches!(ran.outcome, RunOutcome::Finished(_)));
    assert_eq!(runner.count("compile_styles"), 1);

    h.handle.stop().await;
}

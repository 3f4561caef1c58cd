// tests/cli_run.rs
#![cfg(unix)]

use std::path::Path;

use assetpipe::cli::CliArgs;
use assetpipe::errors::PipelineError;
use assetpipe::run;
use assetpipe_test_utils::tree::write_tree;
use clap::Parser;
use tempfile::tempdir;

const MANIFEST: &str = r#"
[tools]
styles = "cat {src}"
scripts = "cat {src}"
templates = "cat {src}"

[stage.copy_entry]
kind = "copy"
src = "src/app.html"
dest = "build/index.html"

[stage.compile_missing]
kind = "compile_styles"
src = "src/app.scss"
dest = "build/app.css"

[stage.fail]
kind = "compile_styles"
src = "src/broken.scss"
dest = "build/broken.css"

[task.default]
steps = []

[task.entry]
steps = ["copy_entry", "compile_missing"]

[task.broken]
steps = ["fail", "copy_entry"]
"#;

fn args(root: &Path, extra: &[&str]) -> CliArgs {
    let config = root.join("Assetpipe.toml");
    let mut argv = vec![
        "assetpipe".to_string(),
        "--config".to_string(),
        config.to_string_lossy().into_owned(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    CliArgs::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn runs_the_named_task_relative_to_the_manifest() {
    let dir = tempdir().unwrap();
    write_tree(
        dir.path(),
        &[("Assetpipe.toml", MANIFEST), ("src/app.html", "<html></html>")],
    );

    run(args(dir.path(), &["entry"])).await.unwrap();

    assert!(dir.path().join("build/index.html").is_file());
    // Missing optional sources are a no-op, not an error.
    assert!(!dir.path().join("build/app.css").exists());
}

#[tokio::test]
async fn no_task_runs_the_default() {
    let dir = tempdir().unwrap();
    write_tree(dir.path(), &[("Assetpipe.toml", MANIFEST)]);

    run(args(dir.path(), &[])).await.unwrap();
    assert!(!dir.path().join("build").exists());
}

#[tokio::test]
async fn no_task_without_default_is_a_no_op() {
    let dir = tempdir().unwrap();
    let manifest = r#"
[stage.copy_entry]
kind = "copy"
src = "src/app.html"
dest = "build/index.html"

[task.build]
steps = ["copy_entry"]
"#;
    write_tree(
        dir.path(),
        &[("Assetpipe.toml", manifest), ("src/app.html", "<html></html>")],
    );

    run(args(dir.path(), &[])).await.unwrap();
    assert!(!dir.path().join("build").exists());

    let err = run(args(dir.path(), &["default"])).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::UnknownTask(name)) if name == "default"
    ));
}

#[tokio::test]
async fn dry_run_executes_nothing() {
    let dir = tempdir().unwrap();
    write_tree(
        dir.path(),
        &[("Assetpipe.toml", MANIFEST), ("src/app.html", "<html></html>")],
    );

    run(args(dir.path(), &["entry", "--dry-run"])).await.unwrap();
    assert!(!dir.path().join("build").exists());
}

#[tokio::test]
async fn failing_task_names_task_and_stage() {
    let dir = tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("Assetpipe.toml", MANIFEST.replace("cat {src}\"\nscripts", "exit 2 # {src}\"\nscripts").as_str()),
            ("src/app.html", "<html></html>"),
            ("src/broken.scss", "a {"),
        ],
    );

    let err = run(args(dir.path(), &["broken"])).await.unwrap_err();
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::StageExecution { task, stage, .. }) => {
            assert_eq!(task, "broken");
            assert_eq!(stage, "fail");
        }
        other => panic!("expected StageExecution, got {other:?}"),
    }
    assert!(!dir.path().join("build/index.html").exists());
}

#[tokio::test]
async fn unknown_task_is_an_error() {
    let dir = tempdir().unwrap();
    write_tree(dir.path(), &[("Assetpipe.toml", MANIFEST)]);

    let err = run(args(dir.path(), &["deploy"])).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::UnknownTask(_))
    ));
}

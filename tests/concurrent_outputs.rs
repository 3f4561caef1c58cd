// tests/concurrent_outputs.rs
#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;

use assetpipe::config::builtin_config;
use assetpipe::fs::RealFileSystem;
use assetpipe::orchestrator::{BuildOrchestrator, OrchestratorOptions};
use assetpipe::paths::PathResolver;
use assetpipe::registry::TaskRegistry;
use assetpipe::stages::{CommandToolchain, ToolchainStageRunner};
use assetpipe_test_utils::builders::passthrough_tools;
use assetpipe_test_utils::tree::{list_tree, write_tree};
use assetpipe_test_utils::{init_tracing, with_timeout};
use tempfile::tempdir;

const ITERATIONS: usize = 20;

fn shipped_pipeline(root: &Path) -> BuildOrchestrator {
    let cfg = builtin_config().unwrap();
    let registry = Arc::new(TaskRegistry::from_config(&cfg).unwrap());
    let resolver = PathResolver::new(Arc::new(RealFileSystem));
    let toolchain = Arc::new(CommandToolchain::new(passthrough_tools(), root));
    let runner = Arc::new(ToolchainStageRunner::new(
        root,
        resolver,
        toolchain,
        cfg.config_section().banner.clone(),
    ));
    BuildOrchestrator::new(registry, runner, OrchestratorOptions::default())
}

/// Every file under `dir` with its bytes.
fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    list_tree(dir)
        .into_iter()
        .filter(|rel| dir.join(rel).is_file())
        .map(|rel| {
            let bytes = std::fs::read(dir.join(&rel)).unwrap();
            (rel, bytes)
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn styles_and_scripts_run_concurrently_without_corruption() {
    init_tracing();
    let dir = tempdir().unwrap();
    let root = dir.path();

    let scss: String = (0..200)
        .map(|i| format!(".rule-{i} {{ margin: {i}px; }}\n"))
        .collect();
    let classes: Vec<String> = (0..200).map(|i| format!("rule-{i}")).collect();
    let app_html = format!(r#"<body class="{}"></body>"#, classes.join(" "));
    write_tree(
        root,
        &[
            ("src/app.html", app_html.as_str()),
            ("src/assets/scss/app.scss", scss.as_str()),
            ("src/assets/libs/css/vendor.css", ".vendor { padding: 0; }\n"),
            ("src/assets/coffee/app.coffee", "var app = 1;\n"),
            ("src/assets/coffee/modules/nav.coffee", "var nav = 2;\n"),
            ("src/assets/coffee/modules/menu.coffee", "var menu = 3;\n"),
            ("src/assets/libs/js/jquery.js", "var $ = 0;\n"),
        ],
    );

    let orch = shipped_pipeline(root);
    with_timeout(orch.run("build")).await.unwrap().into_result().unwrap();

    // Reference outputs from one sequential pass.
    with_timeout(orch.run("styles")).await.unwrap().into_result().unwrap();
    with_timeout(orch.run("scripts")).await.unwrap().into_result().unwrap();
    let css_dir = root.join("build/assets/css");
    let js_dir = root.join("build/assets/js");
    let expected_css = snapshot(&css_dir);
    let expected_js = snapshot(&js_dir);
    assert_eq!(expected_css.len(), 1);
    assert_eq!(expected_js.len(), 1);

    for iteration in 0..ITERATIONS {
        let (styles, scripts) = with_timeout(async {
            tokio::join!(orch.run("styles"), orch.run("scripts"))
        })
        .await;
        styles.unwrap().into_result().unwrap();
        scripts.unwrap().into_result().unwrap();

        assert_eq!(snapshot(&css_dir), expected_css, "css differs in iteration {iteration}");
        assert_eq!(snapshot(&js_dir), expected_js, "js differs in iteration {iteration}");
    }
}

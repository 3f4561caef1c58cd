// tests/resolver_fs.rs

use std::path::PathBuf;
use std::sync::Arc;

use assetpipe::fs::RealFileSystem;
use assetpipe::paths::PathResolver;
use assetpipe_test_utils::tree::write_tree;
use tempfile::tempdir;

fn patterns(p: &[&str]) -> Vec<String> {
    p.iter().map(|s| s.to_string()).collect()
}

#[test]
fn expansion_is_deterministic_on_a_real_tree() {
    let dir = tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("build/assets/js/zepto.js", "z"),
            ("build/assets/js/app.coffee.js", "a"),
            ("build/assets/js/lib/jquery.js", "j"),
            ("build/assets/js/app.min.js", "m"),
        ],
    );
    let resolver = PathResolver::new(Arc::new(RealFileSystem));
    let globs = patterns(&["build/assets/js/**/*.js", "!build/assets/js/app.min.js"]);

    let first = resolver.expand_files(&globs, dir.path()).unwrap();
    let second = resolver.expand_files(&globs, dir.path()).unwrap();

    assert_eq!(first, second);
    let rel: Vec<PathBuf> = first
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        rel,
        vec![
            PathBuf::from("build/assets/js/app.coffee.js"),
            PathBuf::from("build/assets/js/lib/jquery.js"),
            PathBuf::from("build/assets/js/zepto.js"),
        ]
    );
}

#[test]
fn directories_are_returned_by_expand_only() {
    let dir = tempdir().unwrap();
    write_tree(dir.path(), &[("build/assets/img/icons/a.png", "x")]);
    let resolver = PathResolver::new(Arc::new(RealFileSystem));
    let globs = patterns(&["build/assets/img/*"]);

    let any = resolver.expand(&globs, dir.path()).unwrap();
    assert_eq!(any, vec![dir.path().join("build/assets/img/icons")]);

    let files = resolver.expand_files(&globs, dir.path()).unwrap();
    assert!(files.is_empty());
}

#[test]
fn no_match_is_empty_not_an_error() {
    let dir = tempdir().unwrap();
    let resolver = PathResolver::new(Arc::new(RealFileSystem));
    let got = resolver
        .expand(&patterns(&["src/assets/libs/css/**"]), dir.path())
        .unwrap();
    assert!(got.is_empty());
}

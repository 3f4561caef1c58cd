// src/paths/resolver.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use tracing::trace;

use crate::fs::FileSystem;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Which kinds of entries an expansion may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryFilter {
    Any,
    FilesOnly,
}

/// Expands glob patterns against a base directory.
///
/// Semantics:
/// - Patterns are applied in declared order.
/// - A positive pattern appends its matches, sorted lexicographically by
///   path relative to `base`, skipping paths already present.
/// - A `!pattern` removes every path accumulated so far that it matches; a
///   later positive pattern may add it back.
/// - `*` and `?` never cross a `/`; `**` does.
///
/// The resolver keeps no state, so an unchanged tree always yields the same
/// result.
#[derive(Debug, Clone)]
pub struct PathResolver {
    fs: Arc<dyn FileSystem>,
}

impl PathResolver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Expand to matching files and directories.
    pub fn expand(&self, patterns: &[String], base: &Path) -> Result<Vec<PathBuf>> {
        self.expand_filtered(patterns, base, EntryFilter::Any)
    }

    /// Expand to matching regular files only.
    pub fn expand_files(&self, patterns: &[String], base: &Path) -> Result<Vec<PathBuf>> {
        self.expand_filtered(patterns, base, EntryFilter::FilesOnly)
    }

    fn expand_filtered(
        &self,
        patterns: &[String],
        base: &Path,
        filter: EntryFilter,
    ) -> Result<Vec<PathBuf>> {
        let mut matched: Vec<(String, PathBuf)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for raw in patterns {
            if let Some(negated) = raw.strip_prefix('!') {
                let pattern = normalize_pattern(negated);
                let matcher = compile(pattern)?;
                matched.retain(|(rel, _)| {
                    let keep = !matcher.is_match(rel);
                    if !keep {
                        seen.remove(rel);
                    }
                    keep
                });
                continue;
            }

            let pattern = normalize_pattern(raw);
            let mut found = self.matches_for(pattern, base, filter)?;
            found.sort_by(|a, b| a.0.cmp(&b.0));

            for (rel, path) in found {
                if seen.insert(rel.clone()) {
                    matched.push((rel, path));
                }
            }
        }

        trace!(?patterns, base = ?base, count = matched.len(), "expanded globs");
        Ok(matched.into_iter().map(|(_, path)| path).collect())
    }

    fn matches_for(
        &self,
        pattern: &str,
        base: &Path,
        filter: EntryFilter,
    ) -> Result<Vec<(String, PathBuf)>> {
        let prefix = literal_prefix(pattern);

        // Fully literal pattern: a direct existence check.
        if prefix == pattern {
            let path = base.join(pattern);
            let wanted = match filter {
                EntryFilter::Any => self.fs.exists(&path),
                EntryFilter::FilesOnly => self.fs.is_file(&path),
            };
            return Ok(if wanted {
                vec![(pattern.to_string(), path)]
            } else {
                Vec::new()
            });
        }

        let matcher = compile(pattern)?;
        let start = if prefix.is_empty() {
            base.to_path_buf()
        } else {
            base.join(&prefix)
        };
        if !self.fs.is_dir(&start) {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        let mut stack = vec![start];

        while let Some(dir) = stack.pop() {
            for path in self.fs.read_dir(&dir)? {
                let Some(rel) = relative_str(base, &path) else {
                    continue;
                };
                if self.fs.is_dir(&path) {
                    if filter == EntryFilter::Any && matcher.is_match(&rel) {
                        found.push((rel, path.clone()));
                    }
                    stack.push(path);
                } else if self.fs.is_file(&path) && matcher.is_match(&rel) {
                    found.push((rel, path));
                }
            }
        }

        Ok(found)
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

fn normalize_pattern(pattern: &str) -> &str {
    let trimmed = pattern.trim_start_matches("./");
    trimmed.trim_end_matches('/')
}

/// Leading path components of `pattern` that contain no glob syntax.
fn literal_prefix(pattern: &str) -> String {
    let mut parts = Vec::new();
    for component in pattern.split('/') {
        if component.contains(GLOB_META) {
            break;
        }
        parts.push(component);
    }
    parts.join("/")
}

/// `path` relative to `base`, with forward slashes.
///
/// Returns `None` if `path` is not under `base`.
pub fn relative_str(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

// src/watch/matcher.rs

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

use crate::errors::{PipelineError, Result};

/// Ordered glob list with `!` exclusions, evaluated against one relative path.
///
/// The last pattern that matches decides: a positive pattern includes the
/// path, a `!pattern` excludes it. This agrees with what
/// [`PathResolver`](crate::paths::PathResolver) would return for the same
/// list.
#[derive(Clone)]
pub struct PatternMatcher {
    patterns: Vec<String>,
    rules: Vec<(bool, GlobMatcher)>,
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl PatternMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut rules = Vec::with_capacity(patterns.len());
        for raw in patterns {
            let (include, pattern) = match raw.strip_prefix('!') {
                Some(rest) => (false, rest),
                None => (true, raw.as_str()),
            };
            let pattern = pattern.trim_start_matches("./");
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| PipelineError::Config(format!("invalid glob '{raw}': {e}")))?;
            rules.push((include, glob.compile_matcher()));
        }
        Ok(Self {
            patterns: patterns.to_vec(),
            rules,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        let mut included = false;
        for (include, matcher) in &self.rules {
            if matcher.is_match(rel_path) {
                included = *include;
            }
        }
        included
    }
}

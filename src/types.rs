// src/types.rs

//! Small shared vocabulary types.

use std::fmt;

use serde::Deserialize;

/// Canonical task name type.
pub type TaskName = String;

/// CLI task name that starts watch mode instead of a single run.
pub const WATCH_TASK: &str = "watchFiles";

/// Asset category handled by the compile/minify collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Css,
    Js,
    Html,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetKind::Css => "css",
            AssetKind::Js => "js",
            AssetKind::Html => "html",
        };
        f.write_str(s)
    }
}

/// Source dialect handed to an external compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceDialect {
    /// Stylesheets (e.g. SCSS) compiled to CSS.
    Styles,
    /// Scripts (e.g. CoffeeScript) compiled to JavaScript.
    Scripts,
    /// Templates (e.g. Jade/Pug) compiled to HTML.
    Templates,
}

impl fmt::Display for SourceDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceDialect::Styles => "styles",
            SourceDialect::Scripts => "scripts",
            SourceDialect::Templates => "templates",
        };
        f.write_str(s)
    }
}

/// Why a watch run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Triggered by a debounced filesystem change.
    FileWatch,
    /// Follow-up run for changes that arrived while a run was in flight.
    Coalesced,
}

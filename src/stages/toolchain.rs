// src/stages/toolchain.rs

//! External collaborators behind a narrow trait.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use image::ImageFormat;
use lightningcss::targets::Targets;
use tracing::debug;

use crate::config::ToolsSection;
use crate::stages::{banner, command, css, html, images};
use crate::types::{AssetKind, SourceDialect};

/// The compile/minify/optimise operations stages delegate to.
///
/// Every method is a pure transformation of its inputs; reading sources and
/// writing outputs is the stage runner's job.
pub trait Toolchain: Send + Sync {
    /// Compile one source file and return the generated text.
    fn compile(&self, dialect: SourceDialect, src: &Path) -> Result<String>;

    fn minify(&self, kind: AssetKind, input: &str) -> Result<String>;

    fn prefix_css(&self, css: &str) -> Result<String>;

    fn purge_unused_css(&self, css: &str, html_sources: &[String]) -> Result<String>;

    fn optimize_image(&self, bytes: &[u8], format: ImageFormat, level: u8) -> Result<Vec<u8>>;

    fn apply_banner(&self, content: &str, banner: &str) -> String {
        banner::apply(content, banner)
    }
}

/// Shipped toolchain: shell commands for compilers, `lightningcss` for CSS,
/// `image` for images.
pub struct CommandToolchain {
    tools: ToolsSection,
    root: PathBuf,
    targets: Targets,
}

impl fmt::Debug for CommandToolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandToolchain")
            .field("tools", &self.tools)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl CommandToolchain {
    /// Tools run with `root` as their working directory.
    pub fn new(tools: ToolsSection, root: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            root: root.into(),
            targets: css::default_targets(),
        }
    }

    fn template_for(&self, dialect: SourceDialect) -> &str {
        match dialect {
            SourceDialect::Styles => &self.tools.styles,
            SourceDialect::Scripts => &self.tools.scripts,
            SourceDialect::Templates => &self.tools.templates,
        }
    }
}

impl Toolchain for CommandToolchain {
    fn compile(&self, dialect: SourceDialect, src: &Path) -> Result<String> {
        command::run_tool(self.template_for(dialect), Some(src), None, &self.root)
    }

    fn minify(&self, kind: AssetKind, input: &str) -> Result<String> {
        match kind {
            AssetKind::Css => css::minify(input, self.targets.clone()),
            AssetKind::Html => Ok(html::minify(input)),
            AssetKind::Js => {
                let cmd = self.tools.minify_js.trim();
                if cmd.is_empty() {
                    debug!("[tools].minify_js is empty; scripts are only concatenated");
                    return Ok(input.to_string());
                }
                command::run_tool(cmd, None, Some(input), &self.root)
            }
        }
    }

    fn prefix_css(&self, input: &str) -> Result<String> {
        css::prefix(input, self.targets.clone())
    }

    fn purge_unused_css(&self, input: &str, html_sources: &[String]) -> Result<String> {
        css::purge_unused(input, html_sources, self.targets.clone())
    }

    fn optimize_image(&self, bytes: &[u8], format: ImageFormat, level: u8) -> Result<Vec<u8>> {
        images::optimize(bytes, format, level)
    }
}

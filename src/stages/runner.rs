// src/stages/runner.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use image::ImageFormat;
use tracing::{debug, trace};

use crate::fs::FileSystem;
use crate::paths::{plan_file_set, FileMapping, PathResolver};
use crate::registry::StageInvocation;
use crate::stages::spec::{FileSet, ImageSet, StageSpec};
use crate::stages::toolchain::Toolchain;
use crate::stages::{banner, StageOutput, StageRunner};
use crate::types::{AssetKind, SourceDialect};

/// Production stage runner: resolves paths under `root` and delegates
/// content transformations to a [`Toolchain`].
pub struct ToolchainStageRunner {
    root: PathBuf,
    resolver: PathResolver,
    toolchain: Arc<dyn Toolchain>,
    banner: String,
}

impl std::fmt::Debug for ToolchainStageRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolchainStageRunner")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ToolchainStageRunner {
    /// `banner` is the default template for `banner` stages without text.
    pub fn new(
        root: impl Into<PathBuf>,
        resolver: PathResolver,
        toolchain: Arc<dyn Toolchain>,
        banner: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            resolver,
            toolchain,
            banner: banner.into(),
        }
    }

    fn fs(&self) -> &dyn FileSystem {
        self.resolver.fs().as_ref()
    }

    fn plan(&self, set: &FileSet) -> Result<Vec<FileMapping>> {
        plan_file_set(&self.resolver, set, &self.root)
    }

    /// Read and join the sources of a mapping, in order.
    fn read_joined(&self, sources: &[PathBuf]) -> Result<String> {
        let mut parts = Vec::with_capacity(sources.len());
        for src in sources {
            parts.push(self.fs().read_to_string(src)?);
        }
        Ok(parts.join("\n"))
    }

    fn clean(&self, patterns: &[String]) -> Result<StageOutput> {
        let mut output = StageOutput::default();
        for path in self.resolver.expand(patterns, &self.root)? {
            // An earlier match may have been a parent directory.
            if !self.fs().exists(&path) {
                continue;
            }
            if self.fs().is_dir(&path) {
                self.fs().remove_dir_all(&path)?;
            } else {
                self.fs().remove_file(&path)?;
            }
            trace!(path = ?path, "removed");
            output.removed.push(path);
        }
        Ok(output)
    }

    fn mkdir(&self, dirs: &[String]) -> Result<StageOutput> {
        let mut output = StageOutput::default();
        for dir in dirs {
            let path = self.root.join(dir);
            self.fs().create_dir_all(&path)?;
            output.written.push(path);
        }
        Ok(output)
    }

    fn copy(&self, set: &FileSet) -> Result<StageOutput> {
        let mut output = StageOutput::default();
        for mapping in self.plan(set)? {
            if let [single] = mapping.sources.as_slice() {
                self.fs().copy(single, &mapping.dest)?;
            } else {
                let joined = self.read_joined(&mapping.sources)?;
                self.fs().write(&mapping.dest, joined.as_bytes())?;
            }
            output.written.push(mapping.dest);
        }
        Ok(output)
    }

    fn compile(&self, dialect: SourceDialect, set: &FileSet) -> Result<StageOutput> {
        let mut output = StageOutput::default();
        for mapping in self.plan(set)? {
            let mut compiled = Vec::with_capacity(mapping.sources.len());
            for src in mapping.sources.iter() {
                let text = self
                    .toolchain
                    .compile(dialect, src)
                    .with_context(|| format!("compiling {dialect} source {:?}", src))?;
                compiled.push(text);
            }
            self.fs().write(&mapping.dest, compiled.join("\n").as_bytes())?;
            output.written.push(mapping.dest);
        }
        Ok(output)
    }

    /// Join each mapping's sources, run them through `f`, write the result.
    fn transform_text<F>(&self, set: &FileSet, f: F) -> Result<StageOutput>
    where
        F: Fn(&str) -> Result<String>,
    {
        let mut output = StageOutput::default();
        for mapping in self.plan(set)? {
            let input = self.read_joined(&mapping.sources)?;
            let result = f(&input).with_context(|| format!("producing {:?}", mapping.dest))?;
            self.fs().write(&mapping.dest, result.as_bytes())?;
            output.written.push(mapping.dest);
        }
        Ok(output)
    }

    fn purge_css(&self, css: &[String], html: &[String], dest: &str) -> Result<StageOutput> {
        let css_files = self.resolver.expand_files(css, &self.root)?;
        if css_files.is_empty() {
            debug!("no stylesheets to purge");
            return Ok(StageOutput::default());
        }
        let stylesheet = self.read_joined(&css_files)?;

        let mut documents = Vec::new();
        for path in self.resolver.expand_files(html, &self.root)? {
            documents.push(self.fs().read_to_string(&path)?);
        }

        let purged = self.toolchain.purge_unused_css(&stylesheet, &documents)?;
        let dest = self.root.join(dest);
        self.fs().write(&dest, purged.as_bytes())?;
        Ok(StageOutput {
            written: vec![dest],
            removed: Vec::new(),
        })
    }

    fn optimize_images(&self, set: &ImageSet) -> Result<StageOutput> {
        let mut output = StageOutput::default();
        for mapping in self.plan(&set.file_set())? {
            for src in mapping.sources.iter() {
                let bytes = self.fs().read(src)?;
                let optimised = match ImageFormat::from_path(src) {
                    Ok(format) => self
                        .toolchain
                        .optimize_image(&bytes, format, set.level)
                        .with_context(|| format!("optimising image {:?}", src))?,
                    Err(_) => bytes,
                };
                self.fs().write(&mapping.dest, &optimised)?;
            }
            output.written.push(mapping.dest);
        }
        Ok(output)
    }

    fn banner(&self, patterns: &[String], text: Option<&str>) -> Result<StageOutput> {
        let rendered = banner::render(text.unwrap_or(self.banner.as_str()));
        let mut output = StageOutput::default();
        for path in self.resolver.expand_files(patterns, &self.root)? {
            let content = self.fs().read_to_string(&path)?;
            let stamped = self.toolchain.apply_banner(&content, &rendered);
            self.fs().write(&path, stamped.as_bytes())?;
            output.written.push(path);
        }
        Ok(output)
    }
}

impl StageRunner for ToolchainStageRunner {
    fn run_stage(&self, invocation: &StageInvocation) -> Result<StageOutput> {
        debug!(
            stage = %invocation.name,
            kind = invocation.spec.kind(),
            root = ?self.root,
            "executing stage"
        );

        let tc = &self.toolchain;
        match &invocation.spec {
            StageSpec::Clean { src } => self.clean(src),
            StageSpec::Mkdir { create } => self.mkdir(create),
            StageSpec::Copy(set) => self.copy(set),
            StageSpec::CompileStyles(set) => self.compile(SourceDialect::Styles, set),
            StageSpec::CompileScripts(set) => self.compile(SourceDialect::Scripts, set),
            StageSpec::CompileTemplates(set) => self.compile(SourceDialect::Templates, set),
            StageSpec::Autoprefix(set) => self.transform_text(set, |css| tc.prefix_css(css)),
            StageSpec::MinifyCss(set) => self.transform_text(set, |s| tc.minify(AssetKind::Css, s)),
            StageSpec::MinifyJs(set) => self.transform_text(set, |s| tc.minify(AssetKind::Js, s)),
            StageSpec::MinifyHtml(set) => self.transform_text(set, |s| tc.minify(AssetKind::Html, s)),
            StageSpec::PurgeCss { css, html, dest } => self.purge_css(css, html, dest),
            StageSpec::OptimizeImages(set) => self.optimize_images(set),
            StageSpec::Banner { src, text } => self.banner(src, text.as_deref()),
        }
    }
}

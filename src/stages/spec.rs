// src/stages/spec.rs

//! Declarative description of a single pipeline stage.

use serde::{Deserialize, Deserializer};

/// What a stage does, as declared in `[stage.<name>]`.
///
/// The `kind` key selects the variant:
///
/// ```toml
/// [stage.minify_css]
/// kind = "minify_css"
/// src = ["build/assets/css/*.css", "!build/assets/css/app.css", "build/assets/css/app.css"]
/// dest = "build/assets/css/app.min.css"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageSpec {
    /// Delete every file or directory matched by `src`.
    Clean {
        #[serde(deserialize_with = "one_or_many")]
        src: Vec<String>,
    },
    /// Create the listed directories.
    Mkdir { create: Vec<String> },
    Copy(FileSet),
    CompileStyles(FileSet),
    CompileScripts(FileSet),
    CompileTemplates(FileSet),
    Autoprefix(FileSet),
    MinifyCss(FileSet),
    MinifyJs(FileSet),
    MinifyHtml(FileSet),
    /// Drop CSS rules whose class/id selectors appear in none of the `html`
    /// documents, writing the result to `dest`.
    PurgeCss {
        #[serde(deserialize_with = "one_or_many")]
        css: Vec<String>,
        #[serde(deserialize_with = "one_or_many")]
        html: Vec<String>,
        dest: String,
    },
    OptimizeImages(ImageSet),
    /// Prepend a banner to every existing file matched by `src`.
    Banner {
        #[serde(deserialize_with = "one_or_many")]
        src: Vec<String>,
        #[serde(default)]
        text: Option<String>,
    },
}

impl StageSpec {
    /// Stable identifier of the variant, matching the manifest's `kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            StageSpec::Clean { .. } => "clean",
            StageSpec::Mkdir { .. } => "mkdir",
            StageSpec::Copy(_) => "copy",
            StageSpec::CompileStyles(_) => "compile_styles",
            StageSpec::CompileScripts(_) => "compile_scripts",
            StageSpec::CompileTemplates(_) => "compile_templates",
            StageSpec::Autoprefix(_) => "autoprefix",
            StageSpec::MinifyCss(_) => "minify_css",
            StageSpec::MinifyJs(_) => "minify_js",
            StageSpec::MinifyHtml(_) => "minify_html",
            StageSpec::PurgeCss { .. } => "purge_css",
            StageSpec::OptimizeImages(_) => "optimize_images",
            StageSpec::Banner { .. } => "banner",
        }
    }
}

/// Source files plus where their output goes.
///
/// - With `cwd`, each file matched by `src` (relative to `cwd`) maps to its
///   own destination under the `dest` directory, keeping its relative path
///   unless `flatten` is set. `ext` replaces everything from the first dot of
///   the file name.
/// - Without `cwd`, all matches (relative to the project root) are combined,
///   in match order, into the single file `dest`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileSet {
    #[serde(default)]
    pub cwd: Option<String>,

    #[serde(default = "default_src", deserialize_with = "one_or_many")]
    pub src: Vec<String>,

    pub dest: String,

    #[serde(default)]
    pub flatten: bool,

    #[serde(default)]
    pub ext: Option<String>,
}

impl FileSet {
    /// Single-file mapping (no `cwd`).
    pub fn combine(src: impl IntoIterator<Item = impl Into<String>>, dest: impl Into<String>) -> Self {
        Self {
            cwd: None,
            src: src.into_iter().map(Into::into).collect(),
            dest: dest.into(),
            flatten: false,
            ext: None,
        }
    }

    /// Per-file mapping from `cwd` into the `dest` directory.
    pub fn expand(cwd: impl Into<String>, src: impl IntoIterator<Item = impl Into<String>>, dest: impl Into<String>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            src: src.into_iter().map(Into::into).collect(),
            dest: dest.into(),
            flatten: false,
            ext: None,
        }
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn flattened(mut self) -> Self {
        self.flatten = true;
        self
    }
}

/// Image set with an optimisation level (0 = fastest, 7 = smallest).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageSet {
    pub cwd: String,

    #[serde(default = "default_src", deserialize_with = "one_or_many")]
    pub src: Vec<String>,

    pub dest: String,

    #[serde(default = "default_optimization_level")]
    pub level: u8,
}

impl ImageSet {
    pub fn file_set(&self) -> FileSet {
        FileSet::expand(self.cwd.clone(), self.src.clone(), self.dest.clone())
    }
}

fn default_src() -> Vec<String> {
    vec!["**".to_string()]
}

fn default_optimization_level() -> u8 {
    3
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept either `src = "a"` or `src = ["a", "b"]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

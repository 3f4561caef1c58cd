// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::stages::StageSpec;

/// Manifest as read from TOML, before validation.
///
/// ```toml
/// [config]
/// debounce_ms = 200
/// banner = "/* @created_at {date} */"
///
/// [tools]
/// styles = "sass --no-source-map {src}"
///
/// [stage.clean_css_file]
/// kind = "clean"
/// src = ["build/assets/css/app.min.css"]
///
/// [task.styles]
/// steps = ["clean_css_file", "compile_styles"]
///
/// [watch.styles]
/// files = ["src/assets/scss/**/*.scss"]
/// task = "styles"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub tools: ToolsSection,

    /// All stages from `[stage.<name>]`.
    #[serde(default)]
    pub stage: BTreeMap<String, StageSpec>,

    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All watch registrations from `[watch.<name>]`.
    #[serde(default)]
    pub watch: BTreeMap<String, WatchConfig>,
}

/// A validated manifest.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means the
/// step references resolve and the task graph is acyclic. It is immutable and
/// handed by reference to the registry, resolver and watch scheduler.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    tools: ToolsSection,
    stage: BTreeMap<String, StageSpec>,
    task: BTreeMap<String, TaskConfig>,
    watch: BTreeMap<String, WatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            tools: raw.tools,
            stage: raw.stage,
            task: raw.task,
            watch: raw.watch,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn tools(&self) -> &ToolsSection {
        &self.tools
    }

    pub fn stages(&self) -> &BTreeMap<String, StageSpec> {
        &self.stage
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn watches(&self) -> &BTreeMap<String, WatchConfig> {
        &self.watch
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Quiet period after the last change before a watch run starts.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Optional upper bound for a single stage. Unset means stages may run
    /// for as long as they need.
    #[serde(default)]
    pub stage_timeout_secs: Option<u64>,

    /// Banner template used by `banner` stages without their own text.
    /// `{date}` is replaced with the build date (`dd-mm-yyyy`).
    #[serde(default = "default_banner")]
    pub banner: String,

    /// Task run when the CLI is invoked without a task name.
    #[serde(default = "default_task_name")]
    pub default_task: String,
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_banner() -> String {
    "/* @created_at {date} */".to_string()
}

fn default_task_name() -> String {
    "default".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            stage_timeout_secs: None,
            banner: default_banner(),
            default_task: default_task_name(),
        }
    }
}

impl ConfigSection {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}

/// `[tools]` section: shell command templates for the external compilers.
///
/// `{src}` is replaced with the (quoted) source path and the compiled output
/// is read from the command's stdout. `minify_js` reads the concatenated
/// script from stdin; an empty `minify_js` leaves scripts concatenated only.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    #[serde(default = "default_styles_tool")]
    pub styles: String,

    #[serde(default = "default_scripts_tool")]
    pub scripts: String,

    #[serde(default = "default_templates_tool")]
    pub templates: String,

    #[serde(default = "default_minify_js_tool")]
    pub minify_js: String,
}

fn default_styles_tool() -> String {
    "sass --no-source-map {src}".to_string()
}

fn default_scripts_tool() -> String {
    "coffee --print {src}".to_string()
}

fn default_templates_tool() -> String {
    "pug < {src}".to_string()
}

/// Compress without mangling names.
fn default_minify_js_tool() -> String {
    "uglifyjs --compress".to_string()
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            styles: default_styles_tool(),
            scripts: default_scripts_tool(),
            templates: default_templates_tool(),
            minify_js: default_minify_js_tool(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Ordered step names. Each one names a `[stage.*]` or another `[task.*]`.
    #[serde(default)]
    pub steps: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// `[watch.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Glob patterns relative to the project root.
    pub files: Vec<String>,

    /// Task run when a matching file changes.
    pub task: String,

    /// Only run when the content of the watched files actually changed.
    #[serde(default)]
    pub use_hash: bool,
}

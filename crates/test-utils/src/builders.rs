#![allow(dead_code)]

use std::collections::BTreeMap;

use assetpipe::config::{
    ConfigFile, ConfigSection, RawConfigFile, TaskConfig, ToolsSection, WatchConfig,
};
use assetpipe::errors::PipelineError;
use assetpipe::stages::StageSpec;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                tools: ToolsSection::default(),
                stage: BTreeMap::new(),
                task: BTreeMap::new(),
                watch: BTreeMap::new(),
            },
        }
    }

    pub fn with_stage(mut self, name: &str, spec: StageSpec) -> Self {
        self.config.stage.insert(name.to_string(), spec);
        self
    }

    /// A `mkdir` stage with no directories; handy when only ordering matters.
    pub fn with_noop_stage(self, name: &str) -> Self {
        self.with_stage(name, StageSpec::Mkdir { create: vec![] })
    }

    pub fn with_task(mut self, name: &str, steps: &[&str]) -> Self {
        self.config.task.insert(
            name.to_string(),
            TaskConfig {
                steps: steps.iter().map(|s| s.to_string()).collect(),
                description: None,
            },
        );
        self
    }

    pub fn with_watch(mut self, name: &str, files: &[&str], task: &str) -> Self {
        self.config.watch.insert(
            name.to_string(),
            WatchConfig {
                files: files.iter().map(|s| s.to_string()).collect(),
                task: task.to_string(),
                use_hash: false,
            },
        );
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn with_tools(mut self, tools: ToolsSection) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn try_build(self) -> Result<ConfigFile, PipelineError> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tools that pass sources through unchanged, so real-tree tests do not need
/// sass, coffee or pug installed.
pub fn passthrough_tools() -> ToolsSection {
    ToolsSection {
        styles: "cat {src}".to_string(),
        scripts: "cat {src}".to_string(),
        templates: "cat {src}".to_string(),
        minify_js: String::new(),
    }
}

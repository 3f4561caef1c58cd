// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};
use crate::types::WATCH_TASK;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_names_disjoint(cfg)?;
    validate_step_references(cfg)?;
    validate_task_graph(cfg)?;
    validate_watches(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.debounce_ms == 0 {
        return Err(PipelineError::Config(
            "[config].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.stage_timeout_secs == Some(0) {
        return Err(PipelineError::Config(
            "[config].stage_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    let tools = [
        ("styles", &cfg.tools.styles),
        ("scripts", &cfg.tools.scripts),
        ("templates", &cfg.tools.templates),
    ];
    for (name, cmd) in tools {
        if !cmd.contains("{src}") {
            return Err(PipelineError::Config(format!(
                "[tools].{name} must reference the source file as {{src}} (got '{cmd}')"
            )));
        }
    }
    Ok(())
}

/// A step name must resolve unambiguously, so stages and tasks live in
/// separate namespaces that may not overlap.
fn validate_names_disjoint(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.contains_key(WATCH_TASK) || cfg.stage.contains_key(WATCH_TASK) {
        return Err(PipelineError::Config(format!(
            "'{WATCH_TASK}' is reserved for watch mode"
        )));
    }
    for name in cfg.task.keys() {
        if cfg.stage.contains_key(name) {
            return Err(PipelineError::Config(format!(
                "'{name}' is declared both as a stage and as a task"
            )));
        }
    }
    Ok(())
}

fn validate_step_references(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for step in task.steps.iter() {
            if step == name {
                return Err(PipelineError::CyclicTask {
                    chain: vec![name.clone(), name.clone()],
                });
            }
            if !cfg.stage.contains_key(step) && !cfg.task.contains_key(step) {
                return Err(PipelineError::UnknownTask(format!(
                    "{step} (referenced by task '{name}')"
                )));
            }
        }
    }
    Ok(())
}

fn validate_task_graph(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: referenced task -> referencing task. Stages are leaves
    // and cannot take part in a cycle, so only task references become edges.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for step in task.steps.iter() {
            if cfg.task.contains_key(step) {
                graph.add_edge(step.as_str(), name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            let chain = cycle_chain(cfg, node).unwrap_or_else(|| vec![node.to_string()]);
            Err(PipelineError::CyclicTask { chain })
        }
    }
}

/// Follow task references from `start` until a name repeats, returning the
/// closed loop, e.g. `["A", "B", "A"]`.
fn cycle_chain(cfg: &RawConfigFile, start: &str) -> Option<Vec<String>> {
    fn walk<'a>(cfg: &'a RawConfigFile, name: &'a str, path: &mut Vec<&'a str>) -> Option<Vec<String>> {
        if let Some(pos) = path.iter().position(|n| *n == name) {
            let mut chain: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
            chain.push(name.to_string());
            return Some(chain);
        }
        path.push(name);
        let task = cfg.task.get(name)?;
        for step in task.steps.iter() {
            if cfg.task.contains_key(step) {
                if let Some(chain) = walk(cfg, step.as_str(), path) {
                    return Some(chain);
                }
            }
        }
        path.pop();
        None
    }

    walk(cfg, start, &mut Vec::new())
}

fn validate_watches(cfg: &RawConfigFile) -> Result<()> {
    for (name, watch) in cfg.watch.iter() {
        if watch.files.is_empty() {
            return Err(PipelineError::Config(format!(
                "watch '{name}' must list at least one file pattern"
            )));
        }
        // A watch entry names exactly one task; a comma in the name means
        // several tasks were squashed into one string by mistake.
        if watch.task.contains(',') {
            return Err(PipelineError::Config(format!(
                "watch '{name}' targets '{}'; declare a task that sequences these steps instead",
                watch.task
            )));
        }
        if !cfg.task.contains_key(&watch.task) {
            return Err(PipelineError::UnknownTask(format!(
                "{} (targeted by watch '{name}')",
                watch.task
            )));
        }
    }
    Ok(())
}

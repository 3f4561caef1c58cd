// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Registration-time problems (`UnknownTask`, `CyclicTask`, `DuplicateTask`)
//! and configuration problems are structured variants so callers and tests can
//! match on them. Stage internals use `anyhow` and only surface here as
//! `StageExecution` once a run has failed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Cyclic task reference: {}", .chain.join(" -> "))]
    CyclicTask { chain: Vec<String> },

    #[error("Duplicate task: {0}")]
    DuplicateTask(String),

    #[error("task '{task}' failed at stage '{stage}': {message}")]
    StageExecution {
        task: String,
        stage: String,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;

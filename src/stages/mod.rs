// src/stages/mod.rs

//! Pipeline stages.
//!
//! - [`spec`] is the declarative description of each stage kind.
//! - [`runner`] provides the `StageRunner` used by the orchestrator in
//!   production, which executes a spec against the project tree.
//! - [`toolchain`] is the seam to the external collaborators (compilers,
//!   minifiers, optimisers); [`command`], [`css`], [`html`], [`images`] and
//!   [`banner`] implement the shipped ones.

pub mod banner;
pub mod command;
pub mod css;
pub mod html;
pub mod images;
pub mod runner;
pub mod spec;
pub mod toolchain;

use std::path::PathBuf;

use crate::registry::StageInvocation;

pub use runner::ToolchainStageRunner;
pub use spec::{FileSet, ImageSet, StageSpec};
pub use toolchain::{CommandToolchain, Toolchain};

/// Files touched by a successful stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutput {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

/// Executes one stage.
///
/// Implementations are synchronous; the orchestrator moves each call onto
/// the blocking thread pool. Tests substitute their own runner to observe
/// ordering and inject failures.
pub trait StageRunner: Send + Sync {
    fn run_stage(&self, invocation: &StageInvocation) -> anyhow::Result<StageOutput>;
}

// src/paths/mod.rs

//! Glob expansion and source → destination path mapping.
//!
//! - [`resolver`] expands ordered glob lists (with `!` exclusions) into a
//!   deterministic list of paths.
//! - [`mapping`] turns a [`FileSet`](crate::stages::FileSet) into concrete
//!   source/destination pairs.

pub mod mapping;
pub mod resolver;

pub use mapping::{plan_file_set, FileMapping};
pub use resolver::{relative_str, PathResolver};

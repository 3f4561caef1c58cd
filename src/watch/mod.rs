// src/watch/mod.rs

//! Watch mode: turning file changes into debounced task runs.
//!
//! - [`watcher`] bridges `notify` into a channel of changed paths.
//! - [`scheduler`] routes those paths to registrations and runs the
//!   per-registration debounce state machine.
//! - [`hash`] supports skipping runs when watched content is unchanged.

pub mod hash;
pub mod matcher;
pub mod scheduler;
pub mod watcher;

pub use hash::compute_hash_for_paths;
pub use matcher::PatternMatcher;
pub use scheduler::{RunOutcome, RunReport, WatchHandle, WatchRegistration, WatchScheduler};
pub use watcher::{spawn_fs_watcher, WatcherHandle};

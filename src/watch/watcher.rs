// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

/// Capacity of the changed-path channel handed to the scheduler.
const EVENT_BUFFER: usize = 1024;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching and closes the event channel.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and forward every changed path.
///
/// Paths arrive absolute; pass the same (canonical) root to the scheduler so
/// they can be made relative. Pure access events are dropped.
pub fn spawn_fs_watcher(
    root: impl Into<PathBuf>,
) -> Result<(WatcherHandle, mpsc::Receiver<PathBuf>)> {
    let root = root.into();
    let (tx, rx) = mpsc::channel::<PathBuf>(EVENT_BUFFER);

    // notify calls this from its own thread, outside the runtime, so a
    // blocking send is fine here.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                trace!(?event, "notify event");
                for path in event.paths {
                    if tx.blocking_send(path).is_err() {
                        return;
                    }
                }
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {root:?}"))?;

    info!(root = ?root, "file watcher started");
    Ok((WatcherHandle { _inner: watcher }, rx))
}

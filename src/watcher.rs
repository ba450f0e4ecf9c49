//! Live filesystem notifications for the inbox.
//!
//! Notifications are only a hint: they can be dropped, duplicated or
//! arrive for files still being written. Every candidate still goes
//! through the stability check, and the periodic sweep catches anything
//! missed here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Watch `root` recursively. Candidate paths are sent on `tx` until the
/// returned watcher is dropped.
pub fn watch_inbox(root: &Path, tx: mpsc::UnboundedSender<PathBuf>) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| match res {
            Ok(event) => {
                for path in candidate_paths(event) {
                    if tx.send(path).is_err() {
                        debug!("inbox event receiver closed");
                        return;
                    }
                }
            }
            Err(e) => error!(error = %e, "inbox watch error"),
        },
        Config::default(),
    )
    .context("Failed to create inbox watcher")?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch inbox: {}", root.display()))?;
    info!(path = %root.display(), "watching inbox");

    Ok(watcher)
}

/// Paths worth a stability check. Removals and reads never are; for a
/// rename only the new name is.
pub fn candidate_paths(event: Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) => event.paths,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.into_iter().skip(1).collect()
        }
        EventKind::Modify(_) => event.paths,
        _ => Vec::new(),
    }
}

//! Inbox scanning and the deny list.
//!
//! Sync tools and phones drop housekeeping files next to real media.
//! Anything hidden, any sync-tool metadata and anything that looks like
//! an in-progress download is never ingested. Unknown extensions pass.

use anyhow::{bail, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File-name patterns that are never ingested, in addition to hidden names.
const BUILTIN_DENY: &[&str] = &[
    "syncthing-folder-*.txt",
    "~*",
    "*.tmp",
    "*.part",
    "*.partial",
    "*.crdownload",
    "thumbs.db",
    "desktop.ini",
];

pub struct InboxFilter {
    root: PathBuf,
    builtin: GlobSet,
    excludes: GlobSet,
}

impl InboxFilter {
    pub fn new(root: &Path, exclude_globs: &[String]) -> Result<Self> {
        let builtin: Vec<String> = BUILTIN_DENY.iter().map(|s| s.to_string()).collect();
        Ok(Self {
            root: root.to_path_buf(),
            builtin: build_globset(&builtin)?,
            excludes: build_globset(exclude_globs)?,
        })
    }

    pub fn should_process(&self, path: &Path) -> bool {
        // Names need not be UTF-8; the deny list matches raw bytes
        let name = match path.file_name() {
            Some(name) => Path::new(name),
            None => return false,
        };

        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        // Hidden file, or anything inside a hidden directory (.stversions, .thumbnails/)
        if relative.components().any(|c| match c {
            Component::Normal(part) => part.to_string_lossy().starts_with('.'),
            _ => false,
        }) {
            return false;
        }

        if self.builtin.is_match(name) {
            return false;
        }

        !self.excludes.is_match(relative)
    }
}

/// Walk the inbox and return every candidate file, sorted.
pub fn scan_inbox(root: &Path, filter: &InboxFilter, follow_symlinks: bool) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Inbox root does not exist: {}", root.display());
    }

    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Files vanish between readdir and stat all the time in an inbox
            Err(e) => {
                debug!(error = %e, "skipping unreadable inbox entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !filter.should_process(path) {
            debug!(path = %path.display(), "skipping file (deny list)");
            continue;
        }
        files.push(path.to_path_buf());
    }

    // Sort for deterministic ordering
    files.sort();

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}

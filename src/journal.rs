//! Pending catalog writes.
//!
//! A record is written before a file is moved into the archive and removed
//! once the catalog has accepted the entry. Whatever is left in the
//! journal is a move whose catalog write has not been confirmed yet, and
//! [`replay`] settles it.
//!
//! One JSON file per content hash: `{pending_dir}/{hash}.json`. A process
//! that writes or settles records holds `{pending_dir}/.lock` first.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fs2::FileExt;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::error::{IngestError, Stage};
use crate::hashing;
use crate::models::{InsertOutcome, NewCatalogEntry};

pub struct PendingJournal {
    dir: PathBuf,
}

/// Exclusive hold on a journal directory, released on drop.
pub struct JournalLock {
    _file: fs::File,
}

impl PendingJournal {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create pending journal: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Take the journal for this process. Fails at once if another
    /// process holds it.
    pub fn lock(&self) -> Result<JournalLock> {
        let path = self.dir.join(".lock");
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open journal lock: {}", path.display()))?;
        if file.try_lock_exclusive().is_err() {
            bail!(
                "pending journal {} is in use by another librarian process",
                self.dir.display()
            );
        }
        Ok(JournalLock { _file: file })
    }

    fn path_for(&self, content_hash: &str) -> PathBuf {
        self.dir.join(format!("{}.json", content_hash))
    }

    /// Persist `entry` durably. Replaces an older record for the same hash.
    pub fn record(&self, entry: &NewCatalogEntry) -> io::Result<()> {
        let path = self.path_for(&entry.content_hash);
        let temp = self.dir.join(format!(".{}.tmp", entry.content_hash));

        let body = serde_json::to_vec_pretty(entry).map_err(io::Error::other)?;
        let mut file = fs::File::create(&temp)?;
        file.write_all(&body)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp, &path)
    }

    pub fn get(&self, content_hash: &str) -> io::Result<Option<NewCatalogEntry>> {
        match fs::read(self.path_for(content_hash)) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn remove(&self, content_hash: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(content_hash)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// All readable records, ordered by hash. Unreadable ones are logged
    /// and left on disk.
    pub fn list(&self) -> Result<Vec<NewCatalogEntry>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read pending journal: {}", self.dir.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|x| x == "json").unwrap_or(false))
            .collect();
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = fs::read(&path)
                .map_err(anyhow::Error::from)
                .and_then(|b| serde_json::from_slice::<NewCatalogEntry>(&b).map_err(Into::into));
            match parsed {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable pending record"),
            }
        }
        Ok(entries)
    }

    pub fn len(&self) -> usize {
        fs::read_dir(&self.dir)
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().map(|x| x == "json").unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened to one pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Archived copy confirmed and the catalog now has the entry.
    Cataloged(InsertOutcome),
    /// The move never happened; the inbox copy will be processed again.
    NeverMoved,
    /// Neither the archived copy nor the inbox copy exists. Kept.
    Orphaned,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub cataloged: usize,
    pub never_moved: usize,
    pub orphaned: usize,
    pub failed: usize,
}

impl ReplaySummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Settle one pending record.
pub async fn settle(
    journal: &PendingJournal,
    catalog: &dyn Catalog,
    entry: &NewCatalogEntry,
) -> Result<Settled, IngestError> {
    let archived = entry.archive_location.exists();
    let source = entry.original_location.as_path();

    if !archived {
        if source.exists() {
            debug!(hash = %hashing::short(&entry.content_hash), "pending move never happened");
            journal
                .remove(&entry.content_hash)
                .map_err(|e| IngestError::io(Stage::Identified, journal.dir(), e))?;
            return Ok(Settled::NeverMoved);
        }
        error!(
            hash = %entry.content_hash,
            path = %source.display(),
            dest = %entry.archive_location.display(),
            "pending record has neither an archived nor an inbox copy; keeping it"
        );
        return Ok(Settled::Orphaned);
    }

    let archived_hash = hashing::hash_file_blocking(entry.archive_location.clone())
        .await
        .map_err(|e| IngestError::io(Stage::Moved, &entry.archive_location, e))?;
    if archived_hash != entry.content_hash {
        return Err(IngestError::VerifyMismatch {
            path: entry.archive_location.clone(),
            expected: entry.content_hash.clone(),
        });
    }

    let outcome = catalog
        .insert(entry)
        .await
        .map_err(|e| IngestError::catalog(Stage::Moved, e))?;

    // A copy that was archived but never removed from the inbox
    if source.exists() {
        match hashing::hash_file_blocking(source.to_path_buf()).await {
            Ok(hash) if hash == entry.content_hash => {
                if let Err(e) = fs::remove_file(source) {
                    warn!(path = %source.display(), error = %e, "could not remove archived inbox copy");
                }
            }
            _ => {}
        }
    }

    journal
        .remove(&entry.content_hash)
        .map_err(|e| IngestError::io(Stage::Cataloged, journal.dir(), e))?;

    Ok(Settled::Cataloged(outcome))
}

/// Settle every pending record. Failures stay in the journal for the next
/// pass.
pub async fn replay(journal: &PendingJournal, catalog: &dyn Catalog) -> Result<ReplaySummary> {
    replay_claimed(journal, catalog, |_| Some(())).await
}

/// [`replay`] for a journal shared with running workers. `claim` must
/// return a guard owning the content hash for as long as it is held, or
/// `None` when a worker owns it; such records are left for the worker.
pub async fn replay_claimed<G>(
    journal: &PendingJournal,
    catalog: &dyn Catalog,
    claim: impl Fn(&str) -> Option<G>,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for entry in journal.list()? {
        let Some(_guard) = claim(&entry.content_hash) else {
            debug!(hash = %hashing::short(&entry.content_hash), "pending record in flight");
            continue;
        };
        match settle(journal, catalog, &entry).await {
            Ok(Settled::Cataloged(outcome)) => {
                info!(
                    hash = %hashing::short(&entry.content_hash),
                    dest = %entry.archive_location.display(),
                    already = outcome == InsertOutcome::AlreadyCataloged,
                    "pending catalog write completed"
                );
                summary.cataloged += 1;
            }
            Ok(Settled::NeverMoved) => summary.never_moved += 1,
            Ok(Settled::Orphaned) => summary.orphaned += 1,
            Err(e) => {
                warn!(hash = %hashing::short(&entry.content_hash), error = %e, "pending catalog write still failing");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

//! Archive placement.
//!
//! Decides where a file's bytes end up, and whether they should be
//! archived at all:
//!
//! 1. Content already cataloged: a true duplicate, nothing is archived.
//! 2. Otherwise the partition is `{root}/{YYYY}/{YYYY-MM-DD}` from the
//!    capture date, or `{root}/{unknown_date_dir}` when no date resolved.
//! 3. If the partition already holds the same bytes (an interrupted earlier
//!    run), that copy is reused.
//! 4. Otherwise the original name is used if free, else `stem_1.ext`,
//!    `stem_2.ext`, ... up to the configured limit. First free slot wins.
//!
//! A slot is free only if nothing is on disk there and no catalog entry
//! records it. An archived file deleted by hand keeps its name.
//!
//! Name choice and the subsequent move happen under a per-partition lock,
//! so two workers can never pick the same suffix.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::ArchiveConfig;
use crate::error::{IngestError, Stage};
use crate::hashing;
use crate::models::CatalogEntry;

#[derive(Debug, Clone)]
pub struct PlacementRequest<'a> {
    pub content_hash: &'a str,
    pub captured_at: Option<NaiveDateTime>,
    pub original_name: &'a str,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Content is already cataloged. Discard the source.
    Duplicate(CatalogEntry),
    /// Not cataloged, but these bytes already sit at this path.
    AlreadyArchived(PathBuf),
    /// Move the file here, then catalog it.
    Archive(PathBuf),
}

/// Held until the move into the partition has finished.
pub struct PartitionLock {
    _guard: OwnedMutexGuard<()>,
}

pub struct Placed {
    pub placement: Placement,
    pub lock: Option<PartitionLock>,
}

pub struct ArchivePlacer {
    root: PathBuf,
    unknown_date_dir: String,
    max_suffix: u32,
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl ArchivePlacer {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            root: config.root.clone(),
            unknown_date_dir: config.unknown_date_dir.clone(),
            max_suffix: config.max_collision_suffix,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn partition_for(&self, captured_at: Option<NaiveDateTime>) -> PathBuf {
        match captured_at {
            Some(dt) => self
                .root
                .join(dt.format("%Y").to_string())
                .join(dt.format("%Y-%m-%d").to_string()),
            None => self.root.join(&self.unknown_date_dir),
        }
    }

    pub async fn lock_partition(&self, dir: &Path) -> PartitionLock {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Partitions nobody holds or waits on
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(dir.to_path_buf()).or_default())
        };
        PartitionLock {
            _guard: lock.lock_owned().await,
        }
    }

    pub async fn place(
        &self,
        catalog: &dyn Catalog,
        request: &PlacementRequest<'_>,
    ) -> Result<Placed, IngestError> {
        let existing = catalog
            .find_by_hash(request.content_hash)
            .await
            .map_err(|e| IngestError::catalog(Stage::Identified, e))?;
        if let Some(entry) = existing {
            return Ok(Placed {
                placement: Placement::Duplicate(entry),
                lock: None,
            });
        }

        let dir = self.partition_for(request.captured_at);
        let lock = self.lock_partition(&dir).await;

        let mut skip = HashSet::new();
        loop {
            let dir = dir.clone();
            let name = request.original_name.to_string();
            let hash = request.content_hash.to_string();
            let size = request.size_bytes;
            let limit = self.max_suffix;
            let taken = skip.clone();
            let placement = tokio::task::spawn_blocking(move || {
                choose_in(&dir, &name, &hash, size, limit, &taken)
            })
            .await
            .map_err(|e| IngestError::io(Stage::Identified, self.root.clone(), io::Error::other(e)))??;

            let candidate = match &placement {
                Placement::Archive(p) | Placement::AlreadyArchived(p) => p.clone(),
                Placement::Duplicate(_) => {
                    return Ok(Placed {
                        placement,
                        lock: Some(lock),
                    })
                }
            };
            let cataloged = catalog
                .location_taken(&candidate)
                .await
                .map_err(|e| IngestError::catalog(Stage::Identified, e))?;
            if !cataloged {
                return Ok(Placed {
                    placement,
                    lock: Some(lock),
                });
            }
            debug!(dest = %candidate.display(), "name held by catalog entry");
            skip.insert(candidate);
        }
    }
}

/// Pick a destination inside `dir`, treating paths in `taken` as occupied.
/// Caller must hold the partition lock.
pub fn choose_in(
    dir: &Path,
    original_name: &str,
    content_hash: &str,
    size_bytes: u64,
    max_suffix: u32,
    taken: &HashSet<PathBuf>,
) -> Result<Placement, IngestError> {
    fs::create_dir_all(dir).map_err(|e| IngestError::io(Stage::Identified, dir, e))?;

    if let Some(existing) = find_identical(dir, content_hash, size_bytes, taken)? {
        return Ok(Placement::AlreadyArchived(existing));
    }

    for n in 0..=max_suffix {
        let candidate = dir.join(candidate_name(original_name, n));
        if taken.contains(&candidate) {
            continue;
        }
        match fs::symlink_metadata(&candidate) {
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if n > 0 {
                    debug!(dest = %candidate.display(), suffix = n, "name collision resolved");
                }
                return Ok(Placement::Archive(candidate));
            }
            Err(e) => return Err(IngestError::io(Stage::Identified, candidate, e)),
        }
    }

    Err(IngestError::CollisionExhausted {
        dir: dir.to_path_buf(),
        name: original_name.to_string(),
        limit: max_suffix,
    })
}

/// `IMG_0001.jpg` with `n = 2` becomes `IMG_0001_2.jpg`; `n = 0` is the
/// name itself.
pub fn candidate_name(original_name: &str, n: u32) -> String {
    if n == 0 {
        return original_name.to_string();
    }
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| original_name.to_string());
    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    }
}

fn find_identical(
    dir: &Path,
    content_hash: &str,
    size_bytes: u64,
    taken: &HashSet<PathBuf>,
) -> Result<Option<PathBuf>, IngestError> {
    let entries = fs::read_dir(dir).map_err(|e| IngestError::io(Stage::Identified, dir, e))?;

    let mut same_size: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .filter(|entry| {
            entry
                .metadata()
                .map(|m| m.is_file() && m.len() == size_bytes)
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .filter(|path| !taken.contains(path))
        .collect();
    same_size.sort();

    for candidate in same_size {
        match hashing::hash_file(&candidate) {
            Ok(hash) if hash == content_hash => return Ok(Some(candidate)),
            Ok(_) => {}
            Err(e) => debug!(path = %candidate.display(), error = %e, "cannot hash archived file"),
        }
    }
    Ok(None)
}

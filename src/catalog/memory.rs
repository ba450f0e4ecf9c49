//! In-memory [`Catalog`] implementation for tests and dry runs.
//!
//! Can be switched unavailable to simulate a catalog outage: every call
//! then fails until it is switched back. Writes alone can also be refused,
//! which models the catalog dropping out between lookup and insert.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::Catalog;
use crate::models::{CatalogEntry, InsertOutcome, NewCatalogEntry, StageFlags};

pub struct InMemoryCatalog {
    entries: RwLock<HashMap<String, CatalogEntry>>,
    available: AtomicBool,
    writable: AtomicBool,
    insert_attempts: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            writable: AtomicBool::new(true),
            insert_attempts: AtomicUsize::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, ordered by archive location.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        let mut all: Vec<CatalogEntry> = self
            .entries
            .read()
            .map(|e| e.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by(|a, b| a.archive_location.cmp(&b.archive_location));
        all
    }

    /// Number of insert calls that reached the catalog, successful or not.
    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<()> {
        if !self.available.load(Ordering::SeqCst) {
            bail!("catalog unavailable");
        }
        Ok(())
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<CatalogEntry>> {
        self.ensure_available()?;
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(entries.get(content_hash).cloned())
    }

    async fn location_taken(&self, archive_location: &Path) -> Result<bool> {
        self.ensure_available()?;
        let location = archive_location.to_string_lossy();
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(entries.values().any(|e| e.archive_location == location))
    }

    async fn insert(&self, entry: &NewCatalogEntry) -> Result<InsertOutcome> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        if !self.writable.load(Ordering::SeqCst) {
            bail!("catalog rejected write: read-only");
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;

        if entries.contains_key(&entry.content_hash) {
            return Ok(InsertOutcome::AlreadyCataloged);
        }

        let archive_location = entry.archive_location.to_string_lossy().to_string();
        if entries
            .values()
            .any(|e| e.archive_location == archive_location)
        {
            bail!(
                "archive location already cataloged for different content: {}",
                archive_location
            );
        }

        let last = entries.values().map(|e| e.ingested_at).max();
        let now = Utc::now();
        let ingested_at = match last {
            Some(last) if last > now => last,
            _ => now,
        };

        entries.insert(
            entry.content_hash.clone(),
            CatalogEntry {
                id: Uuid::new_v4().to_string(),
                content_hash: entry.content_hash.clone(),
                original_name: entry.original_name.clone(),
                original_location: entry.original_location.to_string_lossy().to_string(),
                archive_location,
                size_bytes: entry.size_bytes,
                captured_at: entry.captured_at,
                ingested_at,
                location: entry.location,
                flags: StageFlags {
                    is_ingested: true,
                    ..StageFlags::default()
                },
            },
        );

        Ok(InsertOutcome::Inserted)
    }
}

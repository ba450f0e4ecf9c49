//! Process health counters for the external monitor.
//!
//! The snapshot is logged periodically and, when `[status].path` is set,
//! written as JSON. The file is replaced atomically so a reader never
//! sees a half-written snapshot.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

pub struct StatusTracker {
    started_at: DateTime<Utc>,
    cataloged: AtomicU64,
    duplicates: AtomicU64,
    errors: AtomicU64,
    skipped: AtomicU64,
    pending_catalog_writes: AtomicU64,
    paused: AtomicBool,
    last_activity: Mutex<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub started_at: DateTime<Utc>,
    pub cataloged: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub skipped: u64,
    pub pending_catalog_writes: u64,
    pub paused: bool,
    pub last_activity: Option<DateTime<Utc>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            cataloged: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            pending_catalog_writes: AtomicU64::new(0),
            paused: AtomicBool::new(false),
            last_activity: Mutex::new(None),
        }
    }

    pub fn record_cataloged(&self) {
        self.cataloged.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    /// Skips are not activity: an unsettled file is probed every sweep.
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_pending(&self, pending: usize) {
        self.pending_catalog_writes
            .store(pending as u64, Ordering::Relaxed);
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    fn touch(&self) {
        if let Ok(mut last) = self.last_activity.lock() {
            *last = Some(Utc::now());
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            started_at: self.started_at,
            cataloged: self.cataloged.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            pending_catalog_writes: self.pending_catalog_writes.load(Ordering::Relaxed),
            paused: self.paused.load(Ordering::Relaxed),
            last_activity: self.last_activity.lock().ok().and_then(|l| *l),
        }
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSnapshot {
    pub fn log(&self) {
        info!(
            cataloged = self.cataloged,
            duplicates = self.duplicates,
            errors = self.errors,
            skipped = self.skipped,
            pending = self.pending_catalog_writes,
            paused = self.paused,
            last_activity = %self
                .last_activity
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
            "status"
        );
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create status directory: {}", parent.display()))?;
        }
        let temp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(self)?;

        let mut file = fs::File::create(&temp)
            .with_context(|| format!("Failed to write status file: {}", temp.display()))?;
        file.write_all(&body)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp, path)
            .with_context(|| format!("Failed to replace status file: {}", path.display()))?;
        Ok(())
    }
}

//! Ingestion coordinator.
//!
//! Drives each inbox file through
//! `Detected → Stable → Identified → Placed → {Discarded | Moved → Cataloged}`.
//! A file that fails anywhere before `Moved` stays in the inbox untouched
//! and is retried by the next sweep. Once a file has been moved, its
//! catalog entry sits in the pending journal until the catalog accepts it.
//!
//! Two detection paths feed the same pipeline: live notifications
//! ([`crate::watcher`]) and a periodic full sweep. A path is owned by at
//! most one worker at a time; a second trigger for a path already in
//! flight is dropped.

use std::collections::HashSet;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, SqliteCatalog};
use crate::config::{ArchiveConfig, Config};
use crate::db;
use crate::error::{IngestError, Stage};
use crate::hashing::{self, hash_file_blocking};
use crate::inbox::{scan_inbox, InboxFilter};
use crate::journal::{self, PendingJournal, ReplaySummary};
use crate::metadata::MetadataResolver;
use crate::migrate;
use crate::models::{InsertOutcome, NewCatalogEntry};
use crate::placement::{ArchivePlacer, Placed, Placement, PlacementRequest};
use crate::stability::{await_stable, probe, StabilityPolicy, Verdict};
use crate::status::{StatusSnapshot, StatusTracker};
use crate::transfer::move_into_archive;
use crate::watcher;

/// Terminal result of one pass over one file.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Cataloged(PathBuf),
    /// Archived at this path; the catalog write is pending.
    PendingCatalog(PathBuf),
    /// True duplicate, inbox copy removed.
    Discarded { duplicate_of: String },
    Skipped(Skip),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Excluded,
    InFlight,
    Paused,
    Vanished,
    Unsettled,
    ChangedWhileHashing,
    SameContentInFlight,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub candidates: usize,
    pub cataloged: usize,
    pub pending_catalog: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
    pub replay: ReplaySummary,
}

impl SweepSummary {
    fn add(&mut self, result: &Result<Outcome, IngestError>) {
        match result {
            Ok(Outcome::Cataloged(_)) => self.cataloged += 1,
            Ok(Outcome::PendingCatalog(_)) => self.pending_catalog += 1,
            Ok(Outcome::Discarded { .. }) => self.duplicates += 1,
            Ok(Outcome::Skipped(_)) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// What a dry run would do with one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub content_hash: String,
    pub captured_at: Option<NaiveDateTime>,
    pub date_source: Option<&'static str>,
    pub duplicate_of: Option<String>,
    pub partition: PathBuf,
}

/// Set of keys currently owned by a worker.
struct InFlight<K: Eq + Hash> {
    keys: Mutex<HashSet<K>>,
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    fn new() -> Self {
        Self {
            keys: Mutex::new(HashSet::new()),
        }
    }

    fn claim(&self, key: K) -> Option<Claim<'_, K>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(Claim { owner: self, key })
    }

    fn len(&self) -> usize {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Released on drop, whatever path the worker leaves by.
struct Claim<'a, K: Eq + Hash> {
    owner: &'a InFlight<K>,
    key: K,
}

impl<K: Eq + Hash> Drop for Claim<'_, K> {
    fn drop(&mut self) {
        self.owner
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

pub struct Ingestor {
    inbox_root: PathBuf,
    follow_symlinks: bool,
    filter: InboxFilter,
    policy: StabilityPolicy,
    catalog: Arc<dyn Catalog>,
    resolver: Arc<MetadataResolver>,
    placer: ArchivePlacer,
    journal: PendingJournal,
    paths_in_flight: InFlight<PathBuf>,
    contents_in_flight: InFlight<String>,
    workers: Arc<Semaphore>,
    pause_for: Duration,
    paused_until: Mutex<Option<Instant>>,
    sweeping: AtomicBool,
    status: StatusTracker,
}

impl Ingestor {
    pub fn new(config: &Config, catalog: Arc<dyn Catalog>) -> Result<Self> {
        Self::with_resolver(config, catalog, MetadataResolver::from_config(&config.metadata))
    }

    pub fn with_resolver(
        config: &Config,
        catalog: Arc<dyn Catalog>,
        resolver: MetadataResolver,
    ) -> Result<Self> {
        let inbox_root = std::fs::canonicalize(&config.inbox.root).with_context(|| {
            format!("Inbox root does not exist: {}", config.inbox.root.display())
        })?;
        let archive = ArchiveConfig {
            root: resolve_archive_root(&config.archive.root, &inbox_root)?,
            ..config.archive.clone()
        };
        let filter = InboxFilter::new(&inbox_root, &config.inbox.exclude_globs)
            .context("Invalid inbox.exclude_globs")?;
        let journal = PendingJournal::open(&config.catalog.pending_dir())?;

        let ingestor = Self {
            inbox_root,
            follow_symlinks: config.inbox.follow_symlinks,
            filter,
            policy: StabilityPolicy::from(&config.stability),
            catalog,
            resolver: Arc::new(resolver),
            placer: ArchivePlacer::new(&archive),
            journal,
            paths_in_flight: InFlight::new(),
            contents_in_flight: InFlight::new(),
            workers: Arc::new(Semaphore::new(config.sweep.workers)),
            pause_for: Duration::from_secs(config.archive.pause_on_full_secs),
            paused_until: Mutex::new(None),
            sweeping: AtomicBool::new(false),
            status: StatusTracker::new(),
        };
        ingestor.status.set_pending(ingestor.journal.len());
        Ok(ingestor)
    }

    pub fn inbox_root(&self) -> &Path {
        &self.inbox_root
    }

    pub fn journal(&self) -> &PendingJournal {
        &self.journal
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    pub fn in_flight(&self) -> usize {
        self.paths_in_flight.len()
    }

    /// Run one file through the pipeline, record the result, and return it.
    pub async fn process_file(&self, path: &Path) -> Result<Outcome, IngestError> {
        let result = self.advance(path).await;

        match &result {
            Ok(Outcome::Cataloged(_)) => self.status.record_cataloged(),
            Ok(Outcome::PendingCatalog(_)) => self.status.record_error(),
            Ok(Outcome::Discarded { .. }) => self.status.record_duplicate(),
            Ok(Outcome::Skipped(_)) => self.status.record_skipped(),
            Err(e) => {
                self.status.record_error();
                if e.is_storage_full() {
                    self.pause(e);
                } else if e.needs_intervention() {
                    error!(path = %path.display(), stage = %e.stage(), error = %e, "file left in inbox for manual intervention");
                } else {
                    warn!(path = %path.display(), stage = %e.stage(), error = %e, "file left in inbox; will retry");
                }
            }
        }
        self.status.set_pending(self.journal.len());

        result
    }

    async fn advance(&self, path: &Path) -> Result<Outcome, IngestError> {
        if !self.filter.should_process(path) {
            return Ok(Outcome::Skipped(Skip::Excluded));
        }
        let _claim = match self.paths_in_flight.claim(path.to_path_buf()) {
            Some(claim) => claim,
            None => {
                debug!(path = %path.display(), "already in flight");
                return Ok(Outcome::Skipped(Skip::InFlight));
            }
        };
        if self.is_paused() {
            return Ok(Outcome::Skipped(Skip::Paused));
        }

        // Detected -> Stable
        let verdict = await_stable(path, &self.policy)
            .await
            .map_err(|e| IngestError::io(Stage::Detected, path, e))?;
        let fingerprint = match verdict {
            Verdict::Stable(fp) => fp,
            Verdict::Vanished => return Ok(Outcome::Skipped(Skip::Vanished)),
            Verdict::Unsettled => return Ok(Outcome::Skipped(Skip::Unsettled)),
        };

        // Stable -> Identified
        let metadata = Arc::clone(&self.resolver)
            .resolve_blocking(path.to_path_buf())
            .await;
        let content_hash = match hash_file_blocking(path.to_path_buf()).await {
            Ok(hash) => hash,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Outcome::Skipped(Skip::Vanished))
            }
            Err(source) => {
                return Err(IngestError::Hash {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        match probe(path).map_err(|e| IngestError::io(Stage::Stable, path, e))? {
            Some(current) if current == fingerprint => {}
            Some(_) => {
                debug!(path = %path.display(), "changed while hashing");
                return Ok(Outcome::Skipped(Skip::ChangedWhileHashing));
            }
            None => return Ok(Outcome::Skipped(Skip::Vanished)),
        }
        let short = hashing::short(&content_hash).to_string();
        debug!(
            path = %path.display(),
            hash = %short,
            date_source = metadata.date_source.unwrap_or("none"),
            "identified"
        );

        let _content_claim = match self.contents_in_flight.claim(content_hash.clone()) {
            Some(claim) => claim,
            None => {
                debug!(path = %path.display(), hash = %short, "same content already in flight");
                return Ok(Outcome::Skipped(Skip::SameContentInFlight));
            }
        };

        // Same bytes moved earlier but not yet cataloged: settle that first
        // so the lookup below sees it.
        let pending = self
            .journal
            .get(&content_hash)
            .map_err(|e| IngestError::io(Stage::Identified, self.journal.dir(), e))?;
        if let Some(pending) = pending {
            let settled = journal::settle(&self.journal, self.catalog.as_ref(), &pending).await?;
            debug!(hash = %short, ?settled, "settled pending record for same content");
        }

        // Identified -> Placed
        let original_name = match path.file_name() {
            Some(name) => {
                if name.to_str().is_none() {
                    warn!(path = %path.display(), "file name is not UTF-8; archiving under a lossy name");
                }
                name.to_string_lossy().to_string()
            }
            None => String::new(),
        };
        let request = PlacementRequest {
            content_hash: &content_hash,
            captured_at: metadata.captured_at,
            original_name: &original_name,
            size_bytes: fingerprint.size,
        };
        let Placed { placement, lock } = self.placer.place(self.catalog.as_ref(), &request).await?;

        let entry_at = |archive_location: PathBuf| NewCatalogEntry {
            content_hash: content_hash.clone(),
            original_name: original_name.clone(),
            original_location: path.to_path_buf(),
            archive_location,
            size_bytes: fingerprint.size,
            captured_at: metadata.captured_at,
            location: metadata.location,
        };

        match placement {
            Placement::Duplicate(existing) => {
                discard_source(path)?;
                info!(
                    path = %path.display(),
                    hash = %short,
                    duplicate_of = %existing.archive_location,
                    "duplicate discarded"
                );
                Ok(Outcome::Discarded {
                    duplicate_of: existing.archive_location,
                })
            }

            Placement::AlreadyArchived(dest) => {
                drop(lock);
                debug!(path = %path.display(), dest = %dest.display(), "bytes already in archive");
                let entry = entry_at(dest);
                self.record_pending(&entry)?;
                let outcome = self.commit(&entry).await;
                if let Outcome::Cataloged(_) = outcome {
                    discard_source(path)?;
                }
                Ok(outcome)
            }

            Placement::Archive(dest) => {
                let entry = entry_at(dest.clone());
                self.record_pending(&entry)?;

                // Placed -> Moved
                let (src, dst, hash) = (path.to_path_buf(), dest.clone(), content_hash.clone());
                let moved = tokio::task::spawn_blocking(move || move_into_archive(&src, &dst, &hash))
                    .await
                    .map_err(|e| IngestError::io(Stage::Placed, &dest, io::Error::other(e)))
                    .and_then(|r| r);
                drop(lock);

                match moved {
                    Ok(method) => {
                        debug!(path = %path.display(), dest = %dest.display(), ?method, "moved")
                    }
                    Err(e) => {
                        // Nothing reached the destination, so nothing is pending
                        if let Err(je) = self.journal.remove(&content_hash) {
                            warn!(hash = %short, error = %je, "could not drop pending record");
                        }
                        return Err(e);
                    }
                }

                // Moved -> Cataloged
                Ok(self.commit(&entry).await)
            }
        }
    }

    fn record_pending(&self, entry: &NewCatalogEntry) -> Result<(), IngestError> {
        self.journal
            .record(entry)
            .map_err(|e| IngestError::io(Stage::Placed, self.journal.dir(), e))
    }

    /// Catalog write for an entry whose bytes are in the archive. A failure
    /// is not an error for the file: the record stays pending.
    async fn commit(&self, entry: &NewCatalogEntry) -> Outcome {
        let dest = entry.archive_location.clone();
        match self.catalog.insert(entry).await {
            Ok(outcome) => {
                if let Err(e) = self.journal.remove(&entry.content_hash) {
                    warn!(dest = %dest.display(), error = %e, "could not drop pending record");
                }
                info!(
                    path = %entry.original_location.display(),
                    dest = %dest.display(),
                    hash = %hashing::short(&entry.content_hash),
                    captured_at = ?entry.captured_at,
                    already = outcome == InsertOutcome::AlreadyCataloged,
                    "cataloged"
                );
                Outcome::Cataloged(dest)
            }
            Err(e) => {
                let e = IngestError::catalog(Stage::Moved, e);
                warn!(dest = %dest.display(), error = %e, "archived; catalog write pending");
                Outcome::PendingCatalog(dest)
            }
        }
    }

    fn is_paused(&self) -> bool {
        let mut until = self
            .paused_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *until {
            Some(t) if Instant::now() < t => true,
            Some(_) => {
                *until = None;
                self.status.set_paused(false);
                info!("resuming archival");
                false
            }
            None => false,
        }
    }

    fn pause(&self, cause: &IngestError) {
        let mut until = self
            .paused_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *until = Some(Instant::now() + self.pause_for);
        self.status.set_paused(true);
        error!(
            error = %cause,
            pause_secs = self.pause_for.as_secs(),
            "archive storage full; pausing new archival"
        );
    }

    /// Settle every pending catalog write.
    pub async fn replay_pending(&self) -> Result<ReplaySummary> {
        // A worker between writing its record and moving the file owns the hash
        let summary = journal::replay_claimed(&self.journal, self.catalog.as_ref(), |hash| {
            self.contents_in_flight.claim(hash.to_string())
        })
        .await?;
        self.status.set_pending(self.journal.len());
        Ok(summary)
    }

    async fn process_queued(&self, path: PathBuf) -> Result<Outcome, IngestError> {
        let _permit = Arc::clone(&self.workers).acquire_owned().await.ok();
        self.process_file(&path).await
    }

    /// Replay pending writes, then offer every inbox file to the pipeline.
    /// A sweep requested while one is running is a no-op.
    pub async fn run_sweep(self: &Arc<Self>) -> Result<SweepSummary> {
        if self.sweeping.swap(true, Ordering::SeqCst) {
            debug!("sweep already running");
            return Ok(SweepSummary::default());
        }
        let result = self.sweep_once().await;
        self.sweeping.store(false, Ordering::SeqCst);
        result
    }

    async fn sweep_once(self: &Arc<Self>) -> Result<SweepSummary> {
        let mut summary = SweepSummary {
            replay: self.replay_pending().await?,
            ..SweepSummary::default()
        };

        let files = scan_inbox(&self.inbox_root, &self.filter, self.follow_symlinks)?;
        summary.candidates = files.len();

        let mut tasks = JoinSet::new();
        for path in files {
            let this = Arc::clone(self);
            tasks.spawn(async move { this.process_queued(path).await });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => summary.add(&result),
                Err(e) => {
                    error!(error = %e, "ingest worker failed");
                    summary.failed += 1;
                }
            }
        }

        if summary.candidates > 0 || !summary.replay.is_empty() {
            info!(
                candidates = summary.candidates,
                cataloged = summary.cataloged,
                duplicates = summary.duplicates,
                pending = summary.pending_catalog,
                skipped = summary.skipped,
                failed = summary.failed,
                "sweep complete"
            );
        }
        Ok(summary)
    }

    /// Resolve, hash and look up every candidate without touching the
    /// inbox, the archive or the journal.
    pub async fn plan(&self) -> Result<Vec<PlannedFile>> {
        let files = scan_inbox(&self.inbox_root, &self.filter, self.follow_symlinks)?;
        let mut planned = Vec::with_capacity(files.len());

        for path in files {
            let metadata = Arc::clone(&self.resolver)
                .resolve_blocking(path.clone())
                .await;
            let content_hash = match hash_file_blocking(path.clone()).await {
                Ok(hash) => hash,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot hash file");
                    continue;
                }
            };
            let duplicate_of = self
                .catalog
                .find_by_hash(&content_hash)
                .await?
                .map(|e| e.archive_location);
            planned.push(PlannedFile {
                partition: self.placer.partition_for(metadata.captured_at),
                path,
                content_hash,
                captured_at: metadata.captured_at,
                date_source: metadata.date_source,
                duplicate_of,
            });
        }
        Ok(planned)
    }

    /// Long-running service: live notifications, periodic sweeps and
    /// status reports until Ctrl-C.
    pub async fn run_watch(
        self: Arc<Self>,
        sweep_every: Duration,
        status_every: Duration,
        status_path: Option<PathBuf>,
    ) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _watcher = watcher::watch_inbox(&self.inbox_root, tx)?;

        info!(
            inbox = %self.inbox_root.display(),
            archive = %self.placer.root().display(),
            sources = ?self.resolver.source_names(),
            "librarian started"
        );

        let mut sweep_tick = tokio::time::interval(sweep_every);
        let mut status_tick = tokio::time::interval(status_every);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(path) = rx.recv() => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        let _ = this.process_queued(path).await;
                    });
                }
                _ = sweep_tick.tick() => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let Err(e) = this.run_sweep().await {
                            error!(error = %format!("{:#}", e), "sweep failed");
                        }
                    });
                }
                _ = status_tick.tick() => {
                    self.publish_status(status_path.as_deref());
                }
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        self.publish_status(status_path.as_deref());
        Ok(())
    }

    fn publish_status(&self, path: Option<&Path>) {
        let snapshot = self.status.snapshot();
        snapshot.log();
        if let Some(path) = path {
            if let Err(e) = snapshot.write_to(path) {
                warn!(error = %format!("{:#}", e), "could not write status file");
            }
        }
    }
}

/// Canonical archive root, created if missing. Both roots are compared
/// after symlinks and `..` are resolved, so neither can sit inside the other.
fn resolve_archive_root(configured: &Path, inbox_root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(configured)
        .with_context(|| format!("Failed to create archive root: {}", configured.display()))?;
    let archive_root = std::fs::canonicalize(configured)
        .with_context(|| format!("Failed to resolve archive root: {}", configured.display()))?;

    if archive_root.starts_with(inbox_root) {
        bail!(
            "archive.root {} resolves inside inbox.root {}",
            archive_root.display(),
            inbox_root.display()
        );
    }
    if inbox_root.starts_with(&archive_root) {
        bail!(
            "inbox.root {} resolves inside archive.root {}",
            inbox_root.display(),
            archive_root.display()
        );
    }
    Ok(archive_root)
}

fn discard_source(path: &Path) -> Result<(), IngestError> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(IngestError::io(Stage::Placed, path, e)),
        _ => Ok(()),
    }
}

async fn open_catalog(config: &Config) -> Result<Arc<SqliteCatalog>> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    Ok(Arc::new(SqliteCatalog::new(pool)))
}

/// `librarian sweep`: one pass, then a printed summary.
pub async fn run_sweep_command(config: &Config, dry_run: bool) -> Result<()> {
    let catalog = open_catalog(config).await?;
    let ingestor = Arc::new(Ingestor::new(config, catalog.clone())?);

    if dry_run {
        let planned = ingestor.plan().await?;
        println!("sweep (dry-run)");
        println!("  candidates: {}", planned.len());
        for file in &planned {
            let target = match &file.duplicate_of {
                Some(existing) => format!("duplicate of {}", existing),
                None => file.partition.display().to_string(),
            };
            println!(
                "  {} -> {} (date: {})",
                file.path.display(),
                target,
                file.date_source.unwrap_or("none")
            );
        }
        catalog.close().await;
        return Ok(());
    }

    let _journal_lock = ingestor.journal().lock()?;
    let summary = ingestor.run_sweep().await?;

    println!("sweep");
    if !summary.replay.is_empty() {
        println!("  pending writes settled: {}", summary.replay.cataloged);
    }
    println!("  candidates: {}", summary.candidates);
    println!("  cataloged: {}", summary.cataloged);
    println!("  duplicates discarded: {}", summary.duplicates);
    println!("  pending catalog writes: {}", summary.pending_catalog);
    println!("  skipped: {}", summary.skipped);
    println!("  failed: {}", summary.failed);
    println!("ok");

    catalog.close().await;
    Ok(())
}

/// `librarian replay`: settle pending catalog writes only.
pub async fn run_replay_command(config: &Config) -> Result<()> {
    let catalog = open_catalog(config).await?;
    let journal = PendingJournal::open(&config.catalog.pending_dir())?;
    let _journal_lock = journal.lock()?;
    let summary = journal::replay(&journal, catalog.as_ref()).await?;

    println!("replay");
    println!("  cataloged: {}", summary.cataloged);
    println!("  never moved: {}", summary.never_moved);
    println!("  orphaned: {}", summary.orphaned);
    println!("  still failing: {}", summary.failed);
    println!("  remaining: {}", journal.len());
    println!("ok");

    catalog.close().await;
    Ok(())
}

/// `librarian watch`: run until interrupted.
pub async fn run_watch_command(config: &Config) -> Result<()> {
    let catalog = open_catalog(config).await?;
    let ingestor = Arc::new(Ingestor::new(config, catalog.clone())?);
    let _journal_lock = ingestor.journal().lock()?;

    ingestor
        .run_watch(
            Duration::from_secs(config.sweep.interval_secs),
            Duration::from_secs(config.status.interval_secs),
            config.status.path.clone(),
        )
        .await?;

    catalog.close().await;
    Ok(())
}

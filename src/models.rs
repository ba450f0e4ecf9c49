//! Core data types for catalog entries.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A WGS-84 coordinate pair. Only constructible from in-range values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Out-of-range or non-finite values are rejected, never clamped.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }
}

/// Everything the coordinator knows about a file once it has been moved
/// into the archive. This is what gets inserted, and what the pending
/// journal persists while the catalog is unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCatalogEntry {
    pub content_hash: String,
    pub original_name: String,
    pub original_location: PathBuf,
    pub archive_location: PathBuf,
    pub size_bytes: u64,
    pub captured_at: Option<NaiveDateTime>,
    pub location: Option<GeoPoint>,
}

/// Processing-stage flags owned by downstream consumers. Ingestion only
/// ever sets `is_ingested`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageFlags {
    pub is_ingested: bool,
    pub is_geocoded: bool,
    pub is_thumbnailed: bool,
    pub is_curated: bool,
    pub is_backed_up: bool,
    pub has_errors: bool,
    pub error_message: Option<String>,
}

/// A persisted catalog row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub content_hash: String,
    pub original_name: String,
    pub original_location: String,
    pub archive_location: String,
    pub size_bytes: u64,
    pub captured_at: Option<NaiveDateTime>,
    pub ingested_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub flags: StageFlags,
}

/// Result of a keyed catalog insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An entry with this content hash already exists; nothing was written.
    AlreadyCataloged,
}

//! SQLite-backed [`Catalog`] implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use uuid::Uuid;

use super::Catalog;
use crate::models::{CatalogEntry, GeoPoint, InsertOutcome, NewCatalogEntry, StageFlags};

/// Storage format for `captured_at`. Wall-clock time as recorded by the device.
pub const CAPTURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wraps a [`SqlitePool`] over the `media_assets` table.
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

const SELECT_COLUMNS: &str = "id, content_hash, original_name, original_location, \
    archive_location, size_bytes, captured_at, ingested_at, latitude, longitude, \
    is_ingested, is_geocoded, is_thumbnailed, is_curated, is_backed_up, has_errors, error_message";

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<CatalogEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM media_assets WHERE content_hash = ?",
            SELECT_COLUMNS
        ))
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await
        .context("catalog lookup by hash")?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn location_taken(&self, archive_location: &Path) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM media_assets WHERE archive_location = ? LIMIT 1")
                .bind(archive_location.to_string_lossy().to_string())
                .fetch_optional(&self.pool)
                .await
                .context("catalog lookup by archive location")?;
        Ok(found.is_some())
    }

    async fn insert(&self, entry: &NewCatalogEntry) -> Result<InsertOutcome> {
        let captured_at = entry
            .captured_at
            .map(|dt| dt.format(CAPTURED_AT_FORMAT).to_string());
        let now = Utc::now().timestamp();

        // ingested_at never goes backwards, even if the host clock does
        let result = sqlx::query(
            r#"
            INSERT INTO media_assets (id, content_hash, original_name, original_location,
                                      archive_location, size_bytes, captured_at, ingested_at,
                                      latitude, longitude, is_ingested)
            VALUES (?, ?, ?, ?, ?, ?, ?,
                    MAX(?, COALESCE((SELECT MAX(ingested_at) FROM media_assets), 0)),
                    ?, ?, 1)
            ON CONFLICT(content_hash) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&entry.content_hash)
        .bind(&entry.original_name)
        .bind(entry.original_location.to_string_lossy().to_string())
        .bind(entry.archive_location.to_string_lossy().to_string())
        .bind(entry.size_bytes as i64)
        .bind(captured_at)
        .bind(now)
        .bind(entry.location.map(|p| p.latitude))
        .bind(entry.location.map(|p| p.longitude))
        .execute(&self.pool)
        .await
        .context("catalog insert")?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyCataloged)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<CatalogEntry> {
    let captured_at: Option<String> = row.try_get("captured_at")?;
    let captured_at = captured_at
        .map(|s| NaiveDateTime::parse_from_str(&s, CAPTURED_AT_FORMAT))
        .transpose()
        .context("stored captured_at is malformed")?;

    let ingested_at: i64 = row.try_get("ingested_at")?;
    let ingested_at = DateTime::<Utc>::from_timestamp(ingested_at, 0)
        .with_context(|| format!("stored ingested_at out of range: {}", ingested_at))?;

    let latitude: Option<f64> = row.try_get("latitude")?;
    let longitude: Option<f64> = row.try_get("longitude")?;
    let location = match (latitude, longitude) {
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
        _ => None,
    };

    let size_bytes: i64 = row.try_get("size_bytes")?;

    Ok(CatalogEntry {
        id: row.try_get("id")?,
        content_hash: row.try_get("content_hash")?,
        original_name: row.try_get("original_name")?,
        original_location: row.try_get("original_location")?,
        archive_location: row.try_get("archive_location")?,
        size_bytes: size_bytes.max(0) as u64,
        captured_at,
        ingested_at,
        location,
        flags: StageFlags {
            is_ingested: row.try_get("is_ingested")?,
            is_geocoded: row.try_get("is_geocoded")?,
            is_thumbnailed: row.try_get("is_thumbnailed")?,
            is_curated: row.try_get("is_curated")?,
            is_backed_up: row.try_get("is_backed_up")?,
            has_errors: row.try_get("has_errors")?,
            error_message: row.try_get("error_message")?,
        },
    })
}

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the catalog schema. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // One row per archived file, keyed by content hash
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_assets (
            id TEXT PRIMARY KEY,
            content_hash TEXT NOT NULL UNIQUE,
            original_name TEXT NOT NULL,
            original_location TEXT NOT NULL,
            archive_location TEXT NOT NULL UNIQUE,
            size_bytes INTEGER NOT NULL,
            captured_at TEXT,
            ingested_at INTEGER NOT NULL,
            latitude REAL,
            longitude REAL,
            is_ingested INTEGER NOT NULL DEFAULT 1,
            is_geocoded INTEGER NOT NULL DEFAULT 0,
            is_thumbnailed INTEGER NOT NULL DEFAULT 0,
            is_curated INTEGER NOT NULL DEFAULT 0,
            is_backed_up INTEGER NOT NULL DEFAULT 0,
            has_errors INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            CHECK ((latitude IS NULL) = (longitude IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Identity and location are write-once; only stage flags may change
    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS media_assets_immutable
        BEFORE UPDATE OF content_hash, original_name, original_location, latitude, longitude
        ON media_assets
        WHEN NEW.content_hash IS NOT OLD.content_hash
          OR NEW.original_name IS NOT OLD.original_name
          OR NEW.original_location IS NOT OLD.original_location
          OR NEW.latitude IS NOT OLD.latitude
          OR NEW.longitude IS NOT OLD.longitude
        BEGIN
            SELECT RAISE(ABORT, 'media_assets identity and location columns are immutable');
        END
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_media_assets_captured_at ON media_assets(captured_at)",
        "CREATE INDEX IF NOT EXISTS idx_media_assets_ingested_at ON media_assets(ingested_at)",
        "CREATE INDEX IF NOT EXISTS idx_media_assets_is_geocoded ON media_assets(is_geocoded)",
        "CREATE INDEX IF NOT EXISTS idx_media_assets_is_backed_up ON media_assets(is_backed_up)",
        "CREATE INDEX IF NOT EXISTS idx_media_assets_has_errors ON media_assets(has_errors)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

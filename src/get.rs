//! Catalog entry retrieval by content hash.

use anyhow::{bail, Result};

use crate::catalog::{Catalog, SqliteCatalog};
use crate::config::Config;
use crate::db;
use crate::models::CatalogEntry;

/// Look up one entry. A hash prefix of at least 8 characters is accepted
/// when it is unambiguous.
pub async fn get_entry(config: &Config, hash: &str) -> Result<CatalogEntry> {
    let hash = hash.trim().to_ascii_lowercase();
    if hash.len() < 8 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("expected a hex content hash (at least 8 characters): {}", hash);
    }

    let pool = db::connect(config).await?;
    let catalog = SqliteCatalog::new(pool);

    let full_hash = if hash.len() == 64 {
        Some(hash.clone())
    } else {
        let matches: Vec<String> = sqlx::query_scalar(
            "SELECT content_hash FROM media_assets WHERE content_hash LIKE ? ORDER BY content_hash LIMIT 2",
        )
        .bind(format!("{}%", hash))
        .fetch_all(catalog.pool())
        .await?;
        if matches.len() > 1 {
            catalog.close().await;
            bail!("hash prefix is ambiguous: {}", hash);
        }
        matches.into_iter().next()
    };

    let entry = match full_hash {
        Some(full) => catalog.find_by_hash(&full).await?,
        None => None,
    };
    catalog.close().await;

    match entry {
        Some(entry) => Ok(entry),
        None => bail!("entry not found: {}", hash),
    }
}

/// Run the get command: print the entry as JSON.
pub async fn run_get(config: &Config, hash: &str) -> Result<()> {
    let entry = get_entry(config, hash).await?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

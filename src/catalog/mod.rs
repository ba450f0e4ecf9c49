//! Catalog service boundary.
//!
//! The [`Catalog`] trait is the only way the coordinator touches catalog
//! state. Content-hash uniqueness is enforced behind it, so concurrent
//! workers never share in-process catalog data and a retried insert is
//! reported as [`InsertOutcome::AlreadyCataloged`] rather than duplicated.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`SqliteCatalog`] | Production catalog file |
//! | [`InMemoryCatalog`] | Tests, outage simulation |

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::models::{CatalogEntry, InsertOutcome, NewCatalogEntry};

pub use memory::InMemoryCatalog;
pub use sqlite::SqliteCatalog;

/// Lookup/insert interface to the catalog store.
///
/// Implementations may be temporarily unreachable; every method returns
/// an error in that case and callers treat it as transient.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Find the entry for a content hash, if one exists.
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<CatalogEntry>>;

    /// Whether an entry already claims this archive path. A cataloged file
    /// that was removed from disk still holds its name.
    async fn location_taken(&self, archive_location: &Path) -> Result<bool>;

    /// Insert an entry keyed by its content hash. The catalog assigns
    /// `ingested_at`.
    async fn insert(&self, entry: &NewCatalogEntry) -> Result<InsertOutcome>;
}

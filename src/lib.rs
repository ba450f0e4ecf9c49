//! # Librarian
//!
//! Watched-inbox media ingestion. Files dropped into an inbox are waited on
//! until they stop changing, dated and located from embedded metadata,
//! identified by SHA-256, and moved into a date-partitioned archive with
//! one catalog entry per distinct content.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐
//! │  Inbox   │──▶│ Stability │──▶│ Metadata │──▶│  SHA-256 │──▶│ Placement │
//! │ watch +  │   │   check   │   │ fallback │   │ identity │   │ partition │
//! │  sweep   │   └───────────┘   └──────────┘   └──────────┘   └─────┬─────┘
//! └──────────┘                                                       │
//!                     ┌──────────────┐      ┌──────────┐             │
//!                     │   Catalog    │◀─────│  Move    │◀────────────┘
//!                     │ (SQLite)     │      │ (atomic) │
//!                     └──────▲───────┘      └────┬─────┘
//!                            └── pending journal ┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! librarian init                 # create catalog, inbox and archive roots
//! librarian sweep --dry-run      # show where each inbox file would go
//! librarian sweep                # archive everything that is stable
//! librarian watch                # run as a service
//! librarian stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error`] | Per-file pipeline errors |
//! | [`models`] | Catalog data types |
//! | [`db`] | SQLite connection |
//! | [`migrate`] | Catalog schema |
//! | [`catalog`] | Catalog service boundary (SQLite, in-memory) |
//! | [`inbox`] | Inbox scan and deny list |
//! | [`watcher`] | Live filesystem notifications |
//! | [`stability`] | Quiet-window stability detection |
//! | [`metadata`] | Capture date and location fallback chain |
//! | [`hashing`] | Streaming SHA-256 |
//! | [`placement`] | Partition choice and collision suffixes |
//! | [`transfer`] | Atomic or verified move into the archive |
//! | [`journal`] | Pending catalog writes and replay |
//! | [`ingest`] | Ingestion coordinator |
//! | [`status`] | Health counters for the external monitor |
//! | [`stats`] | Catalog statistics |
//! | [`get`] | Entry lookup by hash |

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod get;
pub mod hashing;
pub mod inbox;
pub mod ingest;
pub mod journal;
pub mod logging;
pub mod metadata;
pub mod migrate;
pub mod models;
pub mod placement;
pub mod stability;
pub mod stats;
pub mod status;
pub mod transfer;
pub mod watcher;

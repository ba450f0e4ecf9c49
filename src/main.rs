//! # Librarian CLI (`librarian`)
//!
//! ## Usage
//!
//! ```bash
//! librarian --config ./config/librarian.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `librarian init` | Create the catalog schema and the inbox/archive roots |
//! | `librarian watch` | Run the ingestion service until interrupted |
//! | `librarian sweep` | Replay pending writes, then ingest every stable inbox file once |
//! | `librarian sweep --dry-run` | Show where each inbox file would go |
//! | `librarian replay` | Settle pending catalog writes only |
//! | `librarian stats` | Catalog summary |
//! | `librarian get <hash>` | One catalog entry as JSON |

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use librarian::{config, get, ingest, logging, migrate, stats};

/// Librarian: watched-inbox media ingestion into a date-partitioned archive.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/librarian.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "librarian",
    about = "Watched-inbox media ingestion into a date-partitioned archive",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/librarian.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the catalog schema, inbox and archive roots.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Watch the inbox and ingest files as they settle.
    ///
    /// Combines live filesystem notifications with a periodic full sweep.
    /// Stops on Ctrl-C.
    Watch,

    /// Ingest every stable inbox file once, then exit.
    Sweep {
        /// Report date source, partition and duplicate status without
        /// moving anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Complete catalog writes left pending by an earlier run.
    Replay,

    /// Print catalog statistics.
    Stats,

    /// Print one catalog entry as JSON.
    Get {
        /// Content hash, or an unambiguous prefix of at least 8 characters.
        hash: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Init => {
            for dir in [&cfg.inbox.root, &cfg.archive.root] {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
            migrate::run_migrations(&cfg).await?;
            println!("Catalog initialized successfully.");
        }
        Commands::Watch => {
            ingest::run_watch_command(&cfg).await?;
        }
        Commands::Sweep { dry_run } => {
            ingest::run_sweep_command(&cfg, dry_run).await?;
        }
        Commands::Replay => {
            ingest::run_replay_command(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Get { hash } => {
            get::run_get(&cfg, &hash).await?;
        }
    }

    Ok(())
}

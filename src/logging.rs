//! Tracing subscriber setup.
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | File left for manual intervention, archival paused |
//! | WARN  | Transient failure that will be retried, fallback applied |
//! | INFO  | Lifecycle events and per-file terminal outcomes |
//! | DEBUG | Decision points (date source, chosen name, skips) |
//!
//! `RUST_LOG` overrides the configured level when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. Per-file events carry `path`, `hash`,
/// `dest` and `stage` fields.
pub fn init(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("librarian={}", config.level).into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so command output on stdout stays parseable.
    let result = if config.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {}", e);
    }
}

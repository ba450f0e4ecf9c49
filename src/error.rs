//! Per-file pipeline errors.
//!
//! Every variant is scoped to one inbox file. None of them stop the
//! process: the file stays where it is and the next sweep retries it,
//! except [`IngestError::StorageFull`], which also pauses new archival.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Position of a file in the ingestion state machine.
///
/// `Detected → Stable → Identified → Placed → Moved → Cataloged`, with
/// `Discarded` as the terminal state for true duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detected,
    Stable,
    Identified,
    Placed,
    Moved,
    Cataloged,
    Discarded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Detected => "detected",
            Stage::Stable => "stable",
            Stage::Identified => "identified",
            Stage::Placed => "placed",
            Stage::Moved => "moved",
            Stage::Cataloged => "cataloged",
            Stage::Discarded => "discarded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{path}: I/O error after {stage}: {source}")]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: could not compute content hash: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("catalog unavailable after {stage}: {message}")]
    CatalogUnavailable { stage: Stage, message: String },

    #[error("no free name for {name} in {dir} within {limit} suffixes")]
    CollisionExhausted {
        dir: PathBuf,
        name: String,
        limit: u32,
    },

    #[error("archive storage full at {path}: {source}")]
    StorageFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: copied bytes do not match source hash {expected}")]
    VerifyMismatch { path: PathBuf, expected: String },
}

impl IngestError {
    /// Classify an I/O failure, promoting out-of-space to [`IngestError::StorageFull`].
    pub fn io(stage: Stage, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::StorageFull {
            IngestError::StorageFull { path, source }
        } else {
            IngestError::Io {
                stage,
                path,
                source,
            }
        }
    }

    pub fn catalog(stage: Stage, err: anyhow::Error) -> Self {
        IngestError::CatalogUnavailable {
            stage,
            message: format!("{:#}", err),
        }
    }

    /// The last state the file reached before failing.
    pub fn stage(&self) -> Stage {
        match self {
            IngestError::Io { stage, .. } => *stage,
            IngestError::Hash { .. } => Stage::Stable,
            IngestError::CatalogUnavailable { stage, .. } => *stage,
            IngestError::CollisionExhausted { .. } => Stage::Identified,
            IngestError::StorageFull { .. } => Stage::Identified,
            IngestError::VerifyMismatch { .. } => Stage::Placed,
        }
    }

    pub fn is_storage_full(&self) -> bool {
        matches!(self, IngestError::StorageFull { .. })
    }

    /// Errors that need an operator rather than another sweep.
    pub fn needs_intervention(&self) -> bool {
        matches!(
            self,
            IngestError::CollisionExhausted { .. } | IngestError::VerifyMismatch { .. }
        )
    }
}

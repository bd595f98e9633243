//! Error types for tether-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use tether_core::{InputError, OwnerId, TargetId};

/// Kind of remote mutation, used to name the failing step of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Delete,
    Upsert,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Delete => write!(f, "delete"),
            OpKind::Upsert => write!(f, "upsert"),
        }
    }
}

/// Failure reported by a transport for a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The owner or the target does not exist on the remote side.
    #[error("not found")]
    NotFound,

    /// The remote side answered with a non-success status.
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The remote side could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The remote answered, but the body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// All errors that can arise from reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Declaration or codec validation failure; raised before any remote call.
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// A delete or upsert failed; earlier operations of the batch stay applied.
    #[error("{op} of target '{target_id}' failed: {source}")]
    Transport {
        op: OpKind,
        target_id: TargetId,
        #[source]
        source: TransportError,
    },

    /// Listing the owner's relations failed.
    #[error("listing relations of owner '{owner}' failed: {source}")]
    List {
        owner: OwnerId,
        #[source]
        source: TransportError,
    },

    /// The owner itself no longer exists on the remote side.
    #[error("owner '{owner}' not found")]
    OwnerNotFound { owner: OwnerId },

    /// The state file at `path` was recorded for a different owner.
    #[error("state at {} belongs to owner '{found}', not '{expected}'", path.display())]
    StateOwnerMismatch {
        path: PathBuf,
        expected: OwnerId,
        found: OwnerId,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (state store).
    #[error("state store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

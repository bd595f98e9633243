//! Error types for tether-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while decoding or validating a declaration.
///
/// Every variant is detected before any remote call is made.
#[derive(Debug, Error)]
pub enum InputError {
    /// Underlying I/O failure while reading a declaration file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse declaration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The declaration file did not exist at the expected path.
    #[error("declaration not found at {path}")]
    DeclarationNotFound { path: PathBuf },

    /// The declaration names no owner.
    #[error("declaration has an empty owner id")]
    MissingOwner,

    /// A relation entry carried an empty target id.
    #[error("relation #{index} has an empty target id")]
    MissingTargetId { index: usize },

    /// The same target id was declared more than once.
    #[error("target '{target_id}' is declared more than once")]
    DuplicateTarget { target_id: String },

    /// The ordering value was present but not an integer.
    #[error("target '{target_id}' has a malformed ordering value: {value}")]
    InvalidOrdering { target_id: String, value: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> InputError {
    InputError::Io {
        path: path.into(),
        source,
    }
}

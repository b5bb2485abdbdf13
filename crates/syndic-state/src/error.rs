//! Error types for syndic-state

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by catalog and ledger storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem access failed
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored document could not be parsed
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Serialization failed before a write
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// No entity with this slug exists in the catalog
    #[error("entity not found: {slug}")]
    EntityNotFound { slug: String },

    /// Two catalog documents declare the same slug
    #[error("duplicate entity slug {slug} in {paths:?}")]
    DuplicateSlug { slug: String, paths: Vec<PathBuf> },

    /// The posted log already holds this content reference
    #[error("content reference {content_ref} already recorded for {platform}")]
    DuplicateContentRef {
        platform: String,
        content_ref: String,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        StorageError::Parse {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

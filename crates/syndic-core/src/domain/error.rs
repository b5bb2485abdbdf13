//! Domain-level error taxonomy for syndic.

use syndic_state::{Platform, StorageError};

use crate::generator::GenerationError;

/// Syndic domain errors.
#[derive(Debug, thiserror::Error)]
pub enum SyndicError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("no profile for platform {0}")]
    UnsupportedPlatform(Platform),

    #[error("invalid retry transition: {0}")]
    InvalidTransition(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyndicError {
    /// Whether the error stems from operator configuration rather than a
    /// runtime fault.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SyndicError::UnknownEntity(_) | SyndicError::Config(_)
        ) || matches!(
            self,
            SyndicError::Storage(
                StorageError::EntityNotFound { .. } | StorageError::DuplicateSlug { .. }
            )
        )
    }
}

/// Result type for syndic domain operations.
pub type Result<T> = std::result::Result<T, SyndicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_lookup_failures_are_config_errors() {
        assert!(SyndicError::UnknownEntity("x".into()).is_config());
        assert!(SyndicError::Storage(StorageError::EntityNotFound { slug: "x".into() }).is_config());
        assert!(SyndicError::Storage(StorageError::DuplicateSlug {
            slug: "x".into(),
            paths: Vec::new(),
        })
        .is_config());
        assert!(!SyndicError::InvalidTransition("x".into()).is_config());
    }
}

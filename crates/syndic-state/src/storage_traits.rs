//! Storage trait definitions for syndic
//!
//! These traits define the persistence seams of the pipeline:
//! - `CatalogStore`: promotable entity definitions
//! - `LedgerStore`: shared publication history
//! - `PostedLogStore`: per-platform posted logs (idempotence ledger)
//! - `ArtifactStore`: archived drafts and generated reports
//! - `UsageStore`: generation token usage
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StorageError;
use crate::ledger::PublicationLedger;
use crate::posted::{PostedLog, PostedRecord};
use crate::schema::{Entity, Platform};
use crate::usage::{UsageEntry, UsageLog};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All entities, ordered by slug.
    async fn load_entities(&self) -> StorageResult<Vec<Entity>>;

    /// A single entity. Returns `StorageError::EntityNotFound` if absent.
    async fn load_entity(&self, slug: &str) -> StorageResult<Entity>;
}

// ---------------------------------------------------------------------------
// Ledgers
// ---------------------------------------------------------------------------

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the publication history. A missing file is an empty ledger.
    async fn load_ledger(&self) -> StorageResult<PublicationLedger>;

    /// Append one publication date for `slug`.
    async fn append_publication(&self, slug: &str, date: NaiveDate) -> StorageResult<()>;
}

/// Per-platform posted logs.
///
/// Guarantees:
/// - `append_posted` fails with `DuplicateContentRef` when the reference is
///   already present, and leaves the log unchanged.
/// - A missing log reads as empty.
#[async_trait]
pub trait PostedLogStore: Send + Sync {
    async fn load_posted(&self, platform: Platform) -> StorageResult<PostedLog>;

    async fn append_posted(&self, platform: Platform, record: PostedRecord) -> StorageResult<()>;
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// SHA-256 digest of an archived artifact (lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A draft archived for audit, accepted or rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub platform: Platform,
    /// File stem, usually the content reference.
    pub name: String,
    pub rejected: bool,
    pub payload: serde_json::Value,
}

/// Where an artifact landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub location: String,
    pub digest: ContentDigest,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist a draft. Saving the same name twice overwrites.
    async fn save_artifact(&self, artifact: &Artifact) -> StorageResult<ArtifactLocation>;

    /// Persist a named report under the metadata area (e.g. `analytics`).
    async fn save_report(
        &self,
        name: &str,
        report: &serde_json::Value,
    ) -> StorageResult<ArtifactLocation>;
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn append_usage(&self, entry: UsageEntry) -> StorageResult<()>;

    async fn load_usage(&self) -> StorageResult<UsageLog>;
}

/// Everything the pipeline persists, behind one handle.
pub trait ContentStore:
    CatalogStore + LedgerStore + PostedLogStore + ArtifactStore + UsageStore
{
}

impl<T> ContentStore for T where
    T: CatalogStore + LedgerStore + PostedLogStore + ArtifactStore + UsageStore
{
}

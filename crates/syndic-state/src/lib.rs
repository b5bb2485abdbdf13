//! Syndic-State: persistence for the syndic publication pipeline
//!
//! All durable state lives in plain JSON files under the content directory so
//! that it can be committed alongside the content it describes.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: append-only ledgers, atomic writes, tolerant reads of older layouts.
//!
//! ## Key Components
//!
//! - `Entity`: a promotable project from the catalog
//! - `PublicationLedger`: slug -> publication dates, the source of all rotation state
//! - `PostedLog`: per-platform idempotence ledger keyed by content reference
//! - `FsContentStore`: JSON-file backend; `fakes::MemoryContentStore` for tests

mod error;
pub mod fakes;
pub mod fs_store;
mod ledger;
mod posted;
mod schema;
pub mod storage_traits;
mod usage;

pub use error::StorageError;
pub use fs_store::FsContentStore;
pub use ledger::PublicationLedger;
pub use posted::{PostedLog, PostedRecord};
pub use schema::{
    Category, Entity, Feature, Frequency, Platform, Schedule, SourceNotes, UnknownPlatform,
};
pub use storage_traits::{
    Artifact, ArtifactLocation, ArtifactStore, CatalogStore, ContentDigest, ContentStore,
    LedgerStore, PostedLogStore, StorageResult, UsageStore,
};
pub use usage::{UsageEntry, UsageLog};

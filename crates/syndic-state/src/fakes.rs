//! In-memory fakes for storage traits (testing only)
//!
//! `MemoryContentStore` satisfies every storage contract without touching the
//! filesystem, and exposes inspection helpers for assertions.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StorageError;
use crate::ledger::PublicationLedger;
use crate::posted::{PostedLog, PostedRecord};
use crate::schema::{Entity, Platform};
use crate::storage_traits::*;
use crate::usage::{UsageEntry, UsageLog};

#[derive(Debug, Default)]
struct Inner {
    entities: BTreeMap<String, Entity>,
    ledger: PublicationLedger,
    posted: HashMap<Platform, PostedLog>,
    artifacts: Vec<Artifact>,
    reports: HashMap<String, serde_json::Value>,
    usage: UsageLog,
}

#[derive(Debug, Default)]
pub struct MemoryContentStore {
    inner: Mutex<Inner>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_entities(entities: impl IntoIterator<Item = Entity>) -> StorageResult<Self> {
        let store = Self::new();
        for e in entities {
            store.insert_entity(e)?;
        }
        Ok(store)
    }

    /// Add an entity; slugs are unique across the catalog.
    pub fn insert_entity(&self, entity: Entity) -> StorageResult<()> {
        let mut inner = self.lock();
        if inner.entities.contains_key(&entity.slug) {
            return Err(StorageError::DuplicateSlug {
                slug: entity.slug,
                paths: Vec::new(),
            });
        }
        inner.entities.insert(entity.slug.clone(), entity);
        Ok(())
    }

    pub fn set_ledger(&self, ledger: PublicationLedger) {
        self.lock().ledger = ledger;
    }

    pub fn set_posted(&self, platform: Platform, log: PostedLog) {
        self.lock().posted.insert(platform, log);
    }

    pub fn ledger(&self) -> PublicationLedger {
        self.lock().ledger.clone()
    }

    pub fn posted(&self, platform: Platform) -> PostedLog {
        self.lock().posted.get(&platform).cloned().unwrap_or_default()
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.lock().artifacts.clone()
    }

    pub fn report(&self, name: &str) -> Option<serde_json::Value> {
        self.lock().reports.get(name).cloned()
    }

    pub fn usage(&self) -> UsageLog {
        self.lock().usage.clone()
    }
}

#[async_trait]
impl CatalogStore for MemoryContentStore {
    async fn load_entities(&self) -> StorageResult<Vec<Entity>> {
        Ok(self.lock().entities.values().cloned().collect())
    }

    async fn load_entity(&self, slug: &str) -> StorageResult<Entity> {
        self.lock()
            .entities
            .get(slug)
            .cloned()
            .ok_or_else(|| StorageError::EntityNotFound {
                slug: slug.to_string(),
            })
    }
}

#[async_trait]
impl LedgerStore for MemoryContentStore {
    async fn load_ledger(&self) -> StorageResult<PublicationLedger> {
        Ok(self.lock().ledger.clone())
    }

    async fn append_publication(&self, slug: &str, date: NaiveDate) -> StorageResult<()> {
        self.lock().ledger.append(slug, date);
        Ok(())
    }
}

#[async_trait]
impl PostedLogStore for MemoryContentStore {
    async fn load_posted(&self, platform: Platform) -> StorageResult<PostedLog> {
        Ok(self.posted(platform))
    }

    async fn append_posted(&self, platform: Platform, record: PostedRecord) -> StorageResult<()> {
        let mut inner = self.lock();
        let log = inner.posted.entry(platform).or_default();
        let reference = record.content_reference.clone();
        if log.push(record) {
            Ok(())
        } else {
            Err(StorageError::DuplicateContentRef {
                platform: platform.to_string(),
                content_ref: reference,
            })
        }
    }
}

#[async_trait]
impl ArtifactStore for MemoryContentStore {
    async fn save_artifact(&self, artifact: &Artifact) -> StorageResult<ArtifactLocation> {
        let bytes = serde_json::to_vec(&artifact.payload)?;
        let sub = if artifact.rejected { "rejected/" } else { "" };
        let location = format!("memory://{}/{}{}", artifact.platform, sub, artifact.name);
        let mut inner = self.lock();
        inner.artifacts.retain(|a| {
            !(a.platform == artifact.platform
                && a.name == artifact.name
                && a.rejected == artifact.rejected)
        });
        inner.artifacts.push(artifact.clone());
        Ok(ArtifactLocation {
            location,
            digest: ContentDigest::from_bytes(&bytes),
        })
    }

    async fn save_report(
        &self,
        name: &str,
        report: &serde_json::Value,
    ) -> StorageResult<ArtifactLocation> {
        let bytes = serde_json::to_vec(report)?;
        self.lock().reports.insert(name.to_string(), report.clone());
        Ok(ArtifactLocation {
            location: format!("memory://meta/{name}"),
            digest: ContentDigest::from_bytes(&bytes),
        })
    }
}

#[async_trait]
impl UsageStore for MemoryContentStore {
    async fn append_usage(&self, entry: UsageEntry) -> StorageResult<()> {
        self.lock().usage.entries.push(entry);
        Ok(())
    }

    async fn load_usage(&self) -> StorageResult<UsageLog> {
        Ok(self.usage())
    }
}

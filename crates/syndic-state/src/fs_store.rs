//! JSON-file backend rooted at the content directory.
//!
//! Layout:
//! ```text
//! <root>/projects/<slug>.json            catalog
//! <root>/meta/published-log.json         publication ledger
//! <root>/meta/api-usage.json             usage log
//! <root>/meta/<report>.json              reports (analytics, ...)
//! <root>/sns/<platform>/.posted.json     posted log
//! <root>/sns/<platform>/<name>.json      accepted drafts
//! <root>/sns/<platform>/rejected/<name>.json
//! ```
//!
//! Every write goes through a temp file in the target directory followed by a
//! rename, so readers never observe a half-written ledger. Read-modify-write
//! cycles are serialised by an in-process lock; a single writer process is assumed.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StorageError;
use crate::ledger::PublicationLedger;
use crate::posted::{PostedLog, PostedRecord};
use crate::schema::{Entity, Platform};
use crate::storage_traits::*;
use crate::usage::{UsageEntry, UsageLog};

pub const POSTED_LOG_FILE: &str = ".posted.json";

pub struct FsContentStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsContentStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join("meta").join("published-log.json")
    }

    pub fn usage_path(&self) -> PathBuf {
        self.root.join("meta").join("api-usage.json")
    }

    pub fn platform_dir(&self, platform: Platform) -> PathBuf {
        self.root.join("sns").join(platform.as_str())
    }

    pub fn posted_log_path(&self, platform: Platform) -> PathBuf {
        self.platform_dir(platform).join(POSTED_LOG_FILE)
    }
}

fn read_json_or_default<T>(path: &Path) -> StorageResult<T>
where
    T: DeserializeOwned + Default,
{
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StorageError::parse(path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<ContentDigest> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let dir = path
        .parent()
        .ok_or_else(|| StorageError::io(path, std::io::ErrorKind::InvalidInput.into()))?;
    fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
    tmp.write_all(&bytes).map_err(|e| StorageError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| StorageError::io(path, e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "wrote json");
    Ok(ContentDigest::from_bytes(&bytes))
}

#[async_trait]
impl CatalogStore for FsContentStore {
    async fn load_entities(&self) -> StorageResult<Vec<Entity>> {
        let dir = self.projects_dir();
        let listing = match fs::read_dir(&dir) {
            Ok(listing) => listing,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&dir, e)),
        };

        let mut paths = Vec::new();
        for entry in listing {
            let path = entry.map_err(|e| StorageError::io(&dir, e))?.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if !is_json || hidden {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut entities = Vec::new();
        for path in paths {
            let bytes = fs::read(&path).map_err(|e| StorageError::io(&path, e))?;
            let entity: Entity =
                serde_json::from_slice(&bytes).map_err(|e| StorageError::parse(&path, e))?;
            if let Some(first) = seen.get(&entity.slug) {
                return Err(StorageError::DuplicateSlug {
                    slug: entity.slug,
                    paths: vec![first.clone(), path],
                });
            }
            seen.insert(entity.slug.clone(), path);
            entities.push(entity);
        }
        entities.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(entities)
    }

    async fn load_entity(&self, slug: &str) -> StorageResult<Entity> {
        self.load_entities()
            .await?
            .into_iter()
            .find(|e| e.slug == slug)
            .ok_or_else(|| StorageError::EntityNotFound {
                slug: slug.to_string(),
            })
    }
}

#[async_trait]
impl LedgerStore for FsContentStore {
    async fn load_ledger(&self) -> StorageResult<PublicationLedger> {
        read_json_or_default(&self.ledger_path())
    }

    async fn append_publication(&self, slug: &str, date: NaiveDate) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.ledger_path();
        let mut ledger: PublicationLedger = read_json_or_default(&path)?;
        ledger.append(slug, date);
        write_json_atomic(&path, &ledger)?;
        Ok(())
    }
}

#[async_trait]
impl PostedLogStore for FsContentStore {
    async fn load_posted(&self, platform: Platform) -> StorageResult<PostedLog> {
        read_json_or_default(&self.posted_log_path(platform))
    }

    async fn append_posted(&self, platform: Platform, record: PostedRecord) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.posted_log_path(platform);
        let mut log: PostedLog = read_json_or_default(&path)?;
        let reference = record.content_reference.clone();
        if !log.push(record) {
            return Err(StorageError::DuplicateContentRef {
                platform: platform.to_string(),
                content_ref: reference,
            });
        }
        write_json_atomic(&path, &log)?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FsContentStore {
    async fn save_artifact(&self, artifact: &Artifact) -> StorageResult<ArtifactLocation> {
        let mut dir = self.platform_dir(artifact.platform);
        if artifact.rejected {
            dir = dir.join("rejected");
        }
        let path = dir.join(format!("{}.json", artifact.name));
        let digest = write_json_atomic(&path, &artifact.payload)?;
        Ok(ArtifactLocation {
            location: path.display().to_string(),
            digest,
        })
    }

    async fn save_report(
        &self,
        name: &str,
        report: &serde_json::Value,
    ) -> StorageResult<ArtifactLocation> {
        let path = self.root.join("meta").join(format!("{name}.json"));
        let digest = write_json_atomic(&path, report)?;
        Ok(ArtifactLocation {
            location: path.display().to_string(),
            digest,
        })
    }
}

#[async_trait]
impl UsageStore for FsContentStore {
    async fn append_usage(&self, entry: UsageEntry) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.usage_path();
        let mut log: UsageLog = read_json_or_default(&path)?;
        log.entries.push(entry);
        write_json_atomic(&path, &log)?;
        Ok(())
    }

    async fn load_usage(&self) -> StorageResult<UsageLog> {
        read_json_or_default(&self.usage_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (tempfile::TempDir, FsContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn missing_files_read_as_empty() {
        let (_dir, store) = make_store();
        assert!(store.load_entities().await.unwrap().is_empty());
        assert!(store.load_ledger().await.unwrap().is_empty());
        assert!(store.load_posted(Platform::Devto).await.unwrap().is_empty());
        assert!(store.load_usage().await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn ledger_write_is_pretty_json() {
        let (_dir, store) = make_store();
        let date = NaiveDate::from_ymd_opt(2026, 4, 6).unwrap();
        store.append_publication("alpha", date).await.unwrap();
        let raw = fs::read_to_string(store.ledger_path()).unwrap();
        assert_eq!(raw, "{\n  \"alpha\": [\n    \"2026-04-06\"\n  ]\n}");
    }

    #[tokio::test]
    async fn corrupt_ledger_is_a_parse_error() {
        let (_dir, store) = make_store();
        fs::create_dir_all(store.ledger_path().parent().unwrap()).unwrap();
        fs::write(store.ledger_path(), "{not json").unwrap();
        let err = store.load_ledger().await.unwrap_err();
        assert!(matches!(err, StorageError::Parse { .. }));
    }

    #[tokio::test]
    async fn rejected_artifacts_land_in_subdirectory() {
        let (_dir, store) = make_store();
        let artifact = Artifact {
            platform: Platform::Qiita,
            name: "2026-04-06-alpha".to_string(),
            rejected: true,
            payload: serde_json::json!({"title": "t"}),
        };
        let loc = store.save_artifact(&artifact).await.unwrap();
        assert!(loc.location.ends_with("sns/qiita/rejected/2026-04-06-alpha.json"));
        assert!(Path::new(&loc.location).exists());
    }
}

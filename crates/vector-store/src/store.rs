use crate::collection::Collection;
use crate::error::{Result, VectorStoreError};
use crate::health::HealthReport;
use crate::metadata::CollectionMetadata;
use crate::paths::{is_valid_collection_name, parse_document_filename, QUARANTINE_DIR_NAME};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The on-disk substrate shared by every collection under one root
/// directory. Collections are loaded lazily: `open` only runs the
/// reconciliation pass, the first `get_or_create_collection` call for a
/// given name does the actual read.
pub struct VectorStore {
    root: PathBuf,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl VectorStore {
    /// Open (or initialize) a store rooted at `root`, running the startup
    /// resilience scan: a collection directory missing its metadata record
    /// is quarantined if it still has documents, or removed outright if
    /// it's empty. The store never repairs a collection on its own beyond
    /// that — recovery is an explicit admin action (see `recovery`).
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tokio::fs::create_dir_all(root.join(QUARANTINE_DIR_NAME)).await?;
        let store = Self {
            root,
            collections: RwLock::new(HashMap::new()),
        };
        store.reconcile_on_startup().await?;
        Ok(store)
    }

    async fn reconcile_on_startup(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name == QUARANTINE_DIR_NAME {
                continue;
            }
            let dir = entry.path();
            if CollectionMetadata::exists(&dir) {
                continue;
            }
            if directory_has_documents(&dir).await? {
                let dest = self.root.join(QUARANTINE_DIR_NAME).join(name);
                tokio::fs::rename(&dir, &dest).await?;
                log::warn!(
                    "quarantined collection directory '{name}': documents present but metadata missing"
                );
            } else {
                tokio::fs::remove_dir_all(&dir).await?;
                log::info!("removed empty collection directory '{name}'");
            }
        }
        Ok(())
    }

    /// Return the named collection, creating it with `dimension` if it
    /// doesn't exist yet, or loading it from disk on first use. A request
    /// against a collection that already exists with a different dimension
    /// is a validation error — the store never silently re-dimensions data.
    pub async fn get_or_create_collection(
        &self,
        name: &str,
        dimension: usize,
    ) -> Result<Arc<Collection>> {
        if !is_valid_collection_name(name) {
            return Err(VectorStoreError::Validation(format!(
                "invalid collection name '{name}'"
            )));
        }

        {
            let collections = self.collections.read().await;
            if let Some(existing) = collections.get(name) {
                return check_dimension(existing.clone(), dimension);
            }
        }

        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(name) {
            return check_dimension(existing.clone(), dimension);
        }

        let hash = crate::paths::collection_hash(name);
        let dir = self.root.join(&hash);
        let collection = if CollectionMetadata::exists(&dir) {
            Collection::load(dir, name.to_string()).await?
        } else {
            Collection::create(dir, name.to_string(), dimension).await?
        };
        let collection = Arc::new(collection);
        check_dimension(collection.clone(), dimension)?;
        collections.insert(name.to_string(), collection.clone());
        Ok(collection)
    }

    /// Drop every in-memory collection handle. Every write is already
    /// flushed to disk synchronously, so this is just freeing memory —
    /// a later `get_or_create_collection` call re-reads from disk.
    pub async fn close_collections(&self) {
        self.collections.write().await.clear();
    }

    /// Categorize every collection directory under the root and under
    /// `quarantine/` without mutating the quarantine bucket. Unlike the
    /// startup pass, this never moves a directory into quarantine on its
    /// own — it only reports what it finds — but it does remove directories
    /// that are empty right now, since those carry no data to lose.
    pub async fn health_scan(&self) -> Result<HealthReport> {
        let mut report = HealthReport::default();

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(hash) = file_name.to_str() else {
                continue;
            };
            if hash == QUARANTINE_DIR_NAME {
                continue;
            }
            let dir = entry.path();
            if CollectionMetadata::exists(&dir) {
                let metadata = CollectionMetadata::load(&dir).await?;
                report.healthy.push(metadata.name);
            } else if directory_has_documents(&dir).await? {
                report.corrupt.push(hash.to_string());
            } else {
                tokio::fs::remove_dir_all(&dir).await?;
                report.empty_removed.push(hash.to_string());
            }
        }

        let quarantine_dir = self.root.join(QUARANTINE_DIR_NAME);
        let mut q_entries = tokio::fs::read_dir(&quarantine_dir).await?;
        while let Some(entry) = q_entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(hash) = entry.file_name().to_str() {
                report.quarantined.push(hash.to_string());
            }
        }

        Ok(report)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn check_dimension(collection: Arc<Collection>, dimension: usize) -> Result<Arc<Collection>> {
    if collection.dimension() != dimension {
        return Err(VectorStoreError::Validation(format!(
            "collection '{}' was created with dimension {}, requested {dimension}",
            collection.name(),
            collection.dimension()
        )));
    }
    Ok(collection)
}

async fn directory_has_documents(dir: &Path) -> Result<bool> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            if parse_document_filename(name).is_some() {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn filter(tenant: &str) -> BTreeMap<String, String> {
        let mut f = BTreeMap::new();
        f.insert("tenant_id".to_string(), tenant.to_string());
        f
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent_and_persists() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(dir.path()).await.unwrap();
        let collection = store.get_or_create_collection("notes", 3).await.unwrap();
        collection
            .add(vec![
                Document::new("a", "hello", vec![1.0, 0.0, 0.0]).with_metadata(filter("t1")),
            ])
            .await
            .unwrap();

        let same = store.get_or_create_collection("notes", 3).await.unwrap();
        assert_eq!(same.count(&filter("t1")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reopening_store_reloads_collection_from_disk() {
        let dir = tempdir().unwrap();
        {
            let store = VectorStore::open(dir.path()).await.unwrap();
            let collection = store.get_or_create_collection("notes", 2).await.unwrap();
            collection
                .add(vec![Document::new("a", "x", vec![1.0, 0.0]).with_metadata(filter("t1"))])
                .await
                .unwrap();
        }
        let store = VectorStore::open(dir.path()).await.unwrap();
        let collection = store.get_or_create_collection("notes", 2).await.unwrap();
        assert_eq!(collection.count(&filter("t1")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dimension_mismatch_against_existing_collection_is_rejected() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(dir.path()).await.unwrap();
        store.get_or_create_collection("notes", 3).await.unwrap();
        let result = store.get_or_create_collection("notes", 4).await;
        assert!(matches!(result, Err(VectorStoreError::Validation(_))));
    }

    #[tokio::test]
    async fn startup_quarantines_directory_missing_metadata_with_documents() {
        let dir = tempdir().unwrap();
        let hash = crate::paths::collection_hash("orphan");
        let orphan_dir = dir.path().join(&hash);
        tokio::fs::create_dir_all(&orphan_dir).await.unwrap();
        tokio::fs::write(orphan_dir.join("00000001.json"), b"{}")
            .await
            .unwrap();

        let store = VectorStore::open(dir.path()).await.unwrap();
        let report = store.health_scan().await.unwrap();
        assert!(report.quarantined.contains(&hash));
        assert!(!dir.path().join(&hash).exists());
    }

    #[tokio::test]
    async fn startup_removes_empty_directory_missing_metadata() {
        let dir = tempdir().unwrap();
        let hash = crate::paths::collection_hash("empty");
        tokio::fs::create_dir_all(dir.path().join(&hash)).await.unwrap();

        VectorStore::open(dir.path()).await.unwrap();
        assert!(!dir.path().join(&hash).exists());
    }

    #[tokio::test]
    async fn health_scan_reports_healthy_collection_by_name() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(dir.path()).await.unwrap();
        store.get_or_create_collection("notes", 3).await.unwrap();
        let report = store.health_scan().await.unwrap();
        assert_eq!(report.healthy, vec!["notes".to_string()]);
        assert_eq!(report.total_unhealthy(), 0);
    }

    #[tokio::test]
    async fn rejects_invalid_collection_name() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(dir.path()).await.unwrap();
        let result = store.get_or_create_collection("bad name!", 3).await;
        assert!(matches!(result, Err(VectorStoreError::Validation(_))));
    }
}

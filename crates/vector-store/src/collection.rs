use crate::error::{Result, VectorStoreError};
use crate::metadata::CollectionMetadata;
use crate::paths::{document_filename, parse_document_filename};
use crate::types::{cosine_similarity, matches_filter, Document, Filter, ScoredDocument};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

struct State {
    documents: BTreeMap<String, Document>,
    file_index: HashMap<String, u64>,
    next_index: u64,
    next_seq: u64,
}

/// One named, hash-addressed collection of documents. Reads take a shared
/// lock, writes an exclusive one — writes to a single collection are
/// serialized, matching §5's ordering guarantee. Consumers never touch the
/// on-disk files directly; every mutation goes through `add`/`delete`.
pub struct Collection {
    name: String,
    dir: PathBuf,
    dimension: usize,
    state: RwLock<State>,
}

impl Collection {
    /// Create a brand-new, empty collection: write its metadata record and
    /// nothing else.
    pub async fn create(dir: PathBuf, name: String, dimension: usize) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        CollectionMetadata::new(&name, dimension).save(&dir).await?;
        Ok(Self {
            name,
            dir,
            dimension,
            state: RwLock::new(State {
                documents: BTreeMap::new(),
                file_index: HashMap::new(),
                next_index: 1,
                next_seq: 0,
            }),
        })
    }

    /// Load an existing healthy collection (metadata present) from disk,
    /// reading every document record into memory.
    pub async fn load(dir: PathBuf, name: String) -> Result<Self> {
        let metadata = CollectionMetadata::load(&dir).await?;
        let mut documents = BTreeMap::new();
        let mut file_index = HashMap::new();
        let mut max_index = 0u64;
        let mut next_seq = 0u64;

        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(index) = parse_document_filename(file_name) else {
                continue;
            };
            max_index = max_index.max(index);
            let bytes = tokio::fs::read(entry.path()).await?;
            let doc: Document = serde_json::from_slice(&bytes)?;
            next_seq = next_seq.max(doc.seq + 1);
            file_index.insert(doc.id.clone(), index);
            documents.insert(doc.id.clone(), doc);
        }

        Ok(Self {
            name,
            dir,
            dimension: metadata.dimension,
            state: RwLock::new(State {
                documents,
                file_index,
                next_index: max_index + 1,
                next_seq,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Insert or replace documents. A document whose embedding dimension
    /// doesn't match the collection's is a validation error for that
    /// document; earlier documents in the same call are still committed
    /// (partial success — spec makes no atomicity promise across a batch).
    pub async fn add(&self, docs: Vec<Document>) -> Result<()> {
        let mut state = self.state.write().await;
        for mut doc in docs {
            if doc.embedding.len() != self.dimension {
                return Err(VectorStoreError::InvalidDimension {
                    expected: self.dimension,
                    actual: doc.embedding.len(),
                });
            }
            doc.seq = state.next_seq;
            state.next_seq += 1;

            let index = if let Some(existing) = state.file_index.get(&doc.id) {
                *existing
            } else {
                let index = state.next_index;
                state.next_index += 1;
                index
            };

            let path = self.dir.join(document_filename(index));
            let bytes = serde_json::to_vec(&doc)?;
            tokio::fs::write(&path, bytes).await?;

            state.file_index.insert(doc.id.clone(), index);
            state.documents.insert(doc.id.clone(), doc);
        }
        Ok(())
    }

    /// Cosine-similarity search. `filter` must be non-empty — the store
    /// fail-closes on an unfiltered query (§4.1).
    pub async fn query(
        &self,
        embedding: &[f32],
        k: usize,
        filter: &Filter,
    ) -> Result<Vec<ScoredDocument>> {
        if filter.is_empty() {
            return Err(VectorStoreError::TenantMissing);
        }
        let state = self.state.read().await;
        let mut scored: Vec<ScoredDocument> = state
            .documents
            .values()
            .filter(|doc| matches_filter(doc, filter))
            .map(|doc| ScoredDocument {
                score: cosine_similarity(embedding, &doc.embedding),
                document: doc.clone(),
            })
            .collect();

        // Cosine desc; ties by descending insertion order, then id asc.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.document.seq.cmp(&a.document.seq))
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    pub async fn delete(&self, ids: &[String], filter: &Filter) -> Result<usize> {
        if filter.is_empty() {
            return Err(VectorStoreError::TenantMissing);
        }
        let mut state = self.state.write().await;
        let mut deleted = 0usize;
        for id in ids {
            let matches = state
                .documents
                .get(id)
                .map(|doc| matches_filter(doc, filter))
                .unwrap_or(false);
            if !matches {
                continue;
            }
            if let Some(index) = state.file_index.remove(id) {
                let path = self.dir.join(document_filename(index));
                let _ = tokio::fs::remove_file(&path).await;
            }
            state.documents.remove(id);
            deleted += 1;
        }
        Ok(deleted)
    }

    pub async fn get(&self, id: &str, filter: &Filter) -> Result<Option<Document>> {
        if filter.is_empty() {
            return Err(VectorStoreError::TenantMissing);
        }
        let state = self.state.read().await;
        Ok(state
            .documents
            .get(id)
            .filter(|doc| matches_filter(doc, filter))
            .cloned())
    }

    pub async fn count(&self, filter: &Filter) -> Result<usize> {
        if filter.is_empty() {
            return Err(VectorStoreError::TenantMissing);
        }
        let state = self.state.read().await;
        Ok(state
            .documents
            .values()
            .filter(|doc| matches_filter(doc, filter))
            .count())
    }

    /// Every document matching `filter`, in ascending insertion order. Used
    /// by callers that enumerate rather than rank (checkpoint listing,
    /// statusline counts) — no cosine scoring involved.
    pub async fn list(&self, filter: &Filter) -> Result<Vec<Document>> {
        if filter.is_empty() {
            return Err(VectorStoreError::TenantMissing);
        }
        let state = self.state.read().await;
        let mut docs: Vec<Document> = state
            .documents
            .values()
            .filter(|doc| matches_filter(doc, filter))
            .cloned()
            .collect();
        docs.sort_by_key(|doc| doc.seq);
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;
    use tempfile::tempdir;

    fn filter(tenant: &str) -> Filter {
        let mut f = Map::new();
        f.insert("tenant_id".to_string(), tenant.to_string());
        f
    }

    #[tokio::test]
    async fn add_then_query_returns_tenant_scoped_results() {
        let dir = tempdir().unwrap();
        let collection = Collection::create(dir.path().join("c"), "c".into(), 3)
            .await
            .unwrap();

        let mut a_meta = Map::new();
        a_meta.insert("tenant_id".to_string(), "a".to_string());
        let mut b_meta = Map::new();
        b_meta.insert("tenant_id".to_string(), "b".to_string());

        collection
            .add(vec![
                Document::new("doc-a", "hello a", vec![1.0, 0.0, 0.0]).with_metadata(a_meta),
                Document::new("doc-b", "hello b", vec![1.0, 0.0, 0.0]).with_metadata(b_meta),
            ])
            .await
            .unwrap();

        let results = collection
            .query(&[1.0, 0.0, 0.0], 10, &filter("a"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "doc-a");

        let empty = collection
            .query(&[1.0, 0.0, 0.0], 10, &filter("b"))
            .await
            .unwrap();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].document.id, "doc-b");
    }

    #[tokio::test]
    async fn query_without_filter_fails_closed() {
        let dir = tempdir().unwrap();
        let collection = Collection::create(dir.path().join("c"), "c".into(), 3)
            .await
            .unwrap();
        let result = collection.query(&[1.0, 0.0, 0.0], 10, &Map::new()).await;
        assert!(matches!(result, Err(VectorStoreError::TenantMissing)));
    }

    #[tokio::test]
    async fn ties_break_by_descending_insertion_then_ascending_id() {
        let dir = tempdir().unwrap();
        let collection = Collection::create(dir.path().join("c"), "c".into(), 2)
            .await
            .unwrap();
        let meta = filter("a");
        let as_map: BTreeMap<String, String> = meta.clone();

        collection
            .add(vec![
                Document::new("z", "same", vec![1.0, 0.0]).with_metadata(as_map.clone()),
                Document::new("a", "same", vec![1.0, 0.0]).with_metadata(as_map.clone()),
            ])
            .await
            .unwrap();

        let results = collection.query(&[1.0, 0.0], 10, &meta).await.unwrap();
        // both score 1.0; "a" inserted after "z" wins the descending-insertion tiebreak
        assert_eq!(results[0].document.id, "a");
        assert_eq!(results[1].document.id, "z");
    }

    #[tokio::test]
    async fn reload_from_disk_preserves_documents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c");
        {
            let collection = Collection::create(path.clone(), "c".into(), 2).await.unwrap();
            collection
                .add(vec![Document::new("a", "x", vec![1.0, 0.0]).with_metadata(filter("a"))])
                .await
                .unwrap();
        }
        let reloaded = Collection::load(path, "c".into()).await.unwrap();
        let count = reloaded.count(&filter("a")).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn list_returns_filtered_documents_in_insertion_order() {
        let dir = tempdir().unwrap();
        let collection = Collection::create(dir.path().join("c"), "c".into(), 2)
            .await
            .unwrap();
        collection
            .add(vec![
                Document::new("z", "x", vec![1.0, 0.0]).with_metadata(filter("a")),
                Document::new("y", "x", vec![0.0, 1.0]).with_metadata(filter("a")),
                Document::new("x", "x", vec![1.0, 1.0]).with_metadata(filter("b")),
            ])
            .await
            .unwrap();

        let listed = collection.list(&filter("a")).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "y"]);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let collection = Collection::create(dir.path().join("c"), "c".into(), 3)
            .await
            .unwrap();
        let result = collection
            .add(vec![Document::new("a", "x", vec![1.0, 0.0])])
            .await;
        assert!(matches!(
            result,
            Err(VectorStoreError::InvalidDimension { expected: 3, actual: 2 })
        ));
    }
}

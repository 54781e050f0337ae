use std::collections::BTreeMap;
use std::sync::Arc;

use contextd_embeddings::EmbeddingProvider;
use contextd_scrubber::scrub_ingest;
use contextd_tenant::TenantInfo;
use contextd_vector_store::{Document, Filter, VectorStore};

use crate::error::{ReasoningBankError, Result};
use crate::id::new_memory_id;
use crate::types::{FeedbackEntry, MemoryRecord, ScoredMemory};

const DELETED_FLAG: &str = "deleted";

/// `Record` / `Search` / `Feedback` / `Consolidate` over a `<tenant>_memories`
/// collection — shared across every project of a tenant, scoped per call by
/// the full tenant triple in the document filter.
pub struct ReasoningBankService {
    pub(crate) store: Arc<VectorStore>,
    pub(crate) embeddings: Arc<dyn EmbeddingProvider>,
}

impl ReasoningBankService {
    pub fn new(store: Arc<VectorStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embeddings }
    }

    pub(crate) fn collection_name(tenant: &TenantInfo) -> String {
        format!("{}_memories", tenant.tenant_id)
    }

    pub(crate) fn tenant_filter(tenant: &TenantInfo) -> Filter {
        tenant
            .as_filter()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    pub(crate) async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embeddings
            .embed(text)
            .await
            .map_err(|err| ReasoningBankError::External(err.to_string()))
    }

    /// Record a new memory. `confidence` is clamped into `[0, 1]`.
    pub async fn record(
        &self,
        tenant: &TenantInfo,
        content: impl Into<String>,
        tags: Vec<String>,
        confidence: f32,
    ) -> Result<MemoryRecord> {
        let content = scrub_ingest(&content.into()).scrubbed_text;
        let embedding = self.embed(&content).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let record = MemoryRecord {
            id: new_memory_id(),
            content,
            tags,
            confidence: confidence.clamp(0.0, 1.0),
            outcomes: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
            consolidated_from: Vec::new(),
            superseded_sources: false,
        };

        self.persist(tenant, &record, embedding).await?;
        Ok(record)
    }

    pub(crate) async fn persist(&self, tenant: &TenantInfo, record: &MemoryRecord, embedding: Vec<f32>) -> Result<()> {
        let mut metadata: BTreeMap<String, String> = Self::tenant_filter(tenant);
        for tag in &record.tags {
            metadata.insert(format!("tag:{tag}"), "true".to_string());
        }
        let content = serde_json::to_string(record)?;
        let doc = Document::new(record.id.clone(), content, embedding).with_metadata(metadata);

        let collection = self
            .store
            .get_or_create_collection(&Self::collection_name(tenant), self.embeddings.dimension())
            .await?;
        collection.add(vec![doc]).await?;
        Ok(())
    }

    /// Soft-delete: replace the stored document with the same content but a
    /// `deleted=true` metadata flag, so [`Self::search`] can filter it out
    /// while still letting an admin inspect it via `list`.
    async fn soft_delete(&self, tenant: &TenantInfo, id: &str) -> Result<()> {
        let filter = Self::tenant_filter(tenant);
        let collection = self
            .store
            .get_or_create_collection(&Self::collection_name(tenant), self.embeddings.dimension())
            .await?;
        let Some(doc) = collection.get(id, &filter).await? else {
            return Ok(());
        };
        collection.delete(&[id.to_string()], &filter).await?;
        let mut metadata = doc.metadata.clone();
        metadata.insert(DELETED_FLAG.to_string(), "true".to_string());
        let replacement = Document::new(id.to_string(), doc.content, doc.embedding).with_metadata(metadata);
        collection.add(vec![replacement]).await?;
        Ok(())
    }

    /// Semantic search over non-deleted memories, optionally narrowed by an
    /// exact tag filter (a record must carry every tag in `tag_filter`).
    pub async fn search(
        &self,
        tenant: &TenantInfo,
        query: &str,
        k: usize,
        tag_filter: &[String],
    ) -> Result<Vec<ScoredMemory>> {
        let embedding = self.embed(query).await?;
        let filter = Self::tenant_filter(tenant);
        let collection = self
            .store
            .get_or_create_collection(&Self::collection_name(tenant), self.embeddings.dimension())
            .await?;

        // Over-fetch since deleted/tag-mismatched candidates get filtered
        // out after scoring.
        let pool_size = (k.saturating_mul(5)).max(k).max(20);
        let scored = collection.query(&embedding, pool_size, &filter).await?;

        let mut results = Vec::with_capacity(k);
        for scored_doc in scored {
            if scored_doc.document.metadata.get(DELETED_FLAG).map(String::as_str) == Some("true") {
                continue;
            }
            let record: MemoryRecord = serde_json::from_str(&scored_doc.document.content)?;
            if !tag_filter.iter().all(|tag| record.tags.iter().any(|t| t == tag)) {
                continue;
            }
            results.push(ScoredMemory {
                record,
                score: scored_doc.score,
            });
            if results.len() == k {
                break;
            }
        }
        Ok(results)
    }

    /// Adjust a memory's confidence by `delta`, clamped into `[0, 1]`. A
    /// positive delta applied to a consolidated record that hasn't yet
    /// superseded its sources soft-deletes them now.
    pub async fn feedback(&self, tenant: &TenantInfo, id: &str, delta: f32) -> Result<MemoryRecord> {
        let filter = Self::tenant_filter(tenant);
        let collection = self
            .store
            .get_or_create_collection(&Self::collection_name(tenant), self.embeddings.dimension())
            .await?;
        let doc = collection
            .get(id, &filter)
            .await?
            .ok_or_else(|| ReasoningBankError::NotFound(id.to_string()))?;
        let mut record: MemoryRecord = serde_json::from_str(&doc.content)?;

        record.confidence = (record.confidence + delta).clamp(0.0, 1.0);
        record.outcomes.push(FeedbackEntry {
            delta,
            applied_at: chrono::Utc::now().to_rfc3339(),
        });
        record.updated_at = chrono::Utc::now().to_rfc3339();

        let should_supersede =
            delta > 0.0 && !record.consolidated_from.is_empty() && !record.superseded_sources;
        if should_supersede {
            record.superseded_sources = true;
        }

        collection.delete(&[id.to_string()], &filter).await?;
        self.persist(tenant, &record, doc.embedding).await?;

        if should_supersede {
            for source_id in record.consolidated_from.clone() {
                self.soft_delete(tenant, &source_id).await?;
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextd_embeddings::StubProvider;
    use tempfile::tempdir;

    async fn service(dir: &std::path::Path) -> ReasoningBankService {
        let store = Arc::new(VectorStore::open(dir).await.unwrap());
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(StubProvider::new(8));
        ReasoningBankService::new(store, embeddings)
    }

    fn tenant() -> TenantInfo {
        TenantInfo::new("acme", "proj").unwrap()
    }

    #[tokio::test]
    async fn record_then_search_finds_it() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        service
            .record(&tenant(), "Always cache DB results", vec!["database".to_string()], 0.8)
            .await
            .unwrap();

        let results = service
            .search(&tenant(), "Always cache DB results", 5, &[])
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.content, "Always cache DB results");
    }

    #[tokio::test]
    async fn search_respects_tag_filter() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        service
            .record(&tenant(), "Use Redis for caching", vec!["cache".to_string()], 0.7)
            .await
            .unwrap();
        service
            .record(&tenant(), "Use Redis for caching", vec!["database".to_string()], 0.7)
            .await
            .unwrap();

        let results = service
            .search(&tenant(), "Use Redis for caching", 10, &["cache".to_string()])
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].record.tags.contains(&"cache".to_string()));
    }

    #[tokio::test]
    async fn feedback_clamps_confidence_into_unit_range() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let record = service.record(&tenant(), "content", vec![], 0.9).await.unwrap();

        let updated = service.feedback(&tenant(), &record.id, 0.5).await.unwrap();
        assert_eq!(updated.confidence, 1.0);

        let updated = service.feedback(&tenant(), &record.id, -5.0).await.unwrap();
        assert_eq!(updated.confidence, 0.0);
        assert_eq!(updated.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn positive_feedback_on_consolidated_record_supersedes_sources() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let source_a = service.record(&tenant(), "cache with redis", vec![], 0.6).await.unwrap();
        let source_b = service.record(&tenant(), "cache using redis", vec![], 0.6).await.unwrap();

        let mut consolidated = MemoryRecord {
            id: new_memory_id(),
            content: "Cache with Redis".to_string(),
            tags: vec![],
            confidence: 0.6,
            outcomes: vec![],
            created_at: chrono::Utc::now().to_rfc3339(),
            updated_at: chrono::Utc::now().to_rfc3339(),
            consolidated_from: vec![source_a.id.clone(), source_b.id.clone()],
            superseded_sources: false,
        };
        let embedding = service.embed(&consolidated.content).await.unwrap();
        service.persist(&tenant(), &consolidated, embedding).await.unwrap();

        let updated = service.feedback(&tenant(), &consolidated.id, 0.1).await.unwrap();
        assert!(updated.superseded_sources);

        let results = service
            .search(&tenant(), "cache with redis", 10, &[])
            .await
            .unwrap();
        assert!(!results.iter().any(|r| r.record.id == source_a.id));
        assert!(!results.iter().any(|r| r.record.id == source_b.id));
        consolidated.confidence = updated.confidence;
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use contextd_embeddings::EmbeddingProvider;
use contextd_tenant::TenantInfo;
use contextd_vector_store::{Document, Filter, VectorStore};

use crate::error::{RemediationError, Result};
use crate::id::new_remediation_id;
use crate::types::{RemediationRecord, RemediationStatus, ScoredRemediation};

/// A smaller twin of the reasoning bank: `{problem, fix, status}` triples
/// over a `<tenant>_remediations` collection, searched semantically over
/// the problem description with an optional exact-tag narrowing.
pub struct RemediationService {
    store: Arc<VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl RemediationService {
    pub fn new(store: Arc<VectorStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embeddings }
    }

    fn collection_name(tenant: &TenantInfo) -> String {
        format!("{}_remediations", tenant.tenant_id)
    }

    fn tenant_filter(tenant: &TenantInfo) -> Filter {
        tenant
            .as_filter()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embeddings
            .embed(text)
            .await
            .map_err(|err| RemediationError::External(err.to_string()))
    }

    async fn persist(&self, tenant: &TenantInfo, record: &RemediationRecord) -> Result<()> {
        let embedding = self.embed(&record.problem).await?;
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

    /// Open a new remediation for `problem`. Status starts at `Open`.
    pub async fn record(
        &self,
        tenant: &TenantInfo,
        problem: impl Into<String>,
        tags: Vec<String>,
        identifier: Option<String>,
    ) -> Result<RemediationRecord> {
        let now = chrono::Utc::now().to_rfc3339();
        let record = RemediationRecord {
            id: new_remediation_id(),
            problem: problem.into(),
            fix: None,
            status: RemediationStatus::Open,
            tags,
            identifier,
            created_at: now.clone(),
            updated_at: now,
        };
        self.persist(tenant, &record).await?;
        Ok(record)
    }

    /// Move `id` to `new_status`, optionally attaching/overwriting `fix`
    /// text. Rejects a transition that would move the status backward.
    pub async fn update_status(
        &self,
        tenant: &TenantInfo,
        id: &str,
        new_status: RemediationStatus,
        fix: Option<String>,
    ) -> Result<RemediationRecord> {
        let filter = Self::tenant_filter(tenant);
        let collection = self
            .store
            .get_or_create_collection(&Self::collection_name(tenant), self.embeddings.dimension())
            .await?;
        let doc = collection
            .get(id, &filter)
            .await?
            .ok_or_else(|| RemediationError::NotFound(id.to_string()))?;
        let mut record: RemediationRecord = serde_json::from_str(&doc.content)?;

        if !record.status.can_transition_to(new_status) {
            return Err(RemediationError::Validation(format!(
                "cannot move remediation '{id}' from {:?} back to {:?}",
                record.status, new_status
            )));
        }

        record.status = new_status;
        if let Some(fix) = fix {
            record.fix = Some(fix);
        }
        record.updated_at = chrono::Utc::now().to_rfc3339();

        collection.delete(&[id.to_string()], &filter).await?;
        self.persist(tenant, &record).await?;
        Ok(record)
    }

    /// Hybrid search: semantic similarity over the problem description,
    /// narrowed by an exact tag filter (a record must carry every tag).
    pub async fn search(
        &self,
        tenant: &TenantInfo,
        query: &str,
        k: usize,
        tag_filter: &[String],
    ) -> Result<Vec<ScoredRemediation>> {
        let embedding = self.embed(query).await?;
        let filter = Self::tenant_filter(tenant);
        let collection = self
            .store
            .get_or_create_collection(&Self::collection_name(tenant), self.embeddings.dimension())
            .await?;

        let pool_size = (k.saturating_mul(5)).max(k).max(20);
        let scored = collection.query(&embedding, pool_size, &filter).await?;

        let mut results = Vec::with_capacity(k);
        for scored_doc in scored {
            let record: RemediationRecord = serde_json::from_str(&scored_doc.document.content)?;
            if !tag_filter.iter().all(|tag| record.tags.iter().any(|t| t == tag)) {
                continue;
            }
            results.push(ScoredRemediation {
                record,
                score: scored_doc.score,
            });
            if results.len() == k {
                break;
            }
        }
        Ok(results)
    }
}

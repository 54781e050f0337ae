use std::collections::BTreeMap;
use std::sync::Arc;

use contextd_embeddings::EmbeddingProvider;
use contextd_tenant::TenantInfo;
use contextd_vector_store::{Document, Filter, VectorStore};

use crate::error::{CheckpointError, Result};
use crate::id::new_checkpoint_id;
use crate::types::{
    CheckpointRecord, ListCheckpointsQuery, ResumeLevel, ResumedCheckpoint, SaveCheckpointInput,
};

const CHECKPOINTS_COLLECTION: &str = "checkpoints";
const FULL_STATE_COLLECTION: &str = "checkpoints_full_state";

/// Save / List / Resume over the `checkpoints` collection, with `full_state`
/// lazily persisted in a sibling collection so summary/context-only resumes
/// never pay to load it.
pub struct CheckpointService {
    store: Arc<VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl CheckpointService {
    pub fn new(store: Arc<VectorStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embeddings }
    }

    /// Generate a time-sortable id, embed `name + summary + description` for
    /// later semantic search, and persist the record. `full_state` (if any)
    /// is written to a separate collection keyed by the same id.
    ///
    /// An auto-created save whose embedding call fails is retried once; if
    /// it still fails it is logged and dropped (`Ok(None)`) rather than
    /// propagated, since it was never user-requested. A non-auto-created
    /// save propagates the embedding failure as an error.
    pub async fn save(&self, input: SaveCheckpointInput) -> Result<Option<CheckpointRecord>> {
        let embed_text = format!(
            "{} {} {}",
            input.name,
            input.summary.as_deref().unwrap_or(""),
            input.description.as_deref().unwrap_or("")
        );
        let embed_text = embed_text.trim();

        let embedding = match self.embed_for_save(embed_text, input.auto_created).await? {
            Some(embedding) => embedding,
            None => return Ok(None),
        };

        let id = new_checkpoint_id();
        let created_at = chrono::Utc::now().to_rfc3339();

        let mut metadata: BTreeMap<String, String> = input
            .tenant
            .as_filter()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        if let Some(session_id) = &input.session_id {
            metadata.insert("session_id".to_string(), session_id.clone());
        }

        let record = CheckpointRecord {
            id: id.clone(),
            session_id: input.session_id.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            summary: input.summary.clone(),
            context: input.context.clone(),
            has_full_state: input.full_state.is_some(),
            token_count: input.token_count,
            auto_created: input.auto_created,
            created_at,
            metadata: input.metadata.clone(),
        };

        let content = serde_json::to_string(&record)?;
        let doc = Document::new(id.clone(), content, embedding).with_metadata(metadata.clone());

        let collection = self
            .store
            .get_or_create_collection(CHECKPOINTS_COLLECTION, self.embeddings.dimension())
            .await?;
        collection.add(vec![doc]).await?;

        if let Some(full_state) = &input.full_state {
            let dimension = self.embeddings.dimension();
            let full_state_doc = Document::new(id, full_state.clone(), vec![0.0; dimension])
                .with_metadata(metadata);
            let full_state_collection = self
                .store
                .get_or_create_collection(FULL_STATE_COLLECTION, dimension)
                .await?;
            full_state_collection.add(vec![full_state_doc]).await?;
        }

        Ok(Some(record))
    }

    async fn embed_for_save(&self, text: &str, auto_created: bool) -> Result<Option<Vec<f32>>> {
        match self.embeddings.embed(text).await {
            Ok(embedding) => Ok(Some(embedding)),
            Err(err) if auto_created => {
                log::warn!("auto-checkpoint embedding failed, retrying once: {err}");
                match self.embeddings.embed(text).await {
                    Ok(embedding) => Ok(Some(embedding)),
                    Err(err) => {
                        log::error!(
                            "auto-checkpoint embedding failed twice, dropping save: {err}"
                        );
                        Ok(None)
                    }
                }
            }
            Err(err) => Err(CheckpointError::External(err.to_string())),
        }
    }

    /// All checkpoints visible to `tenant` matching `query`, newest-first by
    /// `created_at` (ties broken by descending id — ids are ULIDs, so a
    /// later id means a later timestamp at equal `created_at` resolution),
    /// capped at `query.limit`.
    pub async fn list(
        &self,
        tenant: &TenantInfo,
        query: &ListCheckpointsQuery,
    ) -> Result<Vec<CheckpointRecord>> {
        let mut filter = tenant_filter(tenant);
        if let Some(session_id) = &query.session_id {
            filter.insert("session_id".to_string(), session_id.clone());
        }

        let collection = self
            .store
            .get_or_create_collection(CHECKPOINTS_COLLECTION, self.embeddings.dimension())
            .await?;
        let docs = collection.list(&filter).await?;
        let mut records: Vec<CheckpointRecord> = docs
            .into_iter()
            .map(|doc| {
                serde_json::from_str::<CheckpointRecord>(&doc.content).map_err(CheckpointError::from)
            })
            .collect::<Result<Vec<_>>>()?;
        if query.auto_only {
            records.retain(|record| record.auto_created);
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        records.truncate(query.limit);
        Ok(records)
    }

    /// Resume checkpoint `id` at `level`. A missing checkpoint, or one that
    /// belongs to a different tenant, is `NotFound` either way — existence
    /// is never disclosed across tenants.
    pub async fn resume(
        &self,
        tenant: &TenantInfo,
        id: &str,
        level: ResumeLevel,
    ) -> Result<ResumedCheckpoint> {
        let filter = tenant_filter(tenant);
        let collection = self
            .store
            .get_or_create_collection(CHECKPOINTS_COLLECTION, self.embeddings.dimension())
            .await?;
        let doc = collection
            .get(id, &filter)
            .await?
            .ok_or_else(|| CheckpointError::NotFound(id.to_string()))?;
        let record: CheckpointRecord = serde_json::from_str(&doc.content)?;

        let context = match level {
            ResumeLevel::Summary => None,
            ResumeLevel::Context | ResumeLevel::Full => record.context.clone(),
        };

        let full_state = match level {
            ResumeLevel::Summary | ResumeLevel::Context => None,
            ResumeLevel::Full => {
                if record.has_full_state {
                    let full_state_collection = self
                        .store
                        .get_or_create_collection(FULL_STATE_COLLECTION, self.embeddings.dimension())
                        .await?;
                    let full_state_doc = full_state_collection
                        .get(id, &filter)
                        .await?
                        .ok_or_else(|| {
                            CheckpointError::NotFound(format!(
                                "full_state for checkpoint '{id}' is recorded but missing"
                            ))
                        })?;
                    Some(full_state_doc.content)
                } else {
                    None
                }
            }
        };

        Ok(ResumedCheckpoint {
            id: record.id,
            session_id: record.session_id,
            name: record.name,
            description: record.description,
            summary: record.summary,
            context,
            full_state,
            token_count: record.token_count,
            auto_created: record.auto_created,
            created_at: record.created_at,
            metadata: record.metadata,
        })
    }
}

fn tenant_filter(tenant: &TenantInfo) -> Filter {
    tenant
        .as_filter()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextd_embeddings::StubProvider;
    use tempfile::tempdir;

    async fn service(dir: &std::path::Path) -> CheckpointService {
        let store = Arc::new(VectorStore::open(dir).await.unwrap());
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(StubProvider::new(8));
        CheckpointService::new(store, embeddings)
    }

    fn tenant() -> TenantInfo {
        TenantInfo::new("acme", "proj").unwrap()
    }

    #[tokio::test]
    async fn save_then_resume_tiers_reveal_increasing_detail() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let mut input = SaveCheckpointInput::new(tenant(), "feat-x");
        input.summary = Some("OAuth done".to_string());
        input.context = Some("long context blob".to_string());
        input.full_state = Some("huge full state blob".to_string());
        input.token_count = 12_345;

        let saved = service.save(input).await.unwrap().unwrap();

        let summary = service
            .resume(&tenant(), &saved.id, ResumeLevel::Summary)
            .await
            .unwrap();
        assert_eq!(summary.summary.as_deref(), Some("OAuth done"));
        assert!(summary.context.is_none());
        assert!(summary.full_state.is_none());

        let context = service
            .resume(&tenant(), &saved.id, ResumeLevel::Context)
            .await
            .unwrap();
        assert!(context.context.is_some());
        assert!(context.full_state.is_none());

        let full = service
            .resume(&tenant(), &saved.id, ResumeLevel::Full)
            .await
            .unwrap();
        assert_eq!(full.full_state.as_deref(), Some("huge full state blob"));
        assert_eq!(full.token_count, 12_345);
    }

    #[tokio::test]
    async fn resume_missing_checkpoint_is_not_found() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let result = service
            .resume(&tenant(), "ckpt_doesnotexist", ResumeLevel::Summary)
            .await;
        assert!(matches!(result, Err(CheckpointError::NotFound(_))));
    }

    #[tokio::test]
    async fn resume_across_tenants_is_not_found_not_forbidden() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let saved = service
            .save(SaveCheckpointInput::new(tenant(), "feat-x"))
            .await
            .unwrap()
            .unwrap();

        let other_tenant = TenantInfo::new("other", "proj").unwrap();
        let result = service
            .resume(&other_tenant, &saved.id, ResumeLevel::Summary)
            .await;
        assert!(matches!(result, Err(CheckpointError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_is_scoped_to_tenant_and_session() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let mut first = SaveCheckpointInput::new(tenant(), "first");
        first.session_id = Some("s1".to_string());
        let mut second = SaveCheckpointInput::new(tenant(), "second");
        second.session_id = Some("s2".to_string());
        service.save(first).await.unwrap();
        service.save(second).await.unwrap();

        let all = service
            .list(&tenant(), &ListCheckpointsQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let scoped = service
            .list(
                &tenant(),
                &ListCheckpointsQuery {
                    session_id: Some("s1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].name, "first");
    }

    #[tokio::test]
    async fn list_auto_only_filters_to_auto_created_checkpoints() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let manual = SaveCheckpointInput::new(tenant(), "manual");
        let mut auto = SaveCheckpointInput::new(tenant(), "auto");
        auto.auto_created = true;
        service.save(manual).await.unwrap();
        service.save(auto).await.unwrap();

        let auto_only = service
            .list(
                &tenant(),
                &ListCheckpointsQuery {
                    auto_only: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(auto_only.len(), 1);
        assert_eq!(auto_only[0].name, "auto");
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        for name in ["a", "b", "c"] {
            service
                .save(SaveCheckpointInput::new(tenant(), name))
                .await
                .unwrap();
        }
        let limited = service
            .list(
                &tenant(),
                &ListCheckpointsQuery {
                    limit: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn sequential_checkpoints_in_a_session_list_newest_first() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        for name in ["a", "b", "c"] {
            let mut input = SaveCheckpointInput::new(tenant(), name);
            input.session_id = Some("s1".to_string());
            service.save(input).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let listed = service
            .list(
                &tenant(),
                &ListCheckpointsQuery {
                    session_id: Some("s1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let names: Vec<&str> = listed.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use contextd_embeddings::EmbeddingProvider;
use contextd_scrubber::scrub_ingest;
use contextd_tenant::TenantInfo;
use contextd_vector_store::{Document, VectorStore};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::decision::{
    default_patterns, detect_candidates, truncate_code_points, Decision, DecisionCandidate,
    DecisionDetectorConfig, DecisionPattern,
};
use crate::error::{ConversationError, Result};
use crate::message::{parse_jsonl, CommitReference, FileReference, RawMessage};
use crate::summarizer::{NoneSummarizer, Summarizer};
use crate::tags::extract_tags;

/// Document kinds multiplexed into one collection via the `doc_type`
/// metadata field, so `conversation_search` can query across all of them
/// with a single tenant-scoped filter.
pub const DOC_TYPE_MESSAGE: &str = "message";
pub const DOC_TYPE_DECISION: &str = "decision";
pub const DOC_TYPE_FILE_REF: &str = "file_reference";
pub const DOC_TYPE_COMMIT_REF: &str = "commit_reference";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub messages_ingested: usize,
    pub decisions_detected: usize,
    pub decisions_refined: usize,
    pub file_references_recorded: usize,
    pub commit_references_recorded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDecision {
    session_id: String,
    message_uuid: String,
    pattern_matched: String,
    decision: Decision,
}

/// Ties the pipeline of §4.4 together: parse -> ingest-scrub -> heuristic
/// decision detection -> optional LLM refinement -> tag extraction ->
/// embed -> persist, one collection per `(tenant, project)`.
pub struct ConversationIngestService {
    store: Arc<VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    summarizer: Arc<dyn Summarizer>,
    patterns: Vec<DecisionPattern>,
    detector_config: DecisionDetectorConfig,
}

impl ConversationIngestService {
    pub fn new(store: Arc<VectorStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            embeddings,
            summarizer: Arc::new(NoneSummarizer),
            patterns: default_patterns(),
            detector_config: DecisionDetectorConfig::default(),
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_detector_config(mut self, config: DecisionDetectorConfig) -> Self {
        self.detector_config = config;
        self
    }

    fn collection_name(tenant: &TenantInfo) -> String {
        format!("{}_conversations", tenant.collection_suffix())
    }

    fn base_metadata(tenant: &TenantInfo, doc_type: &str) -> BTreeMap<String, String> {
        let mut metadata: BTreeMap<String, String> = tenant
            .as_filter()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        metadata.insert("doc_type".to_string(), doc_type.to_string());
        metadata
    }

    /// Ingest one JSONL transcript for `tenant`. Every stored content field
    /// is scrubbed before it is embedded or persisted.
    pub async fn ingest(
        &self,
        tenant: &TenantInfo,
        transcript: &str,
        cancellation: &CancellationToken,
    ) -> Result<IngestReport> {
        let parsed = parse_jsonl(transcript)?;
        let scrubbed_messages: Vec<RawMessage> = parsed
            .messages
            .iter()
            .map(|message| {
                let mut scrubbed = message.clone();
                scrubbed.content = scrub_ingest(&message.content).scrubbed_text;
                scrubbed
            })
            .collect();

        let dimension = self.embeddings.dimension();
        let collection = self
            .store
            .get_or_create_collection(&Self::collection_name(tenant), dimension)
            .await?;

        let mut report = IngestReport::default();

        if !scrubbed_messages.is_empty() {
            let texts: Vec<String> = scrubbed_messages.iter().map(|m| m.content.clone()).collect();
            let embeddings = self
                .embeddings
                .embed_batch(&texts)
                .await
                .map_err(|err| ConversationError::External(err.to_string()))?;
            let mut docs = Vec::with_capacity(scrubbed_messages.len());
            for (message, embedding) in scrubbed_messages.iter().zip(embeddings) {
                let mut metadata = Self::base_metadata(tenant, DOC_TYPE_MESSAGE);
                metadata.insert("session_id".to_string(), message.session_id.clone());
                let content = serde_json::to_string(message)?;
                docs.push(Document::new(message.uuid.clone(), content, embedding).with_metadata(metadata));
            }
            report.messages_ingested = docs.len();
            collection.add(docs).await?;
        }

        let candidates = detect_candidates(&scrubbed_messages, &self.patterns, &self.detector_config);
        report.decisions_detected = candidates.len();

        for candidate in &candidates {
            let decision = self.refine(candidate, cancellation).await?;
            if decision.confidence > 0.0 {
                report.decisions_refined += 1;
            }

            let mut tags = extract_tags(&candidate.content);
            tags.extend(decision.tags.clone());
            tags.sort();
            tags.dedup();

            let stored = StoredDecision {
                session_id: candidate.session_id.clone(),
                message_uuid: candidate.message_uuid.clone(),
                pattern_matched: candidate.pattern_matched.clone(),
                decision: Decision {
                    tags,
                    ..decision
                },
            };

            let embedding = self
                .embeddings
                .embed(&stored.decision.summary)
                .await
                .map_err(|err| ConversationError::External(err.to_string()))?;
            let mut metadata = Self::base_metadata(tenant, DOC_TYPE_DECISION);
            metadata.insert("session_id".to_string(), candidate.session_id.clone());
            let content = serde_json::to_string(&stored)?;
            let doc = Document::new(
                format!("decision-{}", candidate.message_uuid),
                content,
                embedding,
            )
            .with_metadata(metadata);
            collection.add(vec![doc]).await?;
        }

        self.record_file_references(&collection, tenant, &parsed.file_references, &mut report)
            .await?;
        self.record_commit_references(&collection, tenant, &parsed.commit_references, &mut report)
            .await?;

        Ok(report)
    }

    async fn refine(
        &self,
        candidate: &DecisionCandidate,
        cancellation: &CancellationToken,
    ) -> Result<Decision> {
        if !candidate.needs_refine {
            return Ok(Decision {
                summary: truncate_code_points(&candidate.content, 200),
                reasoning: None,
                alternatives: Vec::new(),
                tags: Vec::new(),
                confidence: candidate.confidence,
            });
        }
        self.summarizer.summarize(candidate, cancellation).await
    }

    /// File references are embedded on their path text (not a zero vector)
    /// so `repository_search` can find them semantically — unlike commit
    /// references, which nothing queries by similarity.
    async fn record_file_references(
        &self,
        collection: &contextd_vector_store::Collection,
        tenant: &TenantInfo,
        references: &[FileReference],
        report: &mut IngestReport,
    ) -> Result<()> {
        if references.is_empty() {
            return Ok(());
        }
        let paths: Vec<String> = references.iter().map(|r| r.path.clone()).collect();
        let path_embeddings = self
            .embeddings
            .embed_batch(&paths)
            .await
            .map_err(|err| ConversationError::External(err.to_string()))?;
        let mut docs = Vec::with_capacity(references.len());
        for (index, (reference, embedding)) in references.iter().zip(path_embeddings).enumerate() {
            let mut metadata = Self::base_metadata(tenant, DOC_TYPE_FILE_REF);
            metadata.insert("session_id".to_string(), reference.session_id.clone());
            metadata.insert("path".to_string(), reference.path.clone());
            let content = serde_json::to_string(reference)?;
            docs.push(
                Document::new(
                    format!("fileref-{}-{index}", reference.message_uuid),
                    content,
                    embedding,
                )
                .with_metadata(metadata),
            );
        }
        report.file_references_recorded = docs.len();
        collection.add(docs).await?;
        Ok(())
    }

    async fn record_commit_references(
        &self,
        collection: &contextd_vector_store::Collection,
        tenant: &TenantInfo,
        references: &[CommitReference],
        report: &mut IngestReport,
    ) -> Result<()> {
        if references.is_empty() {
            return Ok(());
        }
        let dimension = self.embeddings.dimension();
        let mut docs = Vec::with_capacity(references.len());
        for (index, reference) in references.iter().enumerate() {
            let mut metadata = Self::base_metadata(tenant, DOC_TYPE_COMMIT_REF);
            metadata.insert("session_id".to_string(), reference.session_id.clone());
            metadata.insert("sha".to_string(), reference.sha.clone());
            let content = serde_json::to_string(reference)?;
            docs.push(
                Document::new(
                    format!("commitref-{}-{index}", reference.message_uuid),
                    content,
                    vec![0.0; dimension],
                )
                .with_metadata(metadata),
            );
        }
        report.commit_references_recorded = docs.len();
        collection.add(docs).await?;
        Ok(())
    }

    /// Semantic search over the tenant's conversation collection, narrowed
    /// to `doc_types` (empty = no narrowing). Backs both `conversation_search`
    /// (messages + decisions) and `repository_search` (file references) — the
    /// two tools differ only in which `doc_type`s they pass.
    pub async fn search(
        &self,
        tenant: &TenantInfo,
        query: &str,
        k: usize,
        doc_types: &[&str],
    ) -> Result<Vec<ScoredConversationEntry>> {
        let embedding = self
            .embeddings
            .embed(query)
            .await
            .map_err(|err| ConversationError::External(err.to_string()))?;
        let filter: BTreeMap<String, String> = tenant
            .as_filter()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let collection = self
            .store
            .get_or_create_collection(&Self::collection_name(tenant), self.embeddings.dimension())
            .await?;

        let pool_size = (k.saturating_mul(5)).max(k).max(20);
        let scored = collection.query(&embedding, pool_size, &filter).await?;

        let mut results = Vec::with_capacity(k);
        for scored_doc in scored {
            let doc_type = scored_doc
                .document
                .metadata
                .get("doc_type")
                .cloned()
                .unwrap_or_default();
            if !doc_types.is_empty() && !doc_types.contains(&doc_type.as_str()) {
                continue;
            }
            results.push(ScoredConversationEntry {
                doc_type,
                id: scored_doc.document.id,
                content: scored_doc.document.content,
                score: scored_doc.score,
                metadata: scored_doc.document.metadata,
            });
            if results.len() == k {
                break;
            }
        }
        Ok(results)
    }
}

/// One hit from [`ConversationIngestService::search`]: the raw stored JSON
/// (`content`) plus enough metadata for a caller to know what it is without
/// re-parsing every possible doc shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredConversationEntry {
    pub doc_type: String,
    pub id: String,
    pub content: String,
    pub score: f32,
    pub metadata: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextd_embeddings::StubProvider;
    use tempfile::tempdir;

    async fn service(dir: &std::path::Path) -> ConversationIngestService {
        let store = Arc::new(VectorStore::open(dir).await.unwrap());
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(StubProvider::new(8));
        ConversationIngestService::new(store, embeddings)
    }

    fn tenant() -> TenantInfo {
        TenantInfo::new("acme", "proj").unwrap()
    }

    #[tokio::test]
    async fn ingests_messages_and_detects_one_decision() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let transcript = "{\"session_id\":\"s1\",\"uuid\":\"u1\",\"role\":\"user\",\"content\":\"How to cache?\",\"timestamp\":\"2026-01-01T00:00:00Z\"}\n\
             {\"session_id\":\"s1\",\"uuid\":\"u2\",\"role\":\"assistant\",\"content\":\"Let's use Redis since it's in our stack.\",\"timestamp\":\"2026-01-01T00:00:01Z\"}\n";

        let report = service
            .ingest(&tenant(), transcript, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.messages_ingested, 2);
        assert_eq!(report.decisions_detected, 1);
        assert_eq!(report.decisions_refined, 0);
    }

    #[tokio::test]
    async fn scrubs_secrets_before_storage() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let transcript = "{\"session_id\":\"s1\",\"uuid\":\"u1\",\"role\":\"user\",\"content\":\"OPENAI_API_KEY=sk-abcdefghijklmnopqrstuvwxyz0123\",\"timestamp\":\"2026-01-01T00:00:00Z\"}\n";

        service
            .ingest(&tenant(), transcript, &CancellationToken::new())
            .await
            .unwrap();

        let collection = service
            .store
            .get_or_create_collection("acme_proj_conversations", 8)
            .await
            .unwrap();
        let filter: contextd_vector_store::Filter = tenant()
            .as_filter()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let docs = collection.list(&filter).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(!docs[0].content.contains("sk-abcdefghij"));
    }

    #[tokio::test]
    async fn file_and_commit_references_are_recorded() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let transcript = "{\"session_id\":\"s1\",\"uuid\":\"u1\",\"role\":\"tool\",\"content\":\"edited\",\"timestamp\":\"t\",\"tool_calls\":[{\"name\":\"edit\",\"file_path\":\"src/lib.rs\",\"operation\":\"write\"},{\"name\":\"commit\",\"commit_sha\":\"deadbeef\"}]}\n";

        let report = service
            .ingest(&tenant(), transcript, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.file_references_recorded, 1);
        assert_eq!(report.commit_references_recorded, 1);
    }

    #[tokio::test]
    async fn search_narrows_by_doc_type() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;
        let transcript = "{\"session_id\":\"s1\",\"uuid\":\"u1\",\"role\":\"user\",\"content\":\"How to cache?\",\"timestamp\":\"2026-01-01T00:00:00Z\"}\n\
             {\"session_id\":\"s1\",\"uuid\":\"u2\",\"role\":\"tool\",\"content\":\"edited\",\"timestamp\":\"t\",\"tool_calls\":[{\"name\":\"edit\",\"file_path\":\"src/cache.rs\",\"operation\":\"write\"}]}\n";
        service
            .ingest(&tenant(), transcript, &CancellationToken::new())
            .await
            .unwrap();

        let messages = service
            .search(&tenant(), "cache", 10, &[DOC_TYPE_MESSAGE])
            .await
            .unwrap();
        assert!(messages.iter().all(|entry| entry.doc_type == DOC_TYPE_MESSAGE));
        assert!(!messages.is_empty());

        let file_refs = service
            .search(&tenant(), "cache.rs", 10, &[DOC_TYPE_FILE_REF])
            .await
            .unwrap();
        assert!(file_refs.iter().all(|entry| entry.doc_type == DOC_TYPE_FILE_REF));
        assert!(!file_refs.is_empty());
    }
}

use contextd_embeddings::cosine_similarity;
use contextd_tenant::TenantInfo;

use crate::id::new_memory_id;
use crate::llm_client::LLMClient;
use crate::service::ReasoningBankService;
use crate::types::MemoryRecord;

/// Default similarity above which two memories are considered
/// near-duplicates worth consolidating.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.92;

fn build_prompt(cluster: &[MemoryRecord]) -> String {
    let mut prompt = String::from(
        "The following memories describe the same underlying lesson. \
         Synthesize them into one concise memory that preserves every \
         distinct detail. Respond with the merged memory text only.\n\n",
    );
    for record in cluster {
        prompt.push_str("- ");
        prompt.push_str(&record.content);
        prompt.push('\n');
    }
    prompt
}

impl ReasoningBankService {
    /// Cluster near-duplicate memories (by embedding similarity above
    /// `similarity_threshold`) and ask `llm` to synthesize a merged record
    /// per cluster. Sources are retained, unconsolidated, until the new
    /// record receives positive [`Self::feedback`].
    pub async fn consolidate(
        &self,
        tenant: &TenantInfo,
        llm: &dyn LLMClient,
        similarity_threshold: f32,
    ) -> crate::error::Result<Vec<MemoryRecord>> {
        let filter = Self::tenant_filter(tenant);
        let collection = self
            .store
            .get_or_create_collection(&Self::collection_name(tenant), self.embeddings.dimension())
            .await?;
        let docs = collection.list(&filter).await?;

        let mut candidates = Vec::new();
        for doc in docs {
            if doc.metadata.get("deleted").map(String::as_str) == Some("true") {
                continue;
            }
            let record: MemoryRecord = serde_json::from_str(&doc.content)?;
            if !record.consolidated_from.is_empty() {
                continue;
            }
            candidates.push((record, doc.embedding));
        }

        let mut clustered = vec![false; candidates.len()];
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for i in 0..candidates.len() {
            if clustered[i] {
                continue;
            }
            let mut cluster = vec![i];
            clustered[i] = true;
            for j in (i + 1)..candidates.len() {
                if clustered[j] {
                    continue;
                }
                if cosine_similarity(&candidates[i].1, &candidates[j].1) >= similarity_threshold {
                    cluster.push(j);
                    clustered[j] = true;
                }
            }
            if cluster.len() > 1 {
                clusters.push(cluster);
            }
        }

        let mut consolidated_records = Vec::with_capacity(clusters.len());
        for cluster_indices in clusters {
            let cluster: Vec<MemoryRecord> = cluster_indices
                .iter()
                .map(|&idx| candidates[idx].0.clone())
                .collect();

            let merged_content = llm.complete(&build_prompt(&cluster)).await?;
            let merged_content = merged_content.trim().to_string();

            let confidence = cluster.iter().map(|r| r.confidence).sum::<f32>() / cluster.len() as f32;
            let mut tags: Vec<String> = cluster.iter().flat_map(|r| r.tags.clone()).collect();
            tags.sort();
            tags.dedup();

            let now = chrono::Utc::now().to_rfc3339();
            let record = MemoryRecord {
                id: new_memory_id(),
                content: merged_content,
                tags,
                confidence,
                outcomes: Vec::new(),
                created_at: now.clone(),
                updated_at: now,
                consolidated_from: cluster.iter().map(|r| r.id.clone()).collect(),
                superseded_sources: false,
            };

            let embedding = self.embed(&record.content).await?;
            self.persist(tenant, &record, embedding).await?;
            consolidated_records.push(record);
        }

        Ok(consolidated_records)
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub delta: f32,
    pub applied_at: String,
}

/// `{ id, tenant_triple, content, tags, confidence, outcomes, created_at,
/// updated_at }` of spec §3/§4.6 — a self-describing unit of learned
/// knowledge, retrievable by semantic query plus tag filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub confidence: f32,
    pub outcomes: Vec<FeedbackEntry>,
    pub created_at: String,
    pub updated_at: String,
    /// Ids of the memories this record was synthesized from. Empty for an
    /// ordinary, directly recorded memory.
    #[serde(default)]
    pub consolidated_from: Vec<String>,
    /// Set once this record's originals have been soft-deleted — only ever
    /// true on a consolidated record.
    #[serde(default)]
    pub superseded_sources: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    pub score: f32,
}

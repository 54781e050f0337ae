use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Equality filter applied to a document's metadata map. Every query and
/// delete call carries one; an empty filter is refused (§4.1 fail-closed).
pub type Filter = BTreeMap<String, String>;

/// `{ id, content, metadata, embedding }` of spec §3. Documents are
/// immutable once embedded — an "update" is delete + insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub embedding: Vec<f32>,
    /// Monotonically increasing insertion sequence, assigned by the
    /// collection on add. Used only to break cosine-similarity ties by
    /// descending insertion order (§4.1).
    #[serde(default)]
    pub seq: u64,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: BTreeMap::new(),
            embedding,
            seq: 0,
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

pub(crate) fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    filter.iter().all(|(k, v)| doc.metadata.get(k) == Some(v))
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

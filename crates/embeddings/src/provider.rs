use crate::error::Result;
use async_trait::async_trait;

/// Upper bound on how many texts a single `embed_batch` call embeds in one
/// provider round-trip (§5: "batch size is bounded (default 100)").
pub const MAX_BATCH_SIZE: usize = 100;

/// A pluggable text -> vector embedding backend.
///
/// Exactly one instance lives per process (§5 "single instance, internally
/// thread-safe"); every collection negotiates its dimension against this
/// provider at startup and a mismatch is a fatal config error (§3).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Fixed output dimension for every vector this provider returns.
    fn dimension(&self) -> usize;

    /// A stable identifier for the active model, used in diagnostics and
    /// persisted alongside a collection's metadata.
    fn model_id(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        Ok(batch.pop().unwrap_or_default())
    }

    /// Embed `texts`, internally chunking at [`MAX_BATCH_SIZE`] when the
    /// provider doesn't do so itself.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
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

pub(crate) fn l2_normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

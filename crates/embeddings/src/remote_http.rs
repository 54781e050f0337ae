use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, MAX_BATCH_SIZE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote embedding provider: a plain JSON-over-HTTP backend, for
/// deployments that don't want to carry the local ONNX runtime (§4.1: "the
/// on-disk layout is only normative for the local backend").
pub struct RemoteHttpProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model_id: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbedRequestBody<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponseBody {
    embeddings: Vec<Vec<f32>>,
}

impl RemoteHttpProvider {
    pub fn new(
        endpoint: impl Into<String>,
        model_id: impl Into<String>,
        dimension: usize,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            model_id: model_id.into(),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteHttpProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            let mut request = self.client.post(&self.endpoint).json(&EmbedRequestBody {
                model: &self.model_id,
                input: chunk,
            });
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request.send().await?;
            let response = response.error_for_status()?;
            let body: EmbedResponseBody = response.json().await?;

            for vector in &body.embeddings {
                if vector.len() != self.dimension {
                    return Err(EmbeddingError::InvalidDimension {
                        expected: self.dimension,
                        actual: vector.len(),
                    });
                }
            }
            out.extend(body.embeddings);
        }
        Ok(out)
    }
}

//! Builds the configured embedding provider. Shared by every subcommand and
//! the HTTP server so `init`/`health`/`status`/the server all agree on which
//! model backs the store.

use std::sync::Arc;

use anyhow::{Context, Result};
use contextd_embeddings::{EmbeddingProvider, LocalOnnxConfig, LocalOnnxProvider, RemoteHttpProvider, StubProvider};

use crate::config::EmbeddingConfig;

pub fn build_embeddings(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let model_dir = LocalOnnxConfig::resolve_model_dir(None);
            let onnx_config = LocalOnnxConfig {
                model_path: model_dir.join(format!("{}.onnx", config.model_id)),
                tokenizer_path: model_dir.join(format!("{}-tokenizer.json", config.model_id)),
                model_id: config.model_id.clone(),
                dimension: config.dimension,
                max_sequence_length: config.max_sequence_length,
            };
            let provider = LocalOnnxProvider::load(onnx_config).context("failed to load local ONNX embedding model")?;
            Ok(Arc::new(provider))
        }
        "remote" => {
            let endpoint = config
                .endpoint
                .clone()
                .context("embedding.endpoint is required for the remote embedding provider")?;
            let provider = RemoteHttpProvider::new(
                endpoint,
                config.model_id.clone(),
                config.dimension,
                config.api_key.clone(),
            )?;
            Ok(Arc::new(provider))
        }
        "stub" => {
            log::warn!("using the stub embedding provider: similarity scores are not semantically meaningful");
            Ok(Arc::new(StubProvider::new(config.dimension)))
        }
        other => anyhow::bail!("unknown embedding provider '{other}': expected local, remote, or stub"),
    }
}

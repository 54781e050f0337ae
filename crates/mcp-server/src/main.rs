//! contextd MCP server
//!
//! Exposes memory, checkpoint, conversation, repository-search, and
//! remediation tools over the Model Context Protocol (stdio transport).
//!
//! ## Tools
//!
//! - `memory_search` / `memory_record` / `memory_feedback`
//! - `checkpoint_save` / `checkpoint_list` / `checkpoint_resume`
//! - `conversation_index` / `conversation_search`
//! - `repository_search`
//! - `remediation_record` / `remediation_search` / `remediation_update_status`
//!
//! ## Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "contextd": {
//!       "command": "contextd-mcp"
//!     }
//!   }
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use contextd_embeddings::{EmbeddingProvider, LocalOnnxConfig, LocalOnnxProvider, RemoteHttpProvider, StubProvider};
use contextd_vector_store::VectorStore;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod schema;
mod service;
mod tenant_args;

use service::ContextdService;

fn data_dir() -> PathBuf {
    std::env::var("CONTEXTD_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".contextd").join("data"))
                .unwrap_or_else(|_| PathBuf::from(".contextd/data"))
        })
}

/// Selects the embedding backend from `CONTEXTD_EMBEDDING_PROVIDER`
/// (`local`, `remote`, or `stub`; default `local`), mirroring the teacher's
/// `runtime_env.rs` env-var-first model resolution.
fn build_embeddings() -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = std::env::var("CONTEXTD_EMBEDDING_PROVIDER").unwrap_or_else(|_| "local".to_string());
    match provider.as_str() {
        "local" => {
            let model_dir = LocalOnnxConfig::resolve_model_dir(None);
            let model_id = std::env::var("CONTEXTD_EMBEDDING_MODEL").unwrap_or_else(|_| "bge-small-en-v1.5".to_string());
            let dimension: usize = std::env::var("CONTEXTD_EMBEDDING_DIMENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(384);
            let max_sequence_length: usize = std::env::var("CONTEXTD_EMBEDDING_MAX_SEQ_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256);
            let config = LocalOnnxConfig {
                model_path: model_dir.join(format!("{model_id}.onnx")),
                tokenizer_path: model_dir.join(format!("{model_id}-tokenizer.json")),
                model_id,
                dimension,
                max_sequence_length,
            };
            let provider = LocalOnnxProvider::load(config).context("failed to load local ONNX embedding model")?;
            Ok(Arc::new(provider))
        }
        "remote" => {
            let endpoint = std::env::var("CONTEXTD_EMBEDDING_ENDPOINT")
                .context("CONTEXTD_EMBEDDING_ENDPOINT is required for the remote embedding provider")?;
            let model_id = std::env::var("CONTEXTD_EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());
            let dimension: usize = std::env::var("CONTEXTD_EMBEDDING_DIMENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1536);
            let api_key = std::env::var("CONTEXTD_EMBEDDING_API_KEY").ok();
            let provider = RemoteHttpProvider::new(endpoint, model_id, dimension, api_key)?;
            Ok(Arc::new(provider))
        }
        "stub" => {
            let dimension: usize = std::env::var("CONTEXTD_EMBEDDING_DIMENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(384);
            log::warn!("using the stub embedding provider: similarity scores are not semantically meaningful");
            Ok(Arc::new(StubProvider::new(dimension)))
        }
        other => anyhow::bail!("unknown CONTEXTD_EMBEDDING_PROVIDER '{other}': expected local, remote, or stub"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .filter_module("ort", log::LevelFilter::Off)
        .init();

    log::info!("starting contextd MCP server");

    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir).context("failed to create data directory")?;
    let store = Arc::new(VectorStore::open(data_dir).await.context("failed to open vector store")?);
    let embeddings = build_embeddings()?;

    let service = ContextdService::new(store, embeddings);
    let server = service.serve(stdio()).await?;
    server.waiting().await?;

    log::info!("contextd MCP server stopped");
    Ok(())
}

//! `contextd status` — read-only statusline snapshot (§4.8) for the
//! resolved tenant.

use anyhow::Result;
use contextd_statusline::StatuslineService;
use contextd_vector_store::VectorStore;
use std::sync::Arc;

use crate::commands::resolve_tenant;
use crate::config::Config;

pub async fn run(config: &Config) -> Result<()> {
    let tenant = resolve_tenant(config)?;
    let store = Arc::new(VectorStore::open(config.data_dir.clone()).await?);
    let service = StatuslineService::new(store, config.embedding.dimension);
    let snapshot = service.snapshot(&tenant).await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

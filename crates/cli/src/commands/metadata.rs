//! `contextd metadata {health|list|recover <name>|quarantine list|quarantine
//! restore <hash>}` — the admin recovery ops §4.1 requires as external (the
//! store never auto-repairs itself).

use anyhow::Result;
use contextd_vector_store::VectorStore;

use crate::config::Config;

pub async fn health(config: &Config) -> Result<()> {
    let store = VectorStore::open(config.data_dir.clone()).await?;
    let report = store.health_scan().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn list(config: &Config) -> Result<()> {
    let store = VectorStore::open(config.data_dir.clone()).await?;
    let report = store.health_scan().await?;
    println!("{}", serde_json::to_string_pretty(&report.healthy)?);
    Ok(())
}

pub async fn recover(config: &Config, name: &str) -> Result<()> {
    contextd_vector_store::recover_metadata(&config.data_dir, name, config.embedding.dimension).await?;
    println!("recovered metadata for collection '{name}'");
    Ok(())
}

pub async fn quarantine_list(config: &Config) -> Result<()> {
    let store = VectorStore::open(config.data_dir.clone()).await?;
    let report = store.health_scan().await?;
    println!("{}", serde_json::to_string_pretty(&report.quarantined)?);
    Ok(())
}

pub async fn quarantine_restore(config: &Config, hash: &str) -> Result<()> {
    contextd_vector_store::restore_from_quarantine(&config.data_dir, hash).await?;
    println!("restored collection '{hash}' from quarantine");
    Ok(())
}

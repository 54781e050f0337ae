//! `contextd checkpoint {save|list|resume <id>}` (§4.3, §6).

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use contextd_checkpoint::{CheckpointService, ListCheckpointsQuery, ResumeLevel, SaveCheckpointInput};
use contextd_vector_store::VectorStore;

use crate::commands::resolve_tenant;
use crate::config::Config;
use crate::embeddings_setup::build_embeddings;

#[derive(Args)]
pub struct SaveArgs {
    /// Checkpoint name
    pub name: String,
    #[arg(long)]
    pub session_id: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub summary: Option<String>,
    #[arg(long)]
    pub context: Option<String>,
    #[arg(long)]
    pub full_state: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub token_count: u64,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub session_id: Option<String>,
    #[arg(long)]
    pub auto_only: bool,
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args)]
pub struct ResumeArgs {
    pub id: String,
    /// summary | context | full
    #[arg(long, default_value = "summary")]
    pub level: String,
}

async fn service(config: &Config) -> Result<CheckpointService> {
    let store = Arc::new(VectorStore::open(config.data_dir.clone()).await?);
    let embeddings = build_embeddings(&config.embedding)?;
    Ok(CheckpointService::new(store, embeddings))
}

pub async fn save(config: &Config, args: SaveArgs) -> Result<()> {
    let tenant = resolve_tenant(config)?;
    let service = service(config).await?;
    let mut input = SaveCheckpointInput::new(tenant, args.name);
    input.session_id = args.session_id;
    input.description = args.description;
    input.summary = args.summary;
    input.context = args.context;
    input.full_state = args.full_state;
    input.token_count = args.token_count;

    match service.save(input).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("{{\"saved\": false}}"),
    }
    Ok(())
}

pub async fn list(config: &Config, args: ListArgs) -> Result<()> {
    let tenant = resolve_tenant(config)?;
    let service = service(config).await?;
    let query = ListCheckpointsQuery {
        session_id: args.session_id,
        auto_only: args.auto_only,
        limit: args.limit,
    };
    let records = service.list(&tenant, &query).await?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

pub async fn resume(config: &Config, args: ResumeArgs) -> Result<()> {
    use std::str::FromStr;
    let tenant = resolve_tenant(config)?;
    let service = service(config).await?;
    let level = ResumeLevel::from_str(&args.level)?;
    let resumed = service.resume(&tenant, &args.id, level).await?;
    println!("{}", serde_json::to_string_pretty(&resumed)?);
    Ok(())
}

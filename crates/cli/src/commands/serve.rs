//! `contextd serve [--bind] [--public] [--auth-token]` — runs the
//! auxiliary HTTP surface (§6). Embeds the same services the CLI's other
//! subcommands open directly; there is no separate "server process"
//! distinct from the CLI binary.

use std::sync::Arc;

use anyhow::Result;
use contextd_checkpoint::CheckpointService;
use contextd_statusline::StatuslineService;
use contextd_vector_store::VectorStore;

use crate::config::{Config, ConfigHandle};
use crate::embeddings_setup::build_embeddings;
use crate::http_api::{router, AppState};
use crate::server_security::{choose_preferred_bind_addr, resolve_guarded_bind_addrs, AuthToken, AUTH_TOKEN_ENV};

pub async fn run(config: Config, bind: String, public: bool, auth_token: Option<String>) -> Result<()> {
    let public = public || config.http.public;

    let auth_token = auth_token.or_else(|| std::env::var(AUTH_TOKEN_ENV).ok());
    let auth = AuthToken::parse(auth_token.as_deref())?;
    if public && auth.is_none() {
        log::warn!("serving on a public bind address without an auth token; every request will be accepted");
    }

    let addrs = resolve_guarded_bind_addrs(&bind, public).await?;
    let addr = choose_preferred_bind_addr(&addrs)
        .ok_or_else(|| anyhow::anyhow!("bind address '{bind}' resolved to no usable socket address"))?;

    let store = Arc::new(VectorStore::open(config.data_dir.clone()).await?);
    let embeddings = build_embeddings(&config.embedding)?;
    let checkpoints = Arc::new(CheckpointService::new(store.clone(), embeddings.clone()));
    let statusline = Arc::new(StatuslineService::new(store.clone(), config.embedding.dimension));
    let config_handle = ConfigHandle::new(config);

    let state = Arc::new(AppState {
        store,
        embeddings,
        config: config_handle,
        checkpoints,
        statusline,
        auth,
    });

    let app = router(state);
    log::info!("contextd HTTP surface listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

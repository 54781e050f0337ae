use crate::error::{Result, VectorStoreError};
use crate::metadata::CollectionMetadata;
use crate::paths::{collection_hash, is_valid_hash, QUARANTINE_DIR_NAME};
use std::path::Path;

/// Admin operation: rewrite a fresh metadata record into a quarantined
/// collection directory so it becomes restorable. Never called by the
/// application itself — only by the `metadata recover` CLI op (§4.1: "the
/// store never auto-repairs").
pub async fn recover_metadata(root: &Path, collection_name: &str, dimension: usize) -> Result<()> {
    let hash = collection_hash(collection_name);
    let dir = root.join(QUARANTINE_DIR_NAME).join(&hash);
    if !dir.exists() {
        return Err(VectorStoreError::NotFound(format!(
            "no quarantined collection for '{collection_name}' (hash {hash})"
        )));
    }
    CollectionMetadata::new(collection_name, dimension)
        .save(&dir)
        .await?;
    log::warn!("recovered metadata for quarantined collection '{collection_name}' ({hash})");
    Ok(())
}

/// Admin operation: move a quarantined directory back into the live tree.
/// Fails unless the quarantined directory already has a metadata record
/// (recover it first) and the destination doesn't already exist.
pub async fn restore_from_quarantine(root: &Path, hash: &str) -> Result<()> {
    if !is_valid_hash(hash) {
        return Err(VectorStoreError::Validation(format!(
            "invalid collection hash '{hash}': expected 8 lowercase hex characters"
        )));
    }
    let source = root.join(QUARANTINE_DIR_NAME).join(hash);
    if !source.exists() {
        return Err(VectorStoreError::NotFound(format!(
            "no quarantined collection with hash '{hash}'"
        )));
    }
    if !CollectionMetadata::exists(&source) {
        return Err(VectorStoreError::Corrupt(format!(
            "quarantined collection '{hash}' still has no metadata record; run `metadata recover` first"
        )));
    }
    let dest = root.join(hash);
    if dest.exists() {
        return Err(VectorStoreError::Conflict(format!(
            "collection directory '{hash}' already exists in the live tree"
        )));
    }
    tokio::fs::rename(&source, &dest).await?;
    log::info!("restored collection '{hash}' from quarantine");
    Ok(())
}

use crate::error::{Result, VectorStoreError};
use crate::paths::METADATA_FILENAME;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// The `00000000` record of a collection directory: name, key/value map,
/// and the embedding dimension every document in the collection must match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionMetadata {
    pub schema_version: u32,
    pub name: String,
    pub dimension: usize,
    pub created_at: String,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl CollectionMetadata {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            name: name.into(),
            dimension,
            created_at: chrono::Utc::now().to_rfc3339(),
            extra: BTreeMap::new(),
        }
    }

    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(METADATA_FILENAME);
        let bytes = tokio::fs::read(&path).await?;
        let metadata: Self = serde_json::from_slice(&bytes)?;
        if metadata.schema_version != METADATA_SCHEMA_VERSION {
            return Err(VectorStoreError::Validation(format!(
                "unsupported collection metadata schema_version {} (expected {METADATA_SCHEMA_VERSION})",
                metadata.schema_version
            )));
        }
        Ok(metadata)
    }

    pub async fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(METADATA_FILENAME);
        let bytes = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    pub fn exists(dir: &Path) -> bool {
        dir.join(METADATA_FILENAME).exists()
    }
}

use contextd_tenant::TenantInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::CheckpointError;

/// Detail tier requested at resume. Each level strictly includes the
/// previous one's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeLevel {
    Summary,
    Context,
    Full,
}

impl FromStr for ResumeLevel {
    type Err = CheckpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(Self::Summary),
            "context" => Ok(Self::Context),
            "full" => Ok(Self::Full),
            other => Err(CheckpointError::Validation(format!(
                "unknown resume level '{other}': expected summary, context, or full"
            ))),
        }
    }
}

/// What `CheckpointService::list` accepts: an optional session narrowing,
/// an auto-created-only filter, and a result cap.
#[derive(Debug, Clone)]
pub struct ListCheckpointsQuery {
    pub session_id: Option<String>,
    pub auto_only: bool,
    pub limit: usize,
}

impl Default for ListCheckpointsQuery {
    fn default() -> Self {
        Self {
            session_id: None,
            auto_only: false,
            limit: 20,
        }
    }
}

/// What `CheckpointService::save` accepts. `name` is the only required
/// field beyond the tenant triple.
#[derive(Debug, Clone)]
pub struct SaveCheckpointInput {
    pub tenant: TenantInfo,
    pub session_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub context: Option<String>,
    pub full_state: Option<String>,
    pub token_count: u64,
    pub auto_created: bool,
    pub metadata: BTreeMap<String, String>,
}

impl SaveCheckpointInput {
    pub fn new(tenant: TenantInfo, name: impl Into<String>) -> Self {
        Self {
            tenant,
            session_id: None,
            name: name.into(),
            description: None,
            summary: None,
            context: None,
            full_state: None,
            token_count: 0,
            auto_created: false,
            metadata: BTreeMap::new(),
        }
    }
}

/// The record persisted in the `checkpoints` collection (everything except
/// `full_state`, which is stored lazily in a sibling collection keyed by
/// `id`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckpointRecord {
    pub id: String,
    pub session_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub context: Option<String>,
    pub has_full_state: bool,
    pub token_count: u64,
    pub auto_created: bool,
    pub created_at: String,
    pub metadata: BTreeMap<String, String>,
}

/// A checkpoint resumed at a given detail level: fields past the requested
/// tier are always `None`, never populated-then-discarded by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumedCheckpoint {
    pub id: String,
    pub session_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub context: Option<String>,
    pub full_state: Option<String>,
    pub token_count: u64,
    pub auto_created: bool,
    pub created_at: String,
    pub metadata: BTreeMap<String, String>,
}

//! MCP tool input/output schemas. Every request inlines the tenant triple
//! (`tenant_id`, `team_id`, `project_id`) rather than nesting it, matching
//! the teacher's flat request-struct style in `tools.rs`.

use rmcp::schemars;
use serde::{Deserialize, Serialize};

fn default_k() -> usize {
    10
}

// ---------------------------------------------------------------------
// memory_*
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MemorySearchRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    #[schemars(description = "Natural language query")]
    pub query: String,
    #[schemars(description = "Maximum results (default 10)")]
    #[serde(default = "default_k")]
    pub k: usize,
    #[schemars(description = "Exact tags a result must carry")]
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MemoryRecordRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    #[schemars(description = "Memory content")]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[schemars(description = "Initial confidence in [0, 1] (default 0.5)")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MemoryFeedbackRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    pub id: String,
    #[schemars(description = "Confidence adjustment, positive or negative")]
    pub delta: f32,
}

// ---------------------------------------------------------------------
// checkpoint_*
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CheckpointSaveRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    pub session_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub context: Option<String>,
    pub full_state: Option<String>,
    #[serde(default)]
    pub token_count: u64,
    #[serde(default)]
    pub auto_created: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CheckpointListRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    pub session_id: Option<String>,
    #[serde(default)]
    pub auto_only: bool,
    #[schemars(description = "Maximum results (default 20)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CheckpointResumeRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    pub id: String,
    #[schemars(description = "summary | context | full (default summary)")]
    pub level: Option<String>,
}

// ---------------------------------------------------------------------
// conversation_* / repository_search
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConversationIndexRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    #[schemars(description = "Raw JSONL transcript, one message object per line")]
    pub transcript: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConversationSearchRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RepositorySearchRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[schemars(description = "minimal | preview | full (default minimal)")]
    pub content_mode: Option<String>,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct RepositorySearchHit {
    pub path: String,
    pub score: f32,
    /// Always `None` for transcripts that never recorded a branch —
    /// contextd indexes file references from conversation transcripts, not
    /// a live git checkout.
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ---------------------------------------------------------------------
// remediation_*
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemediationRecordRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    pub problem: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub identifier: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemediationSearchRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemediationUpdateStatusRequest {
    pub tenant_id: String,
    pub team_id: Option<String>,
    pub project_id: String,
    pub id: String,
    #[schemars(description = "open | documented | resolved")]
    pub status: String,
    pub fix: Option<String>,
}

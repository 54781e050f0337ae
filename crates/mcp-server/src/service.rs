//! MCP tool dispatch: thin handlers that parse a request, call into the
//! matching service crate, and serialize the result. Registration/dispatch
//! plumbing itself is out of scope (spec.md §1) — this mirrors the
//! teacher's `tools.rs` shape (`#[tool_router]`/`#[tool]` over a service
//! struct), not a bespoke protocol stack.

use std::str::FromStr;
use std::sync::Arc;

use contextd_checkpoint::{CheckpointService, ListCheckpointsQuery, ResumeLevel, SaveCheckpointInput};
use contextd_conversation::{ConversationIngestService, DOC_TYPE_DECISION, DOC_TYPE_FILE_REF, DOC_TYPE_MESSAGE};
use contextd_embeddings::EmbeddingProvider;
use contextd_protocol::ContentMode;
use contextd_reasoning_bank::ReasoningBankService;
use contextd_remediation::{RemediationService, RemediationStatus};
use contextd_vector_store::VectorStore;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use tokio_util::sync::CancellationToken;

use crate::schema::{
    CheckpointListRequest, CheckpointResumeRequest, CheckpointSaveRequest, ConversationIndexRequest,
    ConversationSearchRequest, MemoryFeedbackRequest, MemoryRecordRequest, MemorySearchRequest,
    RemediationRecordRequest, RemediationSearchRequest, RemediationUpdateStatusRequest,
    RepositorySearchHit, RepositorySearchRequest,
};
use crate::tenant_args::tenant_from;

fn ok_json(value: impl serde::Serialize) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&value).unwrap_or_default(),
    )]))
}

fn err_text(message: impl std::fmt::Display) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(format!(
        "Error: {message}"
    ))]))
}

/// Runs every normative tool of spec.md §7.3 over the shared service
/// crates. One `VectorStore`/`EmbeddingProvider` pair backs all of them.
#[derive(Clone)]
pub struct ContextdService {
    checkpoints: Arc<CheckpointService>,
    conversation: Arc<ConversationIngestService>,
    reasoning_bank: Arc<ReasoningBankService>,
    remediation: Arc<RemediationService>,
    tool_router: ToolRouter<Self>,
}

impl ContextdService {
    pub fn new(store: Arc<VectorStore>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            checkpoints: Arc::new(CheckpointService::new(store.clone(), embeddings.clone())),
            conversation: Arc::new(ConversationIngestService::new(store.clone(), embeddings.clone())),
            reasoning_bank: Arc::new(ReasoningBankService::new(store.clone(), embeddings.clone())),
            remediation: Arc::new(RemediationService::new(store, embeddings)),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_handler]
impl ServerHandler for ContextdService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "contextd is a local-first context engine: record and search memories \
                 (memory_*), save/resume checkpoints (checkpoint_*), index and search \
                 conversation transcripts (conversation_*, repository_search), and track \
                 remediations (remediation_*)."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

#[tool_router]
impl ContextdService {
    #[tool(description = "Semantic search over recorded memories, optionally narrowed by exact tags.")]
    pub async fn memory_search(
        &self,
        Parameters(req): Parameters<MemorySearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        match self.reasoning_bank.search(&tenant, &req.query, req.k, &req.tags).await {
            Ok(results) => ok_json(results),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Record a new memory with tags and an initial confidence.")]
    pub async fn memory_record(
        &self,
        Parameters(req): Parameters<MemoryRecordRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        let confidence = req.confidence.unwrap_or(0.5);
        match self
            .reasoning_bank
            .record(&tenant, req.content, req.tags, confidence)
            .await
        {
            Ok(record) => ok_json(record),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Adjust a memory's confidence based on observed outcome (positive or negative delta).")]
    pub async fn memory_feedback(
        &self,
        Parameters(req): Parameters<MemoryFeedbackRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        match self.reasoning_bank.feedback(&tenant, &req.id, req.delta).await {
            Ok(record) => ok_json(record),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Save a checkpoint (name, optional summary/context/full_state).")]
    pub async fn checkpoint_save(
        &self,
        Parameters(req): Parameters<CheckpointSaveRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        let mut input = SaveCheckpointInput::new(tenant, req.name);
        input.session_id = req.session_id;
        input.description = req.description;
        input.summary = req.summary;
        input.context = req.context;
        input.full_state = req.full_state;
        input.token_count = req.token_count;
        input.auto_created = req.auto_created;

        match self.checkpoints.save(input).await {
            Ok(record) => ok_json(record),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "List checkpoints, newest first, optionally narrowed to a session.")]
    pub async fn checkpoint_list(
        &self,
        Parameters(req): Parameters<CheckpointListRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        let query = ListCheckpointsQuery {
            session_id: req.session_id,
            auto_only: req.auto_only,
            limit: req.limit.unwrap_or(20),
        };
        match self.checkpoints.list(&tenant, &query).await {
            Ok(records) => ok_json(records),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Resume a checkpoint at a detail level: summary, context, or full.")]
    pub async fn checkpoint_resume(
        &self,
        Parameters(req): Parameters<CheckpointResumeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        let level = match ResumeLevel::from_str(req.level.as_deref().unwrap_or("summary")) {
            Ok(level) => level,
            Err(e) => return err_text(e),
        };
        match self.checkpoints.resume(&tenant, &req.id, level).await {
            Ok(resumed) => ok_json(resumed),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Ingest a JSONL conversation transcript: messages, decisions, file/commit references.")]
    pub async fn conversation_index(
        &self,
        Parameters(req): Parameters<ConversationIndexRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        match self
            .conversation
            .ingest(&tenant, &req.transcript, &CancellationToken::new())
            .await
        {
            Ok(report) => ok_json(report),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Semantic search over indexed conversation messages and extracted decisions.")]
    pub async fn conversation_search(
        &self,
        Parameters(req): Parameters<ConversationSearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        match self
            .conversation
            .search(&tenant, &req.query, req.k, &[DOC_TYPE_MESSAGE, DOC_TYPE_DECISION])
            .await
        {
            Ok(results) => ok_json(results),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Search file paths referenced in indexed conversations. content_mode: minimal (path+score+branch), preview (<=200 chars), or full.")]
    pub async fn repository_search(
        &self,
        Parameters(req): Parameters<RepositorySearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        let mode = match req.content_mode.as_deref().unwrap_or("minimal") {
            "minimal" => ContentMode::Minimal,
            "preview" => ContentMode::Preview,
            "full" => ContentMode::Full,
            other => return err_text(format!("unknown content_mode '{other}': expected minimal, preview, or full")),
        };

        let entries = match self
            .conversation
            .search(&tenant, &req.query, req.k, &[DOC_TYPE_FILE_REF])
            .await
        {
            Ok(entries) => entries,
            Err(e) => return err_text(e),
        };

        let hits: Vec<RepositorySearchHit> = entries
            .into_iter()
            .map(|entry| RepositorySearchHit {
                path: entry.metadata.get("path").cloned().unwrap_or_default(),
                score: entry.score,
                branch: entry.metadata.get("branch").cloned(),
                content: mode.apply(&entry.content),
            })
            .collect();

        ok_json(hits)
    }

    #[tool(description = "Open a new remediation record for a problem, status starts at 'open'.")]
    pub async fn remediation_record(
        &self,
        Parameters(req): Parameters<RemediationRecordRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        match self
            .remediation
            .record(&tenant, req.problem, req.tags, req.identifier)
            .await
        {
            Ok(record) => ok_json(record),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Hybrid semantic + exact-tag search over remediation problems.")]
    pub async fn remediation_search(
        &self,
        Parameters(req): Parameters<RemediationSearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        match self.remediation.search(&tenant, &req.query, req.k, &req.tags).await {
            Ok(results) => ok_json(results),
            Err(e) => err_text(e),
        }
    }

    #[tool(description = "Advance a remediation's status (open -> documented -> resolved); rejects moving backward.")]
    pub async fn remediation_update_status(
        &self,
        Parameters(req): Parameters<RemediationUpdateStatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        let tenant = match tenant_from(req.tenant_id, req.team_id, req.project_id) {
            Ok(t) => t,
            Err(e) => return err_text(e),
        };
        let status = match RemediationStatus::from_str(&req.status) {
            Ok(status) => status,
            Err(e) => return err_text(e),
        };
        match self
            .remediation
            .update_status(&tenant, &req.id, status, req.fix)
            .await
        {
            Ok(record) => ok_json(record),
            Err(e) => err_text(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextd_embeddings::StubProvider;
    use tempfile::tempdir;

    fn request_args() -> serde_json::Value {
        serde_json::json!({
            "tenant_id": "acme",
            "team_id": null,
            "project_id": "proj",
        })
    }

    async fn service(dir: &std::path::Path) -> ContextdService {
        let store = Arc::new(VectorStore::open(dir).await.unwrap());
        let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(StubProvider::new(8));
        ContextdService::new(store, embeddings)
    }

    fn tool_text(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .expect("tool returned no text content")
    }

    #[tokio::test]
    async fn memory_record_then_search_round_trips() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;

        let mut record_args = request_args();
        record_args["content"] = serde_json::json!("prefer Redis for session cache");
        record_args["tags"] = serde_json::json!(["cache"]);
        let record_result = service
            .memory_record(Parameters(serde_json::from_value(record_args).unwrap()))
            .await
            .unwrap();
        assert!(!record_result.is_error.unwrap_or(false));

        let mut search_args = request_args();
        search_args["query"] = serde_json::json!("session cache");
        let search_result = service
            .memory_search(Parameters(serde_json::from_value(search_args).unwrap()))
            .await
            .unwrap();
        assert!(tool_text(&search_result).contains("Redis"));
    }

    #[tokio::test]
    async fn checkpoint_save_then_resume_round_trips() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;

        let mut save_args = request_args();
        save_args["name"] = serde_json::json!("feat-x");
        save_args["summary"] = serde_json::json!("OAuth done");
        let save_result = service
            .checkpoint_save(Parameters(serde_json::from_value(save_args).unwrap()))
            .await
            .unwrap();
        let saved_text = tool_text(&save_result);
        let saved: serde_json::Value = serde_json::from_str(&saved_text).unwrap();
        let id = saved["id"].as_str().unwrap().to_string();

        let mut resume_args = request_args();
        resume_args["id"] = serde_json::json!(id);
        resume_args["level"] = serde_json::json!("summary");
        let resume_result = service
            .checkpoint_resume(Parameters(serde_json::from_value(resume_args).unwrap()))
            .await
            .unwrap();
        assert!(tool_text(&resume_result).contains("OAuth done"));
    }

    #[tokio::test]
    async fn conversation_index_then_search_finds_decision() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;

        let mut index_args = request_args();
        index_args["transcript"] = serde_json::json!(
            "{\"session_id\":\"s1\",\"uuid\":\"u1\",\"role\":\"assistant\",\"content\":\"Let's use Postgres since it's already in our stack.\",\"timestamp\":\"2026-01-01T00:00:00Z\"}\n"
        );
        let index_result = service
            .conversation_index(Parameters(serde_json::from_value(index_args).unwrap()))
            .await
            .unwrap();
        assert!(!index_result.is_error.unwrap_or(false));

        let mut search_args = request_args();
        search_args["query"] = serde_json::json!("Postgres");
        let search_result = service
            .conversation_search(Parameters(serde_json::from_value(search_args).unwrap()))
            .await
            .unwrap();
        assert!(tool_text(&search_result).contains("Postgres"));
    }

    #[tokio::test]
    async fn repository_search_minimal_mode_omits_content() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;

        let mut index_args = request_args();
        index_args["transcript"] = serde_json::json!(
            "{\"session_id\":\"s1\",\"uuid\":\"u1\",\"role\":\"tool\",\"content\":\"edited\",\"timestamp\":\"t\",\"tool_calls\":[{\"name\":\"edit\",\"file_path\":\"src/cache.rs\",\"operation\":\"write\"}]}\n"
        );
        service
            .conversation_index(Parameters(serde_json::from_value(index_args).unwrap()))
            .await
            .unwrap();

        let mut search_args = request_args();
        search_args["query"] = serde_json::json!("cache.rs");
        let search_result = service
            .repository_search(Parameters(serde_json::from_value(search_args).unwrap()))
            .await
            .unwrap();
        let text = tool_text(&search_result);
        assert!(text.contains("src/cache.rs"));
        assert!(!text.contains("\"content\""));
    }

    #[tokio::test]
    async fn remediation_backward_transition_is_rejected() {
        let dir = tempdir().unwrap();
        let service = service(dir.path()).await;

        let mut record_args = request_args();
        record_args["problem"] = serde_json::json!("flaky test in CI");
        let record_result = service
            .remediation_record(Parameters(serde_json::from_value(record_args).unwrap()))
            .await
            .unwrap();
        let record: serde_json::Value = serde_json::from_str(&tool_text(&record_result)).unwrap();
        let id = record["id"].as_str().unwrap().to_string();

        let mut resolve_args = request_args();
        resolve_args["id"] = serde_json::json!(id.clone());
        resolve_args["status"] = serde_json::json!("resolved");
        service
            .remediation_update_status(Parameters(serde_json::from_value(resolve_args).unwrap()))
            .await
            .unwrap();

        let mut backward_args = request_args();
        backward_args["id"] = serde_json::json!(id);
        backward_args["status"] = serde_json::json!("open");
        let backward_result = service
            .remediation_update_status(Parameters(serde_json::from_value(backward_args).unwrap()))
            .await
            .unwrap();
        assert!(backward_result.is_error.unwrap_or(false));
    }
}

//! # contextd-conversation
//!
//! JSONL transcript ingestion, heuristic decision detection, optional LLM
//! refinement, and tag extraction — one collection per `(tenant, project)`.

mod decision;
mod error;
mod ingest;
mod message;
mod rate_limiter;
mod summarizer;
mod tags;

pub use decision::{
    default_patterns, detect_candidates, truncate_code_points, Decision, DecisionCandidate,
    DecisionDetectorConfig, DecisionPattern,
};
pub use error::{ConversationError, Result};
pub use ingest::{
    ConversationIngestService, IngestReport, ScoredConversationEntry, DOC_TYPE_COMMIT_REF,
    DOC_TYPE_DECISION, DOC_TYPE_FILE_REF, DOC_TYPE_MESSAGE,
};
pub use message::{
    parse_jsonl, CommitReference, FileReference, ParsedTranscript, RawMessage, Role, ToolCallRaw,
    TranscriptLine,
};
pub use rate_limiter::TokenBucket;
pub use summarizer::{AnthropicSummarizer, NoneSummarizer, OpenAiSummarizer, Summarizer};
pub use tags::{extract_tags, primary_domain};

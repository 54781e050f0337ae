//! # contextd-reasoning-bank
//!
//! Memory records with feedback-adjusted confidence, semantic + tag search,
//! and optional LLM-driven consolidation of near-duplicates.

mod consolidate;
mod error;
mod id;
mod llm_client;
mod service;
mod types;

pub use consolidate::DEFAULT_SIMILARITY_THRESHOLD;
pub use error::{ReasoningBankError, Result};
pub use id::{is_memory_id, new_memory_id, MEMORY_ID_PREFIX};
pub use llm_client::{AnthropicLlmClient, LLMClient, OpenAiLlmClient};
pub use service::ReasoningBankService;
pub use types::{FeedbackEntry, MemoryRecord, ScoredMemory};

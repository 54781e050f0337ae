//! Secret redaction for content ingested into the store and for prompts sent
//! to any external LLM.
//!
//! Two modes share one ordered pattern table ([`patterns::PATTERNS`]):
//! [`ScrubMode::Ingest`] for content about to be persisted, and the stricter
//! [`ScrubMode::Outbound`] for anything about to leave the process over the
//! network. Both are idempotent — `scrub(scrub(x)) == scrub(x)` — which
//! matters because ingest-scrubbed content is routinely re-scrubbed in
//! outbound mode before being handed to a summarizer.

mod patterns;
mod scrub;

pub use scrub::{contains_secret, scrub, scrub_ingest, scrub_outbound, ScrubMode, ScrubResult};

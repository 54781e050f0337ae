mod anthropic;
mod none;
mod openai;
mod parse;
mod retry;

pub use anthropic::AnthropicSummarizer;
pub use none::NoneSummarizer;
pub use openai::OpenAiSummarizer;

use crate::decision::{Decision, DecisionCandidate};
use crate::error::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Refines a heuristic [`DecisionCandidate`] into a [`Decision`]. The
/// `Summarizer` owns the outbound-scrub step: a caller never hands
/// unscrubbed content to an implementation of this trait directly — every
/// implementation scrubs its own request body immediately before dispatch,
/// so the contract holds even if a future caller forgets to.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        candidate: &DecisionCandidate,
        cancellation: &CancellationToken,
    ) -> Result<Decision>;
}

/// Split `text` at the first sentence terminator (`.`, `!`, `?`), falling
/// back to the whole trimmed string when none is found. Shared by the
/// no-op summarizer and by every LLM summarizer's parse-failure fallback.
pub fn first_sentence(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.find(['.', '!', '?']) {
        Some(index) => trimmed[..=index].trim().to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sentence_stops_at_terminator() {
        assert_eq!(
            first_sentence("Let's use Redis. It's already in our stack."),
            "Let's use Redis."
        );
    }

    #[test]
    fn first_sentence_falls_back_to_whole_text() {
        assert_eq!(first_sentence("no terminator here"), "no terminator here");
    }
}

use super::{first_sentence, Summarizer};
use crate::decision::{Decision, DecisionCandidate};
use crate::error::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// No LLM call at all: the decision's summary is just the candidate's
/// first sentence, confidence carried over unchanged. Used when no
/// summarizer is configured, or as the degraded mode a real summarizer
/// falls back to on an unparseable response.
pub struct NoneSummarizer;

#[async_trait]
impl Summarizer for NoneSummarizer {
    async fn summarize(
        &self,
        candidate: &DecisionCandidate,
        _cancellation: &CancellationToken,
    ) -> Result<Decision> {
        Ok(Decision {
            summary: first_sentence(&candidate.content),
            reasoning: None,
            alternatives: Vec::new(),
            tags: Vec::new(),
            confidence: candidate.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(content: &str) -> DecisionCandidate {
        DecisionCandidate {
            session_id: "s1".to_string(),
            message_uuid: "u1".to_string(),
            content: content.to_string(),
            context_window: vec![],
            pattern_matched: "lets_use".to_string(),
            confidence: 0.9,
            needs_refine: false,
        }
    }

    #[tokio::test]
    async fn echoes_first_sentence_and_confidence() {
        let summarizer = NoneSummarizer;
        let decision = summarizer
            .summarize(
                &candidate("Let's use Redis. It's already in our stack."),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(decision.summary, "Let's use Redis.");
        assert_eq!(decision.confidence, 0.9);
    }
}

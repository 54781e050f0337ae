use super::parse::parse_model_response;
use super::retry::{backoff_delay, is_retryable_status, sleep_or_cancel, MAX_RETRIES};
use super::Summarizer;
use crate::decision::{Decision, DecisionCandidate};
use crate::error::{ConversationError, Result};
use crate::rate_limiter::TokenBucket;
use async_trait::async_trait;
use contextd_scrubber::scrub_outbound;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const SYSTEM_PROMPT: &str = "You refine a detected engineering decision into a short JSON \
object: {\"summary\": string, \"reasoning\": string|null, \"alternatives\": string[], \
\"tags\": string[], \"confidence\": number between 0 and 1}. Respond with JSON only.";

pub struct AnthropicSummarizer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    rate_limiter: TokenBucket,
}

impl AnthropicSummarizer {
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| ConversationError::External(err.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limiter: TokenBucket::default_policy(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_prompt(candidate: &DecisionCandidate) -> String {
        let mut prompt = String::new();
        for line in &candidate.context_window {
            prompt.push_str(&scrub_outbound(line).scrubbed_text);
            prompt.push('\n');
        }
        prompt.push_str("Assistant: ");
        prompt.push_str(&scrub_outbound(&candidate.content).scrubbed_text);
        prompt
    }
}

#[async_trait]
impl Summarizer for AnthropicSummarizer {
    async fn summarize(
        &self,
        candidate: &DecisionCandidate,
        cancellation: &CancellationToken,
    ) -> Result<Decision> {
        let prompt = Self::build_prompt(candidate);
        let body = json!({
            "model": self.model,
            "max_tokens": 512,
            "system": SYSTEM_PROMPT,
            "messages": [
                {"role": "user", "content": prompt},
            ],
        });

        let mut attempt = 0u32;
        loop {
            if cancellation.is_cancelled() {
                return Err(ConversationError::Cancelled);
            }
            self.rate_limiter.acquire().await;

            let response = self
                .client
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|err| ConversationError::External(err.to_string()))?;

            let status = response.status();
            if status.is_success() {
                let payload: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|err| ConversationError::External(err.to_string()))?;
                let text = payload["content"][0]["text"].as_str().unwrap_or_default();
                return Ok(parse_model_response(text, candidate));
            }

            if !is_retryable_status(status.as_u16()) || attempt >= MAX_RETRIES {
                return Err(ConversationError::External(format!(
                    "anthropic summarizer request failed with status {status}"
                )));
            }

            sleep_or_cancel(backoff_delay(attempt), cancellation).await?;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate() -> DecisionCandidate {
        DecisionCandidate {
            session_id: "s1".to_string(),
            message_uuid: "u1".to_string(),
            content: "Let's use Redis since it's in our stack.".to_string(),
            context_window: vec!["User: How to cache?".to_string()],
            pattern_matched: "lets_use".to_string(),
            confidence: 0.9,
            needs_refine: false,
        }
    }

    fn messages_response(text: &str) -> serde_json::Value {
        json!({"content": [{"type": "text", "text": text}]})
    }

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(messages_response(r#"{"summary":"Use Redis","confidence":0.9}"#)),
            )
            .mount(&server)
            .await;

        let summarizer = AnthropicSummarizer::new("test-key".to_string(), "claude-test")
            .unwrap()
            .with_base_url(server.uri());
        let decision = summarizer
            .summarize(&candidate(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(decision.summary, "Use Redis");
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_retryable_status_fails_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let summarizer = AnthropicSummarizer::new("test-key".to_string(), "claude-test")
            .unwrap()
            .with_base_url(server.uri());
        let result = summarizer
            .summarize(&candidate(), &CancellationToken::new())
            .await;
        assert!(result.is_err());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}

use async_trait::async_trait;
use contextd_conversation::TokenBucket;
use contextd_scrubber::scrub_outbound;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::error::{ReasoningBankError, Result};

/// A bare text-completion backend used by [`crate::consolidate`] to
/// synthesize merged memories. Every `complete` call scrubs `prompt` with
/// the outbound scrubber before it leaves the process — this is the only
/// contract the spec places on an `LLMClient`, independent of whichever
/// concrete provider is wired in.
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub struct AnthropicLlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    rate_limiter: TokenBucket,
}

impl AnthropicLlmClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| ReasoningBankError::External(err.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            rate_limiter: TokenBucket::default_policy(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LLMClient for AnthropicLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let scrubbed = scrub_outbound(prompt).scrubbed_text;
        self.rate_limiter.acquire().await;

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": 1024,
                "messages": [{"role": "user", "content": scrubbed}],
            }))
            .send()
            .await
            .map_err(|err| ReasoningBankError::External(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ReasoningBankError::External(format!(
                "anthropic completion failed with status {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| ReasoningBankError::External(err.to_string()))?;
        Ok(payload["content"][0]["text"].as_str().unwrap_or_default().to_string())
    }
}

pub struct OpenAiLlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    rate_limiter: TokenBucket,
}

impl OpenAiLlmClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| ReasoningBankError::External(err.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            rate_limiter: TokenBucket::default_policy(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LLMClient for OpenAiLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let scrubbed = scrub_outbound(prompt).scrubbed_text;
        self.rate_limiter.acquire().await;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{"role": "user", "content": scrubbed}],
                "temperature": 0.0,
            }))
            .send()
            .await
            .map_err(|err| ReasoningBankError::External(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ReasoningBankError::External(format!(
                "openai completion failed with status {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| ReasoningBankError::External(err.to_string()))?;
        Ok(payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

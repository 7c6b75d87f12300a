//! Chat-completion client for the CFO agent
//!
//! Speaks the OpenAI chat format through the Lava forwarding proxy.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::LavaConfig;
use crate::error::FinnyError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

pub const CHAT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// LLM completion collaborator
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Stand-in used when no LLM credentials are configured
pub struct OfflineChatModel;

#[async_trait]
impl ChatModel for OfflineChatModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Ok("- LLM not configured; set LAVA_API_KEY and AI_CHAT_URL for live insights\n\
            - Review burn rate and runway on the dashboard\n\
            - Look for SaaS subscriptions to cut"
            .to_string())
    }
}

/// Reusable Lava chat client (connection-pooled)
pub struct LavaChatClient {
    client: Client,
    config: LavaConfig,
    url: String,
}

impl LavaChatClient {
    pub fn new(config: LavaConfig) -> Result<Self> {
        let url = config.chat_completion_url().ok_or_else(|| {
            FinnyError::ConfigError("AI_CHAT_URL not configured".to_string())
        })?;

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            config,
            url,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// First choice's content; empty when the provider sent none
    fn into_answer(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for LavaChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: CHAT_MODEL,
            messages,
        };

        info!(model = CHAT_MODEL, messages = messages.len(), "Calling chat completion");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.config.token())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completion request failed: {}", e);
                FinnyError::LlmError(format!("Chat completion error: {}", e))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Chat completion error response: {}", error_text);
            return Err(FinnyError::LlmError(error_text));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse chat completion: {}", e);
            FinnyError::LlmError(format!("Chat completion parse error: {}", e))
        })?;

        Ok(parsed.into_answer())
    }
}

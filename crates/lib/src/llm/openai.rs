//! OpenAI-compatible chat completions client (POST {base}/chat/completions).

use crate::config::LlmConfig;
use crate::llm::{LlmError, TextGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible completion endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            api_key,
            model: model.into(),
            client,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.model.clone(),
            config.timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST /chat/completions, non-streaming, returns the first choice's content.
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::NotConfigured("api key not set".to_string()))?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: ChatResponse = res
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Malformed("no choices[0].message.content".to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        log::debug!("llm: completing with model {} (max_tokens {})", self.model, max_tokens);
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        self.chat(messages, max_tokens).await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

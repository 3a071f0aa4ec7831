use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::HintBackendError;

/// The pluggable remote text generator behind the hint provider.
///
/// One request per call; the caller owns timeouts and fallback. Failures
/// must stay distinguishable via `HintBackendError` so the provider is
/// swappable and mockable.
#[async_trait]
pub trait HintBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, HintBackendError>;
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl ChatConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUEST_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("QUEST_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("QUEST_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Remote hint backend speaking the OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct ChatBackend {
    client: Client,
    config: Option<ChatConfig>,
}

impl ChatBackend {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ChatConfig::from_env())
    }

    /// A `None` config means the backend reports `Disabled` on every call.
    #[must_use]
    pub fn new(config: Option<ChatConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl HintBackend for ChatBackend {
    async fn generate(&self, prompt: &str) -> Result<String, HintBackendError> {
        let config = self.config.as_ref().ok_or(HintBackendError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: 0.6,
            max_tokens: 200,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HintBackendError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(HintBackendError::EmptyResponse)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(HintBackendError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

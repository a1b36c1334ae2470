//! Chat model seam and the OpenAI-compatible client.
//!
//! The analysis pipelines only ever talk to a [`ChatModel`]; the agent
//! backend behind it is external. One production implementation is provided
//! for OpenAI-compatible `chat/completions` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{AnalysisError, AnalysisResult};

/// One content part of a multimodal user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
    /// An inline image, as a data URL
    ImageUrl {
        /// The image reference
        image_url: ImageUrl,
    },
}

/// Image reference inside a content part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    /// Data URL or remote URL
    pub url: String,
}

/// Message content: a plain string or a list of multimodal parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Multimodal content parts
    Parts(Vec<ContentPart>),
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role (user, assistant, system)
    pub role: String,
    /// Message content
    pub content: MessageContent,
}

impl Message {
    /// A system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// A plain-text user message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message carrying an inline image followed by text.
    pub fn user_with_image(data_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: data_url.into(),
                    },
                },
                ContentPart::Text { text: text.into() },
            ]),
        }
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model to use
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    #[serde(default)]
    pub completion_tokens: usize,
    /// Total tokens used
    #[serde(default)]
    pub total_tokens: usize,
}

/// Chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated content
    pub content: String,
    /// Model that generated it
    pub model: String,
    /// Token usage, when the endpoint reports it
    pub usage: Option<TokenUsage>,
}

/// The seam between the analysis pipelines and the external agent backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model id requests are sent for.
    fn model_id(&self) -> &str;

    /// Send a chat completion request.
    async fn chat(&self, request: ChatRequest) -> AnalysisResult<ChatResponse>;
}

/// Client for OpenAI-compatible `chat/completions` endpoints.
pub struct OpenAiCompatibleModel {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleModel {
    /// Create a client for the given endpoint and model id.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> AnalysisResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AnalysisError::Provider(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// Create a client reading the API key from an environment variable.
    pub fn from_env(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key_var: &str,
    ) -> AnalysisResult<Self> {
        Self::new(base_url, model, std::env::var(api_key_var).ok())
    }
}

#[derive(Debug, Deserialize)]
struct WireChatResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAiCompatibleModel {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> AnalysisResult<ChatResponse> {
        debug!("sending chat request for model: {}", request.model);

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| {
            error!("chat request failed: {}", e);
            AnalysisError::Provider(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("chat endpoint error ({}): {}", status, error_text);
            return Err(AnalysisError::Provider(format!(
                "endpoint returned {status}: {error_text}"
            )));
        }

        let wire: WireChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Provider(e.to_string()))?;

        let content = wire
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| AnalysisError::Provider("no content in response".to_string()))?;

        Ok(ChatResponse {
            content,
            model: request.model,
            usage: wire.usage,
        })
    }
}

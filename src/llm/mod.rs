//! Chat-completion endpoint client.
//!
//! The pipeline talks to the model through the [`ChatClient`] trait so the
//! agent and the vision extractor can be exercised against mocks. The only
//! production implementation is [`OpenAiChatClient`], which speaks the
//! OpenAI-compatible `/v1/chat/completions` wire format.

pub mod client;

pub use client::OpenAiChatClient;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use thiserror::Error;

/// A single chat-completion request. Prompt construction is deterministic:
/// two requests built from the same inputs compare equal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the endpoint for a `json_object` response.
    pub json_response: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Message content is either plain text or a list of multimodal parts
/// (the vision extractor sends an `image_url` part).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Generated text plus whatever usage accounting the endpoint reported.
#[derive(Debug, Clone)]
pub struct ChatOutput {
    pub content: String,
    pub total_tokens: Option<u32>,
}

/// Completion-endpoint failures, classified from HTTP status codes and the
/// provider's structured error body rather than message-text matching.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("authentication with the completion endpoint failed: {0}")]
    Auth(String),

    #[error("completion endpoint quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("completion endpoint rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("completion endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("completion transport error: {0}")]
    Transport(String),

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run one completion call. Calls are attempted exactly once; there is
    /// no retry policy at this layer.
    async fn complete(&self, request: ChatRequest) -> Result<ChatOutput, LlmError>;
}

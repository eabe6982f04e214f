//! Completion provider abstraction for LLM APIs.
//!
//! Provides a unified interface for streamed chat completions with
//! OpenAI-compatible request/response formats.

mod groq;

pub use groq::GroqProvider;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

// ============================================================================
// Provider Trait
// ============================================================================

/// A stream of completion text fragments with an explicit error terminal.
///
/// The stream ends when the provider signals completion; any transport or
/// decode failure surfaces as an `Err` item and terminates the stream.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Unified interface for streaming completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Issue a chat completion request and return the fragment stream.
    async fn chat_stream(&self, request: ChatRequest) -> Result<CompletionStream, ProviderError>;
}

/// Collect a fragment stream into the full response text.
///
/// Concatenates every fragment; the first stream error aborts collection.
pub async fn collect_stream(mut stream: CompletionStream) -> Result<String, ProviderError> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

/// Error from a completion provider.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub provider: String,
    pub model: String,
    pub message: String,
    pub status_code: Option<u16>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.provider, self.model, self.message)
    }
}

impl std::error::Error for ProviderError {}

// ============================================================================
// Request Types
// ============================================================================

/// Chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model to use
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    /// Temperature (0.0 - 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

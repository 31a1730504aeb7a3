//! Outbound LLM clients.
//!
//! Every provider turns a provider-neutral [`CompletionRequest`] into its own
//! wire format (see `kubechat-schema`) and returns the completion text.

mod azure;
mod bootstrap;
mod claude;
mod gemini;
mod ollama;
mod openai;
mod policy;
mod upstream_retry;

pub use azure::AzureProvider;
pub use bootstrap::{Providers, build_client};
pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenaiCompatProvider;
pub use policy::{UPSTREAM_BODY_PREVIEW_CHARS, UpstreamErrorBody};
pub(crate) use policy::body_preview;

use async_trait::async_trait;
use kubechat_schema::ChatMessage;

use crate::config::ProviderKind;
use crate::error::LlmError;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider to constrain output to a single JSON object.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            messages,
            max_tokens,
            temperature,
            json_mode: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn model(&self) -> &str;

    /// Single non-streaming completion; returns the assistant text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Shared post-processing: a provider that answered with nothing is an error.
pub(crate) fn non_empty(provider: ProviderKind, text: Option<&str>) -> Result<String, LlmError> {
    match text.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(LlmError::EmptyCompletion { provider }),
    }
}

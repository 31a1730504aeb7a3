pub mod anthropic;
pub mod chat;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use anthropic::{AnthropicErrorBody, AnthropicMessagesRequest, AnthropicMessagesResponse};
pub use chat::{ChatEnvelope, ChatMessage, ChatRole, EnvelopeStatus};
pub use gemini::{GeminiErrorBody, GeminiGenerateRequest, GeminiGenerateResponse};
pub use ollama::{OllamaChatRequest, OllamaChatResponse, OllamaErrorBody, OllamaOptions};
pub use openai::{OpenaiChatRequest, OpenaiChatResponse, OpenaiErrorBody};

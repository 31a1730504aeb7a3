//! Ollama `POST /api/chat` (non-streaming) schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::openai::OpenaiMessage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatRequest {
    pub model: String,

    /// Same `{role, content}` shape as OpenAI.
    pub messages: Vec<OpenaiMessage>,

    pub stream: bool,

    /// `"json"` constrains the output to a JSON value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatResponse {
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub message: Option<OpenaiMessage>,

    #[serde(default)]
    pub done: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Ollama reports failures as `{ "error": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaErrorBody {
    pub error: String,
}

impl OllamaChatResponse {
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_ref()
            .map(|m| m.content.as_str())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_reads_message_content() {
        let body = r#"{
            "model": "llama3",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "hello"},
            "done": true
        }"#;
        let resp: OllamaChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.text(), Some("hello"));
        assert!(resp.done);
    }
}

//! Anthropic error envelope: `{ "type": "error", "error": { "type": "...", "message": "..." } }`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicErrorBody {
    #[serde(rename = "error")]
    pub inner: AnthropicErrorObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicErrorObject {
    #[serde(default)]
    pub r#type: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl AnthropicErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.inner.message.as_deref()
    }
}

//! OpenAI-style error envelope: `{ "error": { "message": "...", "type": "...", "code": ... } }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiErrorBody {
    #[serde(rename = "error")]
    pub inner: OpenaiErrorObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiErrorObject {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub r#type: Option<String>,

    /// Some OpenAI-compatible servers send a string code, Azure sometimes a number.
    #[serde(default)]
    pub code: Option<Value>,
}

impl OpenaiErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.inner.message.as_deref()
    }
}

//! Google API error envelope: `{ "error": { "code": 400, "message": "...", "status": "INVALID_ARGUMENT" } }`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiErrorBody {
    #[serde(rename = "error")]
    pub inner: GeminiErrorObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiErrorObject {
    #[serde(default)]
    pub code: Option<u16>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

impl GeminiErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.inner.message.as_deref()
    }
}

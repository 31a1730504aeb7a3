//! Public JSON envelope returned by every `/api/*` chat endpoint.
//!
//! `{ "status": "success" | "error", "message": "...", "data": {...}, "error": "..." }`

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub status: EnvelopeStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Machine-readable error code; only set on `status = error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatEnvelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    /// Bare `{"status":"success"}`.
    pub fn ok() -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: None,
            data: None,
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: Some(message.into()),
            data: None,
            error: Some(code.into()),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_envelope_is_minimal() {
        let json = serde_json::to_string(&ChatEnvelope::ok()).unwrap();
        assert_eq!(json, r#"{"status":"success"}"#);
    }

    #[test]
    fn error_envelope_carries_code_and_message() {
        let value = serde_json::to_value(ChatEnvelope::error("EMPTY_MESSAGE", "nope")).unwrap();
        assert_eq!(
            value,
            json!({"status": "error", "message": "nope", "error": "EMPTY_MESSAGE"})
        );
    }
}

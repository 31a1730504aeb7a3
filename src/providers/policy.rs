use crate::config::ProviderKind;
use crate::error::LlmError;
use crate::utils::logging::with_pretty_json_debug;
use kubechat_schema::{AnthropicErrorBody, GeminiErrorBody, OllamaErrorBody, OpenaiErrorBody};
use serde::{Serialize, de::DeserializeOwned};

pub const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

/// Structured error body a provider sends alongside a non-success status.
pub trait UpstreamErrorBody: std::fmt::Debug + DeserializeOwned + Serialize {
    fn upstream_message(&self) -> Option<&str>;
}

impl UpstreamErrorBody for OpenaiErrorBody {
    fn upstream_message(&self) -> Option<&str> {
        self.message()
    }
}

impl UpstreamErrorBody for GeminiErrorBody {
    fn upstream_message(&self) -> Option<&str> {
        self.message()
    }
}

impl UpstreamErrorBody for AnthropicErrorBody {
    fn upstream_message(&self) -> Option<&str> {
        self.message()
    }
}

impl UpstreamErrorBody for OllamaErrorBody {
    fn upstream_message(&self) -> Option<&str> {
        Some(self.error.as_str()).filter(|s| !s.is_empty())
    }
}

pub(crate) fn body_preview(raw: &str) -> String {
    format!("{:.len$}", raw, len = UPSTREAM_BODY_PREVIEW_CHARS)
}

/// Consume a non-success response and turn it into `LlmError::UpstreamStatus`.
///
/// The provider's own error message is preferred; otherwise the raw body
/// preview (or the canonical status reason for an empty body) is used.
pub async fn classify_upstream_error<E>(provider: ProviderKind, resp: reqwest::Response) -> LlmError
where
    E: UpstreamErrorBody,
{
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();
    let raw_body = String::from_utf8_lossy(&bytes);

    if let Ok(error) = serde_json::from_slice::<E>(&bytes)
        && let Some(message) = error.upstream_message()
    {
        with_pretty_json_debug(&error, |pretty_error| {
            tracing::debug!(
                %provider,
                %status,
                body = %pretty_error,
                "Upstream structured error"
            );
        });

        return LlmError::UpstreamStatus {
            provider,
            status,
            message: message.to_string(),
        };
    }

    let preview = body_preview(raw_body.trim());
    tracing::debug!(
        %provider,
        %status,
        body = %preview,
        "Upstream unstructured error"
    );

    let message = if preview.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        preview
    };

    LlmError::UpstreamStatus {
        provider,
        status,
        message,
    }
}

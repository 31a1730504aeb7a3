use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kubechat_schema::ChatEnvelope;
use thiserror::Error as ThisError;

use super::{KubeError, KubechatError, LlmError};

/// Errors surfaced by the `/api/*` handlers. Every variant renders as a
/// [`ChatEnvelope`] with `status = "error"`.
#[derive(Debug, ThisError)]
pub enum ChatError {
    #[error("Request rejected: {message}")]
    RequestRejected {
        status: StatusCode,
        code: &'static str,
        message: String,
        debug_message: Option<String>,
    },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] KubechatError),

    #[error(transparent)]
    Kube(#[from] KubeError),
}

impl ChatError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ChatError::RequestRejected {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
            debug_message: None,
        }
    }
}

impl From<JsonRejection> for ChatError {
    fn from(rejection: JsonRejection) -> Self {
        let debug_message = Some(rejection.to_string());
        match rejection {
            JsonRejection::JsonSyntaxError(_) => ChatError::RequestRejected {
                status: StatusCode::BAD_REQUEST,
                code: "INVALID_JSON",
                message: "invalid JSON".to_string(),
                debug_message,
            },
            JsonRejection::MissingJsonContentType(_) => ChatError::RequestRejected {
                status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
                code: "INVALID_CONTENT_TYPE",
                message: "expected `Content-Type: application/json`".to_string(),
                debug_message,
            },
            _ => ChatError::RequestRejected {
                status: StatusCode::BAD_REQUEST,
                code: "INVALID_REQUEST",
                message: "invalid request".to_string(),
                debug_message,
            },
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ChatError::RequestRejected {
                status,
                code,
                message,
                debug_message,
            } => {
                tracing::warn!(
                    %status,
                    code,
                    message = %message,
                    debug_message = debug_message.as_deref().unwrap_or("-"),
                    "Chat request rejected"
                );
                (status, ChatEnvelope::error(code, message))
            }

            ChatError::Llm(e) => {
                tracing::warn!(provider = %e.provider(), error = %e, "LLM provider call failed");
                if e.is_timeout() {
                    (
                        StatusCode::GATEWAY_TIMEOUT,
                        ChatEnvelope::error(
                            "UPSTREAM_TIMEOUT",
                            "❌ Connection error: the AI provider did not respond in time.",
                        ),
                    )
                } else {
                    (
                        StatusCode::BAD_GATEWAY,
                        ChatEnvelope::error(
                            "UPSTREAM_ERROR",
                            "❌ Connection error: could not get a response from the AI provider.",
                        ),
                    )
                }
            }

            ChatError::Store(e) => return e.into_response(),

            ChatError::Kube(e) => {
                tracing::warn!(error = %e, "kubectl operation failed");
                match &e {
                    KubeError::InvalidContextName(_) | KubeError::UnknownContext(_) => (
                        StatusCode::BAD_REQUEST,
                        ChatEnvelope::error("INVALID_CONTEXT", e.to_string()),
                    ),
                    KubeError::Timeout(_) => (
                        StatusCode::GATEWAY_TIMEOUT,
                        ChatEnvelope::error("KUBECTL_TIMEOUT", e.to_string()),
                    ),
                    KubeError::CommandFailed { stderr, .. } => (
                        StatusCode::BAD_GATEWAY,
                        ChatEnvelope::error("KUBECTL_FAILED", stderr.trim().to_string()),
                    ),
                    KubeError::Spawn { .. } | KubeError::Parse(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ChatEnvelope::error("KUBECTL_UNAVAILABLE", e.to_string()),
                    ),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

use axum::http::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;
use crate::config::ProviderKind;

/// Failure talking to an LLM provider.
#[derive(Debug, ThisError)]
pub enum LlmError {
    /// Transport-level failure (DNS, connect, timeouts, etc).
    #[error("{provider} request error: {source}")]
    Transport {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status. `message` is the provider's own error text when it sent one.
    #[error("{provider} returned {status}: {message}")]
    UpstreamStatus {
        provider: ProviderKind,
        status: StatusCode,
        message: String,
    },

    #[error("{provider} response could not be decoded: {source}")]
    Decode {
        provider: ProviderKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} returned no completion text")]
    EmptyCompletion { provider: ProviderKind },

    #[error("invalid {provider} endpoint: {source}")]
    InvalidEndpoint {
        provider: ProviderKind,
        #[source]
        source: url::ParseError,
    },
}

impl LlmError {
    pub fn provider(&self) -> ProviderKind {
        match self {
            LlmError::Transport { provider, .. }
            | LlmError::UpstreamStatus { provider, .. }
            | LlmError::Decode { provider, .. }
            | LlmError::EmptyCompletion { provider }
            | LlmError::InvalidEndpoint { provider, .. } => *provider,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Transport { source, .. } if source.is_timeout())
    }
}

impl IsRetryable for LlmError {
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport { .. } => true,
            LlmError::UpstreamStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_throttling_and_server_errors_are_retryable() {
        let status = |status| LlmError::UpstreamStatus {
            provider: ProviderKind::Openai,
            status,
            message: String::new(),
        };
        assert!(status(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(status(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(!status(StatusCode::UNAUTHORIZED).is_retryable());
        assert!(
            !LlmError::EmptyCompletion {
                provider: ProviderKind::Gemini
            }
            .is_retryable()
        );
    }
}

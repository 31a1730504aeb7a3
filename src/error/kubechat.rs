use axum::{Json, http::StatusCode, response::IntoResponse};
use kubechat_schema::ChatEnvelope;
use thiserror::Error as ThisError;

/// Infrastructure errors: storage and actor plumbing.
#[derive(Debug, ThisError)]
pub enum KubechatError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Stored row is corrupt: {0}")]
    CorruptRow(String),
}

impl IntoResponse for KubechatError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self, "Internal error while handling request");
        let body = ChatEnvelope::error("INTERNAL_ERROR", "An internal server error occurred.");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

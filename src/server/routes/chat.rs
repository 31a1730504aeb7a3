use crate::error::ChatError;
use crate::server::router::AppState;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use kubechat_schema::ChatEnvelope;
use serde::Deserialize;
use serde_json::json;
use time::Duration;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";
const SESSION_MAX_AGE_DAYS: i64 = 7;

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/clear_chat", post(clear_chat_handler))
        .route("/api/history", get(history_handler))
}

/// Reuse the caller's session id, or mint one and attach the cookie.
pub(crate) fn ensure_session(
    jar: PrivateCookieJar,
    insecure_cookie: bool,
) -> (PrivateCookieJar, String) {
    if let Some(existing) = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
    {
        return (jar, existing);
    }

    let session_id = Uuid::new_v4().simple().to_string();
    debug!(session_id, "New chat session");
    let jar = jar.add(build_cookie(session_id.clone(), insecure_cookie));
    (jar, session_id)
}

fn build_cookie(value: String, insecure_cookie: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(!insecure_cookie)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(SESSION_MAX_AGE_DAYS))
        .build()
}

/// GET /
///
/// Chat page; doubles as the health check.
pub async fn index(State(state): State<AppState>, jar: PrivateCookieJar) -> impl IntoResponse {
    let (jar, _) = ensure_session(jar, state.insecure_cookie);
    (jar, Html(INDEX_HTML))
}

/// POST /api/chat
pub async fn chat_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ChatError> {
    let Json(request) = payload?;
    let (jar, session_id) = ensure_session(jar, state.insecure_cookie);

    let envelope = state.chat.handle_message(&session_id, &request.message).await?;
    Ok((jar, Json(envelope)))
}

/// POST /api/clear_chat
pub async fn clear_chat_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, ChatError> {
    let (jar, session_id) = ensure_session(jar, state.insecure_cookie);
    state.chat.clear(&session_id).await?;
    Ok((jar, Json(ChatEnvelope::ok())))
}

/// GET /api/history
pub async fn history_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, ChatError> {
    let (jar, session_id) = ensure_session(jar, state.insecure_cookie);
    let conversation = state.chat.conversation(&session_id).await?;
    Ok((
        jar,
        Json(ChatEnvelope::ok().with_data(json!({
            "mode": state.chat.mode(),
            "conversation": conversation,
        }))),
    ))
}

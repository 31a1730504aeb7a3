use crate::error::ChatError;
use crate::kube::{ClusterInspector, ClusterStatus};
use crate::server::router::AppState;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use kubechat_schema::ChatEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/k8s/status", get(status_handler))
        .route("/api/k8s/switch-context", post(switch_context_handler))
}

#[derive(Debug, Deserialize)]
pub struct SwitchContextRequest {
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClusterOverview {
    #[serde(flatten)]
    status: ClusterStatus,
    contexts: Vec<String>,
}

fn require_cluster(state: &AppState) -> Result<&ClusterInspector, ChatError> {
    state.cluster.as_ref().ok_or_else(|| ChatError::RequestRejected {
        status: StatusCode::NOT_FOUND,
        code: "CHATOPS_DISABLED",
        message: "cluster endpoints are only available in chatops mode".to_string(),
        debug_message: None,
    })
}

/// GET /api/k8s/status
pub async fn status_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ChatError> {
    let cluster = require_cluster(&state)?;

    let mut status = ClusterStatus::clone(&*cluster.status().await);
    let contexts = match cluster.contexts().await {
        Ok(list) => {
            if list.active.is_some() {
                status.active_context = list.active;
            }
            list.contexts
        }
        Err(e) => {
            warn!(error = %e, "Failed to list kubectl contexts");
            Vec::new()
        }
    };

    Ok(Json(ClusterOverview { status, contexts }))
}

/// POST /api/k8s/switch-context
pub async fn switch_context_handler(
    State(state): State<AppState>,
    payload: Result<Json<SwitchContextRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ChatError> {
    let cluster = require_cluster(&state)?;
    let Json(request) = payload?;

    let Some(context) = request
        .context
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    else {
        return Err(ChatError::bad_request("MISSING_CONTEXT", "Context name required"));
    };

    let list = cluster.switch_context(context).await?;
    Ok(Json(
        ChatEnvelope::success(format!("Switched to context {context}")).with_data(json!({
            "active_context": list.active,
            "contexts": list.contexts,
        })),
    ))
}

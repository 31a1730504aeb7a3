#![allow(dead_code)]

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::State,
    http::{Request, Response, StatusCode, header},
    routing::post,
};
use kubechat::assistant::ChatService;
use kubechat::config::{AssistantConfig, AssistantMode, Config, ProviderKind};
use kubechat::db::DbActorHandle;
use kubechat::providers::Providers;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use url::Url;

pub fn unique_path(prefix: &str, ext: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "kubechat-{prefix}-{}-{}.{ext}",
        std::process::id(),
        nanos
    ));
    temp_path
}

pub async fn spawn_store(prefix: &str) -> DbActorHandle {
    let path = unique_path(prefix, "sqlite");
    let database_url = format!("sqlite:{}", path.display());
    kubechat::db::spawn(&database_url)
        .await
        .expect("spawn db actor")
}

pub async fn spawn_test_server(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{addr}")).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    base
}

/// What the fake upstream answers and every request body it received.
#[derive(Clone)]
pub struct FakeUpstream {
    pub status: StatusCode,
    pub reply: Arc<Mutex<String>>,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeUpstream {
    pub fn replying(reply: &str) -> Self {
        Self {
            status: StatusCode::OK,
            reply: Arc::new(Mutex::new(reply.to_string())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::replying("")
        }
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = reply.to_string();
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn chat_completions(
    State(fake): State<FakeUpstream>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.requests.lock().unwrap().push(body);
    if !fake.status.is_success() {
        return (
            fake.status,
            Json(json!({ "error": { "message": "upstream exploded", "type": "server_error" } })),
        );
    }

    let content = fake.reply.lock().unwrap().clone();
    (
        StatusCode::OK,
        Json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "model": "gpt-test",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })),
    )
}

/// OpenAI-compatible `/v1/chat/completions` on an ephemeral port.
pub async fn spawn_fake_openai(fake: FakeUpstream) -> Url {
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(fake);
    spawn_test_server(app).await
}

pub fn openai_config(base: &Url) -> Config {
    let mut cfg = Config::default();
    cfg.providers.active = ProviderKind::Openai;
    cfg.providers.openai.base_url = base.join("v1/").expect("join base url");
    cfg.providers.openai.api_key = Some("sk-test".to_string());
    cfg.providers.openai.model = "gpt-test".to_string();
    cfg.providers.openai.upstream.retry_max_times = Some(0);
    cfg.providers.openai.upstream.timeout_secs = Some(5);
    cfg
}

pub fn chatbot_service(cfg: &Config, store: DbActorHandle) -> ChatService {
    let providers = Providers::from_config(&cfg.providers).expect("build providers");
    let assistant = AssistantConfig {
        mode: AssistantMode::Chatbot,
        ..cfg.assistant.clone()
    };
    ChatService::chatbot(&assistant, store, providers.active)
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn with_cookie(mut req: Request<Body>, cookie: &str) -> Request<Body> {
    if !cookie.is_empty() {
        req.headers_mut()
            .insert(header::COOKIE, cookie.parse().expect("valid cookie header"));
    }
    req
}

/// `name=value` pairs from every `Set-Cookie` header, ready for a `Cookie` header.
pub fn cookie_header_from_set_cookie_headers(headers: &axum::http::HeaderMap) -> String {
    let mut pairs: Vec<String> = Vec::new();
    for v in headers.get_all(header::SET_COOKIE).iter() {
        let s = v.to_str().expect("set-cookie header was not valid utf-8");
        let first = s.split(';').next().unwrap_or("");
        let mut parts = first.splitn(2, '=');
        let name = parts.next().unwrap_or("");
        let value = parts.next().unwrap_or("");
        if !name.trim().is_empty() {
            pairs.push(format!("{}={}", name.trim(), value));
        }
    }
    pairs.join("; ")
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("body is json")
}

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{FakeUpstream, body_json, json_request, with_cookie};
use kubechat::assistant::ChatService;
use kubechat::config::{AssistantMode, Config, KubectlConfig};
use kubechat::kube::{ClusterInspector, KubectlExecutor};
use kubechat::providers::Providers;
use kubechat::server::{AppState, kubechat_router};
use std::path::{Path, PathBuf};
use tower::ServiceExt;

fn chatops_service(
    cfg: &Config,
    kubectl: &KubectlConfig,
    db: kubechat::db::DbActorHandle,
) -> ChatService {
    let providers = Providers::from_config(&cfg.providers).expect("build providers");
    let mut assistant = cfg.assistant.clone();
    assistant.mode = AssistantMode::Chatops;
    let executor = KubectlExecutor::new(kubectl);
    let cluster = ClusterInspector::new(kubectl, executor.kubectl().clone());
    ChatService::chatops(&assistant, db, providers.active, executor, cluster)
}

/// Shell script standing in for kubectl: logs argv, answers the calls the server makes.
#[cfg(unix)]
fn write_fake_kubectl(dir: &Path, api_server: &str, log: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
echo "$*" >> '{log}'
case "$*" in
  "config view --minify -o jsonpath={{.clusters[0].cluster.server}}") echo '{api_server}' ;;
  "get nodes -o json") echo '{{"items":[{{"metadata":{{"name":"node-1"}},"status":{{"conditions":[{{"type":"Ready","status":"True"}}]}}}}]}}' ;;
  "config current-context") echo 'kind-dev' ;;
  "config get-contexts -o name") printf 'kind-dev\nkind-prod\n' ;;
  "config use-context kind-prod") echo 'Switched to context "kind-prod".' ;;
  "get pods -n default") echo 'pod-a   1/1   Running' ;;
  "get events -A") i=0; while [ $i -lt 400 ]; do echo "event-$i Normal Scheduled pod/web-$i assigned to node-1"; i=$((i+1)); done ;;
  *) echo "unexpected: $*" >&2; exit 1 ;;
esac
"#,
        log = log.display(),
    );

    let path = dir.join("kubectl");
    std::fs::write(&path, script).expect("write fake kubectl");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake kubectl");
    path
}

#[cfg(unix)]
#[tokio::test]
async fn destructive_commands_never_reach_kubectl() {
    let fake = FakeUpstream::replying("");
    let base = common::spawn_fake_openai(fake.clone()).await;
    let cfg = common::openai_config(&base);

    let dir = common::unique_path("chatops", "d");
    std::fs::create_dir_all(&dir).unwrap();
    let kubeconfig = dir.join("config");
    std::fs::write(&kubeconfig, "apiVersion: v1\nkind: Config\n").unwrap();
    let log = dir.join("calls.log");
    // Any listening socket will do for the reachability probe.
    let api_server = base.as_str().trim_end_matches('/').to_string();
    let binary = write_fake_kubectl(&dir, &api_server, &log);

    let kubectl = KubectlConfig {
        binary,
        kubeconfig: Some(kubeconfig),
        command_timeout_secs: 10,
        ..KubectlConfig::default()
    };
    let db = common::spawn_store("chatops").await;
    let app = kubechat_router(AppState::new(chatops_service(&cfg, &kubectl, db), None, true));

    let destructive = [
        r#"{"command": "kubectl delete pod nginx", "explanation": "Remove the pod"}"#,
        r#"{"command": "KUBECTL -n default DELETE pod nginx", "explanation": "x"}"#,
        r#"{"command": "kubectl get pods; kubectl delete pod nginx", "explanation": "x"}"#,
        r#"{"command": "kubectl get pods && kubectl scale deploy web --replicas=0", "explanation": "x"}"#,
        r#"{"command": "kubectl get pods | sh", "explanation": "x"}"#,
        r#"{"command": "kubectl get pods $(rm -rf /)", "explanation": "x"}"#,
        r#"{"command": "kubectl --namespace=kube-system apply -f evil.yaml", "explanation": "x"}"#,
        r#"{"command": "rm -rf /", "explanation": "x"}"#,
        r#"{"command": "kubectl --cache-dir get certificate approve csr-1", "explanation": "x"}"#,
        r#"{"command": "kubectl --tls-server-name get certificate deny csr-1", "explanation": "x"}"#,
        r#"{"command": "kubectl get pods --profile=cpu --profile-output=/tmp/kubechat-profile", "explanation": "x"}"#,
        r#"{"command": "kubectl config view --raw", "explanation": "x"}"#,
    ];
    for reply in destructive {
        fake.set_reply(reply);
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/api/chat", r#"{"message":"do it"}"#))
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "success", "reply {reply}");
        assert_eq!(body["data"]["blocked"], true, "reply {reply}");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("❌ This command is not allowed for security reasons"),
            "reply {reply}"
        );
    }

    fake.set_reply(
        "```json\n{\"command\": \"kubectl get pods -n default\", \"explanation\": \"List pods\"}\n```",
    );
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/chat", r#"{"message":"show pods"}"#))
        .await
        .expect("request failed");
    let body = body_json(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["blocked"], false);
    assert_eq!(body["data"]["command"], "kubectl get pods -n default");
    assert!(body["message"].as_str().unwrap().contains("pod-a"));

    let last = fake.requests().pop().unwrap();
    assert_eq!(last["response_format"]["type"], "json_object");

    // Long reports come back whole but are stored shortened.
    fake.set_reply(r#"{"command": "kubectl get events -A", "explanation": "Recent events"}"#);
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/chat", r#"{"message":"what happened?"}"#))
        .await
        .expect("request failed");
    let cookie = common::cookie_header_from_set_cookie_headers(resp.headers());
    let body = body_json(resp).await;
    assert_eq!(body["status"], "success");
    let reply = body["message"].as_str().unwrap();
    assert!(reply.contains("event-0 ") && reply.contains("event-399 "));
    assert!(!reply.contains("[truncated,"));

    let resp = app
        .clone()
        .oneshot(with_cookie(
            Request::builder().uri("/api/history").body(Body::empty()).unwrap(),
            &cookie,
        ))
        .await
        .expect("request failed");
    let body = body_json(resp).await;
    let conversation = body["data"]["conversation"].as_array().unwrap();
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation[1]["role"], "assistant");
    let stored = conversation[1]["content"].as_str().unwrap();
    assert!(stored.contains("[truncated,"), "stored {stored}");
    assert!(stored.contains("event-399 "));
    assert!(stored.chars().count() < reply.chars().count() / 4);

    fake.set_reply("I am not sure what you mean.");
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/chat", r#"{"message":"???"}"#))
        .await
        .expect("request failed");
    let body = body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "NO_COMMAND");

    let calls = std::fs::read_to_string(&log).unwrap();
    for line in calls.lines() {
        let lowered = line.to_lowercase();
        assert!(!lowered.contains("delete"), "ran {line}");
        assert!(!lowered.contains("scale"), "ran {line}");
        assert!(!lowered.contains("apply"), "ran {line}");
        assert!(!lowered.contains("certificate"), "ran {line}");
        assert!(!lowered.contains("--profile"), "ran {line}");
        assert!(!lowered.contains("--raw"), "ran {line}");
    }
    assert!(calls.lines().any(|l| l == "get pods -n default"));

    // Cluster endpoints.
    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/api/k8s/status").body(Body::empty()).unwrap())
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["connected"], true);
    assert_eq!(body["active_context"], "kind-dev");
    assert_eq!(body["contexts"], serde_json::json!(["kind-dev", "kind-prod"]));
    assert_eq!(body["node_status"][0]["name"], "node-1");
    assert_eq!(body["node_status"][0]["ready"], "True");

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/k8s/switch-context", "{}"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "MISSING_CONTEXT");

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/k8s/switch-context",
            r#"{"context":"kind-staging"}"#,
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "INVALID_CONTEXT");

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/k8s/switch-context",
            r#"{"context":"kind-prod"}"#,
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["active_context"], "kind-prod");
}

#[tokio::test]
async fn missing_kubeconfig_reports_cluster_unreachable() {
    let fake = FakeUpstream::replying(r#"{"command": "kubectl get pods", "explanation": "x"}"#);
    let base = common::spawn_fake_openai(fake.clone()).await;
    let cfg = common::openai_config(&base);

    let kubectl = KubectlConfig {
        binary: PathBuf::from("/nonexistent/kubectl"),
        kubeconfig: Some(common::unique_path("no-kubeconfig", "yaml")),
        ..KubectlConfig::default()
    };
    let db = common::spawn_store("chatops-down").await;
    let app = kubechat_router(AppState::new(chatops_service(&cfg, &kubectl, db), None, true));

    let resp = app
        .oneshot(json_request("POST", "/api/chat", r#"{"message":"show pods"}"#))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "CLUSTER_UNREACHABLE");
    assert!(body["message"].as_str().unwrap().starts_with("❌ Cannot connect to cluster"));
    assert!(!body["data"]["suggested_actions"].as_array().unwrap().is_empty());

    // The model is never asked when the cluster is down.
    assert!(fake.requests().is_empty());
}

use moka::sync::Cache;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, error, info};
use url::Url;

use super::executor::Kubectl;
use crate::config::KubectlConfig;
use crate::error::KubeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub name: String,
    /// Status of the `Ready` condition (`True`, `False` or `Unknown`).
    pub ready: String,
    pub conditions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterStatus {
    pub connected: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub node_status: Vec<NodeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<String>,
}

impl ClusterStatus {
    fn disconnected(message: impl Into<String>, actions: &[&str]) -> Self {
        Self {
            connected: false,
            message: message.into(),
            suggested_actions: actions.iter().map(|a| (*a).to_string()).collect(),
            node_status: Vec::new(),
            active_context: None,
            api_server: None,
            kubeconfig: None,
        }
    }

    /// Chat-facing text for a failed connection check.
    pub fn connection_error_message(&self) -> String {
        format!(
            "❌ Cannot connect to cluster\nStatus: {}\nPlease verify:\n\
             - KUBECONFIG environment variable is set\n\
             - Cluster is running and accessible\n\
             - VPN/Network connectivity is active\n\
             - You have required permissions",
            self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextList {
    pub contexts: Vec<String>,
    pub active: Option<String>,
}

/// Connectivity checks and context management against the configured cluster.
#[derive(Clone)]
pub struct ClusterInspector {
    kubectl: Kubectl,
    kubeconfig: Option<PathBuf>,
    probe_timeout: Duration,
    command_timeout: Duration,
    cache: Option<Cache<(), Arc<ClusterStatus>>>,
}

impl ClusterInspector {
    pub fn new(cfg: &KubectlConfig, kubectl: Kubectl) -> Self {
        let ttl = cfg.status_cache_ttl();
        let cache = (!ttl.is_zero())
            .then(|| Cache::builder().max_capacity(1).time_to_live(ttl).build());

        Self {
            kubectl,
            kubeconfig: cfg.resolved_kubeconfig(),
            probe_timeout: cfg.status_timeout(),
            command_timeout: cfg.command_timeout(),
            cache,
        }
    }

    /// Cached for `status_cache_secs`; a switch of context drops the cached value.
    pub async fn status(&self) -> Arc<ClusterStatus> {
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(&())
        {
            return hit;
        }

        let status = Arc::new(self.probe().await);
        if let Some(cache) = &self.cache {
            cache.insert((), status.clone());
        }
        status
    }

    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&());
        }
    }

    async fn probe(&self) -> ClusterStatus {
        let kubeconfig = match &self.kubeconfig {
            Some(path) => tokio::fs::try_exists(path)
                .await
                .unwrap_or(false)
                .then_some(path),
            None => None,
        };
        let Some(kubeconfig) = kubeconfig else {
            let shown = self
                .kubeconfig
                .as_ref()
                .map_or_else(|| "<unresolved>".to_string(), |p| p.display().to_string());
            error!(kubeconfig = %shown, "Kubeconfig not found");
            return ClusterStatus::disconnected(
                format!("Kubeconfig not found at {shown}"),
                &[
                    "Set KUBECONFIG_PATH environment variable",
                    "Ensure kubeconfig file exists",
                    "Run 'kubectl config view' to verify configuration",
                ],
            );
        };

        let api_server = self
            .kubectl
            .stdout(
                [
                    "config",
                    "view",
                    "--minify",
                    "-o",
                    "jsonpath={.clusters[0].cluster.server}",
                ],
                self.probe_timeout,
            )
            .await
            .unwrap_or_default();
        if api_server.is_empty() {
            error!("Failed to retrieve API server URL from kubeconfig");
            return ClusterStatus::disconnected(
                "Failed to retrieve API server URL from kubeconfig",
                &[
                    "Check kubeconfig file for cluster details",
                    "Ensure the cluster is configured correctly",
                ],
            );
        }

        let Some((host, port)) = api_server_address(&api_server) else {
            error!(%api_server, "Unparseable API server URL");
            return ClusterStatus::disconnected(
                format!("Invalid API server URL in kubeconfig: {api_server}"),
                &["Check kubeconfig file for cluster details"],
            );
        };

        let reachable = tokio::time::timeout(
            self.probe_timeout,
            TcpStream::connect((host.as_str(), port)),
        )
        .await;
        if !matches!(reachable, Ok(Ok(_))) {
            error!(%host, port, "Cannot reach API server");
            return ClusterStatus::disconnected(
                format!("Cannot reach API server at {host}"),
                &[
                    "Check network connectivity",
                    "Verify VPN connection if required",
                    "Ensure API server is running",
                ],
            );
        }

        let node_status = match self.nodes().await {
            Ok(nodes) => nodes,
            Err(KubeError::CommandFailed { stderr, .. }) => {
                error!(stderr = %stderr.trim(), "Kubernetes API error");
                return ClusterStatus::disconnected(
                    format!("Kubernetes API error: {}", stderr.trim()),
                    &[
                        "Verify kubeconfig file",
                        "Check cluster credentials",
                        "Ensure cluster is running",
                    ],
                );
            }
            Err(e) => {
                error!(error = %e, "Unexpected error while checking cluster");
                return ClusterStatus::disconnected(
                    format!("Unexpected error: {e}"),
                    &[
                        "Check application logs for details",
                        "Verify network connectivity",
                        "Ensure cluster is accessible",
                    ],
                );
            }
        };

        let active_context = self.current_context().await;
        debug!(
            %api_server,
            nodes = node_status.len(),
            context = active_context.as_deref().unwrap_or("-"),
            "Cluster reachable"
        );

        ClusterStatus {
            connected: true,
            message: "Successfully connected to cluster".to_string(),
            suggested_actions: Vec::new(),
            node_status,
            active_context,
            api_server: Some(api_server),
            kubeconfig: Some(kubeconfig.display().to_string()),
        }
    }

    async fn nodes(&self) -> Result<Vec<NodeStatus>, KubeError> {
        let raw = self
            .kubectl
            .stdout(["get", "nodes", "-o", "json"], self.probe_timeout)
            .await?;
        parse_nodes(&raw)
    }

    async fn current_context(&self) -> Option<String> {
        self.kubectl
            .stdout(["config", "current-context"], self.probe_timeout)
            .await
            .ok()
            .filter(|c| !c.is_empty())
    }

    pub async fn contexts(&self) -> Result<ContextList, KubeError> {
        let raw = self
            .kubectl
            .stdout(["config", "get-contexts", "-o", "name"], self.command_timeout)
            .await?;
        let contexts = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        Ok(ContextList {
            contexts,
            active: self.current_context().await,
        })
    }

    /// Switch the kubeconfig's current context to a known context.
    pub async fn switch_context(&self, name: &str) -> Result<ContextList, KubeError> {
        let name = name.trim();
        validate_context_name(name)?;

        let known = self.contexts().await?;
        if !known.contexts.iter().any(|c| c == name) {
            return Err(KubeError::UnknownContext(name.to_string()));
        }

        self.kubectl
            .stdout(["config", "use-context", name], self.command_timeout)
            .await?;
        self.invalidate();
        info!(context = name, "Switched kubectl context");

        Ok(ContextList {
            contexts: known.contexts,
            active: Some(name.to_string()),
        })
    }
}

fn validate_context_name(name: &str) -> Result<(), KubeError> {
    if name.is_empty()
        || name.starts_with('-')
        || name.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(KubeError::InvalidContextName(name.to_string()));
    }
    Ok(())
}

/// `https://10.0.0.1:6443` -> `("10.0.0.1", 6443)`; the scheme's default port when none is given.
fn api_server_address(api_server: &str) -> Option<(String, u16)> {
    let url = Url::parse(api_server).ok()?;
    let host = url.host_str()?.trim_matches(['[', ']']).to_string();
    let port = url.port_or_known_default()?;
    Some((host, port))
}

fn parse_nodes(raw: &str) -> Result<Vec<NodeStatus>, KubeError> {
    let doc: Value = serde_json::from_str(raw)
        .map_err(|e| KubeError::Parse(format!("nodes json: {e}")))?;
    let items = doc
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| KubeError::Parse("nodes json has no `items` array".to_string()))?;

    Ok(items
        .iter()
        .map(|node| {
            let name = node
                .pointer("/metadata/name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>")
                .to_string();
            let conditions: BTreeMap<String, String> = node
                .pointer("/status/conditions")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|cond| {
                    Some((
                        cond.get("type")?.as_str()?.to_string(),
                        cond.get("status")?.as_str()?.to_string(),
                    ))
                })
                .collect();
            let ready = conditions
                .get("Ready")
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());
            NodeStatus {
                name,
                ready,
                conditions,
            }
        })
        .collect())
}

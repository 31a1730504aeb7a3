use async_trait::async_trait;
use kubechat_schema::openai::OpenaiMessage;
use kubechat_schema::{OllamaChatRequest, OllamaChatResponse, OllamaErrorBody, OllamaOptions};
use reqwest::header::HeaderMap;
use url::Url;

use super::upstream_retry::{Upstream, join_endpoint};
use super::{ChatProvider, CompletionRequest, non_empty};
use crate::config::{OllamaConfig, ProviderKind};
use crate::error::LlmError;

/// Self-hosted Ollama; no auth.
pub struct OllamaProvider {
    upstream: Upstream,
    url: Url,
    model: String,
}

impl OllamaProvider {
    pub(crate) fn new(cfg: &OllamaConfig, upstream: Upstream) -> Result<Self, LlmError> {
        let url = join_endpoint(ProviderKind::Ollama, &cfg.base_url, "api/chat")?;
        Ok(Self {
            upstream,
            url,
            model: cfg.model.clone(),
        })
    }

    fn build_body(&self, request: &CompletionRequest) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(OpenaiMessage::from).collect(),
            stream: false,
            format: request.json_mode.then(|| "json".to_string()),
            options: Some(OllamaOptions {
                temperature: Some(request.temperature),
                num_predict: Some(request.max_tokens),
            }),
        }
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = self.build_body(request);
        let resp: OllamaChatResponse = self
            .upstream
            .post_json::<_, _, OllamaErrorBody>(&self.url, HeaderMap::new(), &body)
            .await?;
        non_empty(ProviderKind::Ollama, resp.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvidersConfig;
    use kubechat_schema::ChatMessage;
    use serde_json::json;

    #[test]
    fn json_mode_maps_to_format_json() {
        let cfg = ProvidersConfig::default();
        let upstream = Upstream::new(
            ProviderKind::Ollama,
            reqwest::Client::new(),
            &cfg.upstream(ProviderKind::Ollama),
        );
        let p = OllamaProvider::new(&cfg.ollama, upstream).unwrap();
        assert_eq!(p.url.as_str(), "http://localhost:11434/api/chat");

        let plain = CompletionRequest::new(vec![ChatMessage::user("hi")], 128, 0.2);
        let body = serde_json::to_value(p.build_body(&plain)).unwrap();
        assert!(body.get("format").is_none());
        assert_eq!(body["options"]["num_predict"], json!(128));

        let body = serde_json::to_value(p.build_body(&plain.json())).unwrap();
        assert_eq!(body["format"], json!("json"));
        assert_eq!(body["stream"], json!(false));
    }
}

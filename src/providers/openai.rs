use async_trait::async_trait;
use kubechat_schema::openai::{OpenaiMessage, ResponseFormat};
use kubechat_schema::{OpenaiChatRequest, OpenaiChatResponse, OpenaiErrorBody};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

use super::upstream_retry::{Upstream, join_endpoint};
use super::{ChatProvider, CompletionRequest, non_empty};
use crate::config::{OpenaiCompatConfig, ProviderKind};
use crate::error::LlmError;

/// OpenAI chat completions with bearer auth. Also serves DeepSeek.
pub struct OpenaiCompatProvider {
    upstream: Upstream,
    url: Url,
    api_key: String,
    model: String,
}

impl OpenaiCompatProvider {
    pub(crate) fn new(cfg: &OpenaiCompatConfig, upstream: Upstream) -> Result<Self, LlmError> {
        let url = join_endpoint(upstream.provider(), &cfg.base_url, "chat/completions")?;
        Ok(Self {
            upstream,
            url,
            api_key: cfg.api_key.clone().unwrap_or_default(),
            model: cfg.model.clone(),
        })
    }

    fn build_body(&self, request: &CompletionRequest) -> OpenaiChatRequest {
        OpenaiChatRequest {
            model: Some(self.model.clone()),
            messages: request.messages.iter().map(OpenaiMessage::from).collect(),
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
            top_p: None,
            seed: None,
            response_format: request.json_mode.then(ResponseFormat::json_object),
            stream: false,
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key.trim())) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }
}

#[async_trait]
impl ChatProvider for OpenaiCompatProvider {
    fn kind(&self) -> ProviderKind {
        self.upstream.provider()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = self.build_body(request);
        let resp: OpenaiChatResponse = self
            .upstream
            .post_json::<_, _, OpenaiErrorBody>(&self.url, self.headers(), &body)
            .await?;
        non_empty(self.kind(), resp.first_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvidersConfig;
    use kubechat_schema::ChatMessage;
    use serde_json::json;

    fn provider(kind: ProviderKind) -> OpenaiCompatProvider {
        let cfg = ProvidersConfig::default();
        let compat = match kind {
            ProviderKind::Deepseek => &cfg.deepseek,
            _ => &cfg.openai,
        };
        let upstream = Upstream::new(kind, reqwest::Client::new(), &cfg.upstream(kind));
        OpenaiCompatProvider::new(compat, upstream).unwrap()
    }

    #[test]
    fn deepseek_targets_its_own_base_url() {
        let p = provider(ProviderKind::Deepseek);
        assert_eq!(p.url.as_str(), "https://api.deepseek.com/v1/chat/completions");
        assert_eq!(p.model(), "deepseek-chat");
    }

    #[test]
    fn json_mode_sets_response_format() {
        let p = provider(ProviderKind::Openai);
        let req = CompletionRequest::new(vec![ChatMessage::user("list pods")], 300, 0.7).json();
        let body = serde_json::to_value(p.build_body(&req)).unwrap();

        assert_eq!(body["model"], json!("gpt-4o-mini"));
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["messages"][0], json!({"role": "user", "content": "list pods"}));
    }
}

use async_trait::async_trait;
use kubechat_schema::{AnthropicErrorBody, AnthropicMessagesRequest, AnthropicMessagesResponse};
use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use super::upstream_retry::{Upstream, join_endpoint};
use super::{ChatProvider, CompletionRequest, non_empty};
use crate::config::{ClaudeConfig, ProviderKind};
use crate::error::LlmError;

/// Anthropic Messages API. There is no JSON response mode, so `json_mode`
/// relies on the prompt alone.
pub struct ClaudeProvider {
    upstream: Upstream,
    url: Url,
    api_key: String,
    anthropic_version: String,
    model: String,
}

impl ClaudeProvider {
    pub(crate) fn new(cfg: &ClaudeConfig, upstream: Upstream) -> Result<Self, LlmError> {
        let url = join_endpoint(ProviderKind::Claude, &cfg.base_url, "v1/messages")?;
        Ok(Self {
            upstream,
            url,
            api_key: cfg.api_key.clone().unwrap_or_default(),
            anthropic_version: cfg.anthropic_version.clone(),
            model: cfg.model.clone(),
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(self.api_key.trim()) {
            headers.insert("x-api-key", value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.anthropic_version) {
            headers.insert("anthropic-version", value);
        }
        headers
    }
}

#[async_trait]
impl ChatProvider for ClaudeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = AnthropicMessagesRequest::from_messages(
            self.model.clone(),
            request.max_tokens,
            Some(request.temperature),
            &request.messages,
        );
        let resp: AnthropicMessagesResponse = self
            .upstream
            .post_json::<_, _, AnthropicErrorBody>(&self.url, self.headers(), &body)
            .await?;
        non_empty(ProviderKind::Claude, resp.text().as_deref())
    }
}

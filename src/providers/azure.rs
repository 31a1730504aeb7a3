use async_trait::async_trait;
use kubechat_schema::openai::{OpenaiMessage, ResponseFormat};
use kubechat_schema::{OpenaiChatRequest, OpenaiChatResponse, OpenaiErrorBody};
use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use super::upstream_retry::{Upstream, join_endpoint};
use super::{ChatProvider, CompletionRequest, non_empty};
use crate::config::{AzureConfig, ProviderKind};
use crate::error::LlmError;

/// Azure OpenAI: the deployment in the URL picks the model.
pub struct AzureProvider {
    upstream: Upstream,
    url: Url,
    api_key: String,
    deployment: String,
}

impl AzureProvider {
    pub(crate) fn new(cfg: &AzureConfig, upstream: Upstream) -> Result<Self, LlmError> {
        let provider = upstream.provider();
        let deployment = cfg.deployment.clone().unwrap_or_default();
        let endpoint = cfg.endpoint.as_ref().ok_or(LlmError::InvalidEndpoint {
            provider,
            source: url::ParseError::EmptyHost,
        })?;

        let mut url = join_endpoint(
            provider,
            endpoint,
            &format!("openai/deployments/{deployment}/chat/completions"),
        )?;
        url.query_pairs_mut()
            .append_pair("api-version", &cfg.api_version);

        Ok(Self {
            upstream,
            url,
            api_key: cfg.api_key.clone().unwrap_or_default(),
            deployment,
        })
    }

    fn build_body(&self, request: &CompletionRequest) -> OpenaiChatRequest {
        OpenaiChatRequest {
            model: None,
            messages: request.messages.iter().map(OpenaiMessage::from).collect(),
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
            top_p: Some(0.95),
            seed: Some(42),
            response_format: request.json_mode.then(ResponseFormat::json_object),
            stream: false,
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(self.api_key.trim()) {
            headers.insert("api-key", value);
        }
        headers
    }
}

#[async_trait]
impl ChatProvider for AzureProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Azure
    }

    fn model(&self) -> &str {
        &self.deployment
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = self.build_body(request);
        let resp: OpenaiChatResponse = self
            .upstream
            .post_json::<_, _, OpenaiErrorBody>(&self.url, self.headers(), &body)
            .await?;
        non_empty(ProviderKind::Azure, resp.first_text())
    }
}

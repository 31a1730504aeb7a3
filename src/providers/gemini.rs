use async_trait::async_trait;
use kubechat_schema::gemini::GenerationConfig;
use kubechat_schema::{GeminiErrorBody, GeminiGenerateRequest, GeminiGenerateResponse};
use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use super::upstream_retry::{Upstream, join_endpoint};
use super::{ChatProvider, CompletionRequest, non_empty};
use crate::config::{GeminiConfig, ProviderKind};
use crate::error::LlmError;

pub struct GeminiProvider {
    upstream: Upstream,
    url: Url,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub(crate) fn new(cfg: &GeminiConfig, upstream: Upstream) -> Result<Self, LlmError> {
        let url = join_endpoint(
            ProviderKind::Gemini,
            &cfg.base_url,
            &format!("v1beta/models/{}:generateContent", cfg.model),
        )?;
        Ok(Self {
            upstream,
            url,
            api_key: cfg.api_key.clone().unwrap_or_default(),
            model: cfg.model.clone(),
        })
    }

    fn build_body(&self, request: &CompletionRequest) -> GeminiGenerateRequest {
        let generation_config = GenerationConfig {
            max_output_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
            top_p: Some(0.95),
            top_k: Some(64),
            response_mime_type: request
                .json_mode
                .then(|| "application/json".to_string()),
        };
        GeminiGenerateRequest::from_messages(&request.messages, generation_config)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(self.api_key.trim()) {
            headers.insert("x-goog-api-key", value);
        }
        headers
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = self.build_body(request);
        let resp: GeminiGenerateResponse = self
            .upstream
            .post_json::<_, _, GeminiErrorBody>(&self.url, self.headers(), &body)
            .await?;

        if resp.candidates.is_empty()
            && let Some(feedback) = &resp.prompt_feedback
        {
            tracing::warn!(%feedback, "[gemini] prompt produced no candidates");
        }
        non_empty(ProviderKind::Gemini, resp.text().as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvidersConfig;
    use kubechat_schema::ChatMessage;
    use serde_json::json;

    #[test]
    fn request_uses_generate_content_and_json_mime() {
        let cfg = ProvidersConfig::default();
        let upstream = Upstream::new(
            ProviderKind::Gemini,
            reqwest::Client::new(),
            &cfg.upstream(ProviderKind::Gemini),
        );
        let p = GeminiProvider::new(&cfg.gemini, upstream).unwrap();
        assert_eq!(
            p.url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );

        let req = CompletionRequest::new(
            vec![ChatMessage::system("sys"), ChatMessage::user("nodes?")],
            300,
            0.7,
        )
        .json();
        let body = serde_json::to_value(p.build_body(&req)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], json!("sys"));
        assert_eq!(body["generationConfig"]["responseMimeType"], json!("application/json"));
        assert_eq!(body["generationConfig"]["topK"], json!(64));
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }
}

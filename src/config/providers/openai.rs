use serde::{Deserialize, Serialize};
use url::Url;

use super::UpstreamOverrides;

/// Any endpoint speaking the OpenAI chat completions API with bearer auth.
/// Used for both `providers.openai` and `providers.deepseek`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenaiCompatConfig {
    /// Base URL; `chat/completions` is appended.
    /// Default: `https://api.openai.com/v1/` (openai), `https://api.deepseek.com/v1/` (deepseek).
    pub base_url: Url,

    /// Env: `OPENAI_API_KEY` / `DEEPSEEK_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Env: `OPENAI_MODEL` / `DEEPSEEK_MODEL`.
    pub model: String,

    #[serde(flatten)]
    pub upstream: UpstreamOverrides,
}

impl OpenaiCompatConfig {
    pub fn openai() -> Self {
        Self {
            base_url: Url::parse("https://api.openai.com/v1/").expect("valid OpenAI base URL"),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            upstream: UpstreamOverrides::default(),
        }
    }

    pub fn deepseek() -> Self {
        Self {
            base_url: Url::parse("https://api.deepseek.com/v1/").expect("valid DeepSeek base URL"),
            api_key: None,
            model: "deepseek-chat".to_string(),
            upstream: UpstreamOverrides::default(),
        }
    }
}

use serde::{Deserialize, Serialize};
use url::Url;

use super::UpstreamOverrides;

/// Google Generative Language API (API key auth).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    /// Default: `https://generativelanguage.googleapis.com/`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Env: `GEMINI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Env: `GEMINI_MODEL`. Default: `gemini-1.5-flash`.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(flatten)]
    pub upstream: UpstreamOverrides,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            upstream: UpstreamOverrides::default(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("https://generativelanguage.googleapis.com/").expect("valid Gemini base URL")
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

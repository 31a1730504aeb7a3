use serde::{Deserialize, Serialize};
use url::Url;

use super::UpstreamOverrides;

/// Self-hosted Ollama server. No credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    /// Env: `OLLAMA_BASE_URL`. Default: `http://localhost:11434/`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Env: `OLLAMA_MODEL`. Default: `llama3.1`.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(flatten)]
    pub upstream: UpstreamOverrides,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            upstream: UpstreamOverrides::default(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("http://localhost:11434/").expect("valid Ollama base URL")
}

fn default_model() -> String {
    "llama3.1".to_string()
}

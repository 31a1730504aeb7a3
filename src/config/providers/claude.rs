use serde::{Deserialize, Serialize};
use url::Url;

use super::UpstreamOverrides;

/// Anthropic Messages API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClaudeConfig {
    /// Default: `https://api.anthropic.com/`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Env: `CLAUDE_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Env: `CLAUDE_MODEL`.
    #[serde(default = "default_model")]
    pub model: String,

    /// Value of the `anthropic-version` header. Default: `2023-06-01`.
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    #[serde(flatten)]
    pub upstream: UpstreamOverrides,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            anthropic_version: default_anthropic_version(),
            upstream: UpstreamOverrides::default(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("https://api.anthropic.com/").expect("valid Anthropic base URL")
}

fn default_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}

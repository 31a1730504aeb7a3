mod azure;
mod claude;
mod gemini;
mod ollama;
mod openai;

pub use azure::AzureConfig;
pub use claude::ClaudeConfig;
pub use gemini::GeminiConfig;
pub use ollama::OllamaConfig;
pub use openai::OpenaiCompatConfig;

use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, time::Duration};
use url::Url;

use super::ConfigError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Openai,
    Azure,
    Gemini,
    Claude,
    Deepseek,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Openai => "openai",
            ProviderKind::Azure => "azure",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
            ProviderKind::Deepseek => "deepseek",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Case-insensitive, accepting the aliases older `.env` files used.
    pub fn parse_lax(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(ProviderKind::Openai),
            "azure" | "azure_openai" | "azure-openai" => Some(ProviderKind::Azure),
            "gemini" | "google" => Some(ProviderKind::Gemini),
            "claude" | "anthropic" => Some(ProviderKind::Claude),
            "deepseek" => Some(ProviderKind::Deepseek),
            "ollama" => Some(ProviderKind::Ollama),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ProviderKind::parse_lax(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown provider `{raw}` (expected openai, azure, gemini, claude, deepseek or ollama)"
            ))
        })
    }
}

/// Global provider defaults (used when provider-level config is unset).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderDefaults {
    /// Optional upstream HTTP proxy. If set, used for reqwest clients.
    /// TOML: `providers.defaults.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Max retry attempts for upstream calls (5xx and transport errors only).
    /// TOML: `providers.defaults.retry_max_times`. Default: `2`.
    #[serde(default = "default_retry_max_times")]
    pub retry_max_times: usize,

    /// Whole-request timeout for one upstream call.
    /// TOML: `providers.defaults.timeout_secs`. Default: `60`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Outbound request budget shared by all chat sessions.
    /// TOML: `providers.defaults.requests_per_second`. Default: `5`.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for ProviderDefaults {
    fn default() -> Self {
        Self {
            proxy: None,
            retry_max_times: default_retry_max_times(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Per-provider overrides of [`ProviderDefaults`]; flattened into each provider table.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct UpstreamOverrides {
    #[serde(default)]
    pub proxy: Option<Url>,

    #[serde(default)]
    pub retry_max_times: Option<usize>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Effective upstream settings for one provider.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub proxy: Option<Url>,
    pub retry_max_times: usize,
    pub timeout: Duration,
    pub requests_per_second: u32,
}

impl UpstreamOverrides {
    pub fn resolve(&self, defaults: &ProviderDefaults) -> UpstreamSettings {
        UpstreamSettings {
            proxy: self.proxy.clone().or_else(|| defaults.proxy.clone()),
            retry_max_times: self.retry_max_times.unwrap_or(defaults.retry_max_times),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(defaults.timeout_secs)),
            requests_per_second: defaults.requests_per_second,
        }
    }
}

/// All provider configurations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Provider used for every chat request.
    /// TOML: `providers.active`. Env: `MODEL_PROVIDER`. Default: `openai`.
    #[serde(default)]
    pub active: ProviderKind,

    /// Global defaults for providers (overridden per provider if set).
    #[serde(default)]
    pub defaults: ProviderDefaults,

    #[serde(default = "OpenaiCompatConfig::openai")]
    pub openai: OpenaiCompatConfig,

    #[serde(default)]
    pub azure: AzureConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub claude: ClaudeConfig,

    #[serde(default = "OpenaiCompatConfig::deepseek")]
    pub deepseek: OpenaiCompatConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            active: ProviderKind::default(),
            defaults: ProviderDefaults::default(),
            openai: OpenaiCompatConfig::openai(),
            azure: AzureConfig::default(),
            gemini: GeminiConfig::default(),
            claude: ClaudeConfig::default(),
            deepseek: OpenaiCompatConfig::deepseek(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl ProvidersConfig {
    pub fn upstream(&self, kind: ProviderKind) -> UpstreamSettings {
        let overrides = match kind {
            ProviderKind::Openai => &self.openai.upstream,
            ProviderKind::Azure => &self.azure.upstream,
            ProviderKind::Gemini => &self.gemini.upstream,
            ProviderKind::Claude => &self.claude.upstream,
            ProviderKind::Deepseek => &self.deepseek.upstream,
            ProviderKind::Ollama => &self.ollama.upstream,
        };
        overrides.resolve(&self.defaults)
    }

    pub(in crate::config) fn validate_active(&self) -> Result<(), ConfigError> {
        let provider = self.active;
        let missing = |field: &'static str| ConfigError::MissingField { provider, field };

        match provider {
            ProviderKind::Openai => require(self.openai.api_key.as_deref()).ok_or(missing("api_key"))?,
            ProviderKind::Deepseek => {
                require(self.deepseek.api_key.as_deref()).ok_or(missing("api_key"))?;
            }
            ProviderKind::Gemini => require(self.gemini.api_key.as_deref()).ok_or(missing("api_key"))?,
            ProviderKind::Claude => require(self.claude.api_key.as_deref()).ok_or(missing("api_key"))?,
            ProviderKind::Azure => {
                self.azure.endpoint.as_ref().ok_or(missing("endpoint"))?;
                require(self.azure.api_key.as_deref()).ok_or(missing("api_key"))?;
                require(self.azure.deployment.as_deref()).ok_or(missing("deployment"))?;
            }
            ProviderKind::Ollama => {}
        }

        if self.defaults.requests_per_second == 0 {
            return Err(ConfigError::Invalid {
                field: "providers.defaults.requests_per_second",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn require(value: Option<&str>) -> Option<()> {
    value.filter(|v| !v.trim().is_empty()).map(|_| ())
}

fn default_retry_max_times() -> usize {
    2
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_requests_per_second() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_accepts_legacy_aliases() {
        assert_eq!(ProviderKind::parse_lax("Azure_OpenAI"), Some(ProviderKind::Azure));
        assert_eq!(ProviderKind::parse_lax(" CLAUDE "), Some(ProviderKind::Claude));
        assert_eq!(ProviderKind::parse_lax("bard"), None);
    }

    #[test]
    fn provider_override_wins_over_defaults() {
        let mut cfg = ProvidersConfig::default();
        cfg.defaults.proxy = Some(Url::parse("http://127.0.0.1:1080").unwrap());
        cfg.gemini.upstream.timeout_secs = Some(5);

        let gemini = cfg.upstream(ProviderKind::Gemini);
        assert_eq!(gemini.timeout, Duration::from_secs(5));
        assert_eq!(
            gemini.proxy.as_ref().map(Url::as_str),
            Some("http://127.0.0.1:1080/")
        );
        assert_eq!(cfg.upstream(ProviderKind::Ollama).timeout, Duration::from_secs(60));
    }

    #[test]
    fn azure_requires_endpoint_and_deployment() {
        let mut cfg = ProvidersConfig {
            active: ProviderKind::Azure,
            ..Default::default()
        };
        cfg.azure.api_key = Some("k".to_string());
        assert!(matches!(
            cfg.validate_active(),
            Err(ConfigError::MissingField { field: "endpoint", .. })
        ));

        cfg.azure.endpoint = Some(Url::parse("https://example.openai.azure.com").unwrap());
        assert!(matches!(
            cfg.validate_active(),
            Err(ConfigError::MissingField { field: "deployment", .. })
        ));

        cfg.azure.deployment = Some("gpt-4o".to_string());
        assert!(cfg.validate_active().is_ok());
    }
}

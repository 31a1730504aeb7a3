use crate::config::{ProviderKind, ProvidersConfig, UpstreamSettings};
use crate::error::LlmError;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::upstream_retry::Upstream;
use super::{
    AzureProvider, ChatProvider, ClaudeProvider, GeminiProvider, OllamaProvider,
    OpenaiCompatProvider,
};

const USER_AGENT: &str = concat!("kubechat/", env!("CARGO_PKG_VERSION"));

/// HTTP client for one provider: 10s connect timeout, configured request
/// timeout, optional proxy, no redirects.
pub fn build_client(
    provider: ProviderKind,
    settings: &UpstreamSettings,
) -> Result<reqwest::Client, LlmError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(10))
        .timeout(settings.timeout);

    if let Some(proxy_url) = &settings.proxy {
        let proxy = reqwest::Proxy::all(proxy_url.as_str())
            .map_err(|source| LlmError::Transport { provider, source })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|source| LlmError::Transport { provider, source })
}

/// The provider selected by `providers.active`.
#[derive(Clone)]
pub struct Providers {
    pub active: Arc<dyn ChatProvider>,
}

impl Providers {
    pub fn from_config(cfg: &ProvidersConfig) -> Result<Self, LlmError> {
        let kind = cfg.active;
        let settings = cfg.upstream(kind);
        let upstream = Upstream::new(kind, build_client(kind, &settings)?, &settings);

        let active: Arc<dyn ChatProvider> = match kind {
            ProviderKind::Openai => Arc::new(OpenaiCompatProvider::new(&cfg.openai, upstream)?),
            ProviderKind::Deepseek => {
                Arc::new(OpenaiCompatProvider::new(&cfg.deepseek, upstream)?)
            }
            ProviderKind::Azure => Arc::new(AzureProvider::new(&cfg.azure, upstream)?),
            ProviderKind::Gemini => Arc::new(GeminiProvider::new(&cfg.gemini, upstream)?),
            ProviderKind::Claude => Arc::new(ClaudeProvider::new(&cfg.claude, upstream)?),
            ProviderKind::Ollama => Arc::new(OllamaProvider::new(&cfg.ollama, upstream)?),
        };

        // Log resolved provider config here so `main` stays wiring-only.
        info!(
            provider = %kind,
            model = active.model(),
            proxy = %settings.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
            retry_max_times = settings.retry_max_times,
            timeout_secs = settings.timeout.as_secs(),
            requests_per_second = settings.requests_per_second,
            "LLM provider config (effective)"
        );

        Ok(Self { active })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_active_provider() {
        let cfg = ProvidersConfig {
            active: ProviderKind::Ollama,
            ..Default::default()
        };
        let providers = Providers::from_config(&cfg).unwrap();
        assert_eq!(providers.active.kind(), ProviderKind::Ollama);
        assert_eq!(providers.active.model(), "llama3.1");
    }

    #[test]
    fn deepseek_reports_its_own_kind() {
        let cfg = ProvidersConfig {
            active: ProviderKind::Deepseek,
            ..Default::default()
        };
        let providers = Providers::from_config(&cfg).unwrap();
        assert_eq!(providers.active.kind(), ProviderKind::Deepseek);
    }
}

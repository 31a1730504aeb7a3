mod assistant;
mod basic;
mod kubectl;
mod providers;

pub use assistant::{AssistantConfig, AssistantMode};
pub use basic::BasicConfig;
pub use kubectl::KubectlConfig;
pub use providers::{
    AzureConfig, ClaudeConfig, GeminiConfig, OllamaConfig, OpenaiCompatConfig, ProviderDefaults,
    ProviderKind, ProvidersConfig, UpstreamOverrides, UpstreamSettings,
};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
    value::Uncased,
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};
use thiserror::Error as ThisError;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Conversation behaviour (see `assistant` table in config.toml).
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// LLM provider selection and upstream settings (see `providers` table in config.toml).
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// kubectl invocation settings (see `kubectl` table in config.toml).
    #[serde(default)]
    pub kubectl: KubectlConfig,
}

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to extract configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("provider `{provider}` requires `{field}` to be set")]
    MissingField {
        provider: ProviderKind,
        field: &'static str,
    },

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "KUBECHAT_";

/// Legacy `.env` variable names, mapped to config keys.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("model_provider", "providers.active"),
    ("log_level", "basic.loglevel"),
    ("openai_api_key", "providers.openai.api_key"),
    ("openai_model", "providers.openai.model"),
    ("azure_openai_endpoint", "providers.azure.endpoint"),
    ("azure_openai_api_key", "providers.azure.api_key"),
    ("azure_openai_api_version", "providers.azure.api_version"),
    ("azure_openai_deployment_name", "providers.azure.deployment"),
    ("gemini_api_key", "providers.gemini.api_key"),
    ("gemini_model", "providers.gemini.model"),
    ("claude_api_key", "providers.claude.api_key"),
    ("claude_model", "providers.claude.model"),
    ("deepseek_api_key", "providers.deepseek.api_key"),
    ("deepseek_model", "providers.deepseek.model"),
    ("ollama_base_url", "providers.ollama.base_url"),
    ("ollama_model", "providers.ollama.model"),
    ("kubeconfig_path", "kubectl.kubeconfig"),
];

fn legacy_env() -> Env {
    Env::raw()
        .filter_map(|key| {
            LEGACY_ENV_KEYS
                .iter()
                .find(|(legacy, _)| key.as_str().eq_ignore_ascii_case(legacy))
                .map(|(_, mapped)| Uncased::from(*mapped))
        })
}

impl Config {
    /// Builds a Figment that merges, in increasing priority: defaults, the optional
    /// `config.toml`, legacy `.env` names, then `KUBECHAT_SECTION__FIELD` variables.
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment
            .merge(legacy_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(|e| ConfigError::from(Box::new(e)))
    }

    /// Loads configuration, panicking on malformed input. Used by the global `CONFIG`.
    pub fn from_optional_toml() -> Self {
        Self::load().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml + env): {err}")
        })
    }

    /// Checks that the active provider has everything it needs to make a request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.providers.validate_active()?;
        self.kubectl.validate()?;
        if self.assistant.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "assistant.max_tokens",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_for_ollama_only() {
        let mut cfg = Config::default();
        cfg.providers.active = ProviderKind::Ollama;
        assert!(cfg.validate().is_ok());

        cfg.providers.active = ProviderKind::Openai;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                provider: ProviderKind::Openai,
                field: "api_key"
            }
        ));
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                listen_port = 8080

                [providers]
                active = "DeepSeek"

                [providers.deepseek]
                api_key = "sk-test"
                retry_max_times = 5
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(cfg.basic.listen_port, 8080);
        assert_eq!(cfg.providers.active, ProviderKind::Deepseek);
        assert_eq!(cfg.providers.deepseek.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.providers.deepseek.model, "deepseek-chat");
        assert_eq!(cfg.providers.upstream(ProviderKind::Deepseek).retry_max_times, 5);
        assert_eq!(cfg.providers.upstream(ProviderKind::Openai).retry_max_times, 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn legacy_env_names_map_onto_config_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MODEL_PROVIDER", "claude");
            jail.set_env("CLAUDE_API_KEY", "sk-ant");
            jail.set_env("KUBECHAT_BASIC__LISTEN_PORT", "7000");

            let cfg = Config::load().expect("config should load");
            assert_eq!(cfg.providers.active, ProviderKind::Claude);
            assert_eq!(cfg.providers.claude.api_key.as_deref(), Some("sk-ant"));
            assert_eq!(cfg.basic.listen_port, 7000);
            Ok(())
        });
    }
}

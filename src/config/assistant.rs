use serde::{Deserialize, Serialize};
use std::fmt;

/// Which conversational front-end the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    /// Kubernetes Q&A: the model answers directly.
    Chatbot,
    /// Natural language to read-only `kubectl`, executed and reported back.
    #[default]
    Chatops,
}

impl fmt::Display for AssistantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantMode::Chatbot => f.write_str("chatbot"),
            AssistantMode::Chatops => f.write_str("chatops"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantConfig {
    /// TOML: `assistant.mode`. Default: `chatops`.
    #[serde(default)]
    pub mode: AssistantMode,

    /// Replaces the mode's built-in system prompt when set.
    /// TOML: `assistant.system_prompt`.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// TOML: `assistant.max_tokens`. Default: `300`.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// TOML: `assistant.temperature`. Default: `0.7`.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max prior user/assistant turns forwarded upstream with each request.
    /// TOML: `assistant.history_limit`. Default: `20`.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// ChatOps: kubectl reports longer than this are stored (and later
    /// forwarded as history) with their middle cut out. The reply itself is
    /// not shortened.
    /// TOML: `assistant.history_output_chars`. Default: `2000`.
    #[serde(default = "default_history_output_chars")]
    pub history_output_chars: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            mode: AssistantMode::default(),
            system_prompt: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            history_limit: default_history_limit(),
            history_output_chars: default_history_output_chars(),
        }
    }
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f32 {
    0.7
}

fn default_history_limit() -> usize {
    20
}

fn default_history_output_chars() -> usize {
    2000
}

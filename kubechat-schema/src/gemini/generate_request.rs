//! Gemini v1beta `models/{model}:generateContent` request body.

use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, ChatRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerateRequest {
    pub contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A single conversation turn or system instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `"user"` or `"model"`. Absent for `systemInstruction`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

impl Content {
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

impl GeminiGenerateRequest {
    /// Builds a request from provider-neutral messages.
    ///
    /// All system turns are merged (newline separated) into `systemInstruction`;
    /// assistant turns are sent with Gemini's `model` role.
    pub fn from_messages(messages: &[ChatMessage], generation_config: GenerationConfig) -> Self {
        let system_text = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let contents = messages
            .iter()
            .filter_map(|m| match m.role {
                ChatRole::System => None,
                ChatRole::User => Some(Content::text(Some("user"), m.content.clone())),
                ChatRole::Assistant => Some(Content::text(Some("model"), m.content.clone())),
            })
            .collect();

        Self {
            contents,
            system_instruction: (!system_text.is_empty()).then(|| Content::text(None, system_text)),
            generation_config: Some(generation_config),
        }
    }
}

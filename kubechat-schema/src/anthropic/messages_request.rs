//! Anthropic `POST /v1/messages` request body.

use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, ChatRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessagesRequest {
    pub model: String,

    pub max_tokens: u32,

    pub messages: Vec<AnthropicMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

impl AnthropicMessagesRequest {
    /// Hoists system turns into `system` and merges consecutive turns of the
    /// same role, since the Messages API requires strict user/assistant alternation.
    pub fn from_messages(
        model: impl Into<String>,
        max_tokens: u32,
        temperature: Option<f32>,
        messages: &[ChatMessage],
    ) -> Self {
        let system_text = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut turns: Vec<AnthropicMessage> = Vec::new();
        for msg in messages.iter().filter(|m| m.role != ChatRole::System) {
            let role = msg.role.as_str();
            match turns.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(&msg.content);
                }
                _ => turns.push(AnthropicMessage {
                    role: role.to_string(),
                    content: msg.content.clone(),
                }),
            }
        }

        Self {
            model: model.into(),
            max_tokens,
            messages: turns,
            system: (!system_text.is_empty()).then_some(system_text),
            temperature,
        }
    }
}

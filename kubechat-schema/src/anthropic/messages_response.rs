use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessagesResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub content: Vec<AnthropicContentBlock>,

    #[serde(default)]
    pub stop_reason: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicContentBlock {
    pub r#type: String,

    #[serde(default)]
    pub text: Option<String>,
}

impl AnthropicMessagesResponse {
    /// Concatenation of all `text` blocks.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter(|block| block.r#type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_skips_non_text_blocks() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "kubectl get pods"}
            ],
            "stop_reason": "end_turn"
        }"#;
        let resp: AnthropicMessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.text().as_deref(), Some("kubectl get pods"));
    }
}

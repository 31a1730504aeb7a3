use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ "command": "...", "explanation": "..." }` as produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCommand {
    pub command: String,
    pub explanation: String,
}

impl GeneratedCommand {
    /// Extract the command object from a model reply.
    ///
    /// Accepts a bare object, an object inside a Markdown code fence, or an
    /// object surrounded by prose. Both fields must be non-empty strings.
    pub fn parse(reply: &str) -> Option<Self> {
        let start = reply.find('{')?;
        let end = reply.rfind('}')?;
        if end < start {
            return None;
        }

        let value: Value = serde_json::from_str(&reply[start..=end]).ok()?;
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            command: field("command")?,
            explanation: field("explanation")?,
        })
    }
}

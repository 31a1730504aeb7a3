use chrono::{DateTime, Utc};
use kubechat_schema::{ChatMessage, ChatRole};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::KubechatError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbMessage {
    pub id: i64,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl DbMessage {
    pub fn chat_role(&self) -> Result<ChatRole, KubechatError> {
        self.role.parse().map_err(|e: String| {
            KubechatError::CorruptRow(format!("conversations.id={}: {e}", self.id))
        })
    }

    pub fn to_chat_message(&self) -> Result<ChatMessage, KubechatError> {
        Ok(ChatMessage::new(self.chat_role()?, self.content.clone()))
    }
}

/// Row to insert; `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub session_id: String,
    pub role: ChatRole,
    pub content: String,
}

impl NewMessage {
    pub fn new(session_id: impl Into<String>, role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            role,
            content: content.into(),
        }
    }
}

//! SQL DDL for initializing the database schema.

/// SQLite schema includes:
/// - `conversations` table (one chat turn per row, grouped by `session_id`)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Conversation history (append-only per session, cleared on request)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS conversations (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    session_id TEXT NOT NULL,
    role TEXT NOT NULL, -- system | user | assistant
    content TEXT NOT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_conversations_session ON conversations(session_id, id);
"#;

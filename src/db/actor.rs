use crate::db::models::{DbMessage, NewMessage};
use crate::db::schema::SQLITE_INIT;
use crate::error::KubechatError;
use chrono::Utc;
use kubechat_schema::ChatRole;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Append one turn and return its id.
    Append(NewMessage, RpcReplyPort<Result<i64, KubechatError>>),

    /// Full history for a session, re-seeded when the system prompt changed.
    History {
        session_id: String,
        system_prompt: String,
        reply: RpcReplyPort<Result<Vec<DbMessage>, KubechatError>>,
    },

    /// Stored rows for a session as-is.
    List(String, RpcReplyPort<Result<Vec<DbMessage>, KubechatError>>),

    /// Delete every row of a session and return how many were removed.
    Clear(String, RpcReplyPort<Result<u64, KubechatError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn append(&self, message: NewMessage) -> Result<i64, KubechatError> {
        ractor::call!(self.actor, DbActorMessage::Append, message)
            .map_err(|e| KubechatError::RactorError(format!("DbActor Append RPC failed: {e}")))?
    }

    /// Returns the conversation for `session_id` with the system row first.
    ///
    /// If the latest stored system prompt differs from `system_prompt` (or there is
    /// none), the session is wiped and restarted with only the current prompt.
    pub async fn history(
        &self,
        session_id: &str,
        system_prompt: &str,
    ) -> Result<Vec<DbMessage>, KubechatError> {
        let session_id = session_id.to_string();
        let system_prompt = system_prompt.to_string();
        ractor::call!(self.actor, |reply| DbActorMessage::History {
            session_id,
            system_prompt,
            reply,
        })
        .map_err(|e| KubechatError::RactorError(format!("DbActor History RPC failed: {e}")))?
    }

    pub async fn list(&self, session_id: &str) -> Result<Vec<DbMessage>, KubechatError> {
        ractor::call!(self.actor, DbActorMessage::List, session_id.to_string())
            .map_err(|e| KubechatError::RactorError(format!("DbActor List RPC failed: {e}")))?
    }

    pub async fn clear(&self, session_id: &str) -> Result<u64, KubechatError> {
        ractor::call!(self.actor, DbActorMessage::Clear, session_id.to_string())
            .map_err(|e| KubechatError::RactorError(format!("DbActor Clear RPC failed: {e}")))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // `sqlite://db/conversations.db` needs `db/` to exist before the first connect.
        if let Some(parent) = connect_opts.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ActorProcessingErr::from(format!("db dir create failed: {e}")))?;
        }

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!(database_url = %database_url, "DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::Append(message, reply) => {
                let res = self.append(&state.pool, message).await;
                let _ = reply.send(res);
            }
            DbActorMessage::History {
                session_id,
                system_prompt,
                reply,
            } => {
                let res = self.history(&state.pool, &session_id, &system_prompt).await;
                let _ = reply.send(res);
            }
            DbActorMessage::List(session_id, reply) => {
                let res = self.list(&state.pool, &session_id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Clear(session_id, reply) => {
                let res = self.clear(&state.pool, &session_id).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn append(&self, pool: &SqlitePool, message: NewMessage) -> Result<i64, KubechatError> {
        let id: i64 = sqlx::query_scalar(
            r#"
        INSERT INTO conversations (session_id, role, content, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
        )
        .bind(message.session_id)
        .bind(message.role.as_str())
        .bind(message.content)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    async fn history(
        &self,
        pool: &SqlitePool,
        session_id: &str,
        system_prompt: &str,
    ) -> Result<Vec<DbMessage>, KubechatError> {
        let mut tx = pool.begin().await?;

        let latest_prompt: Option<String> = sqlx::query_scalar(
            r#"
        SELECT content
        FROM conversations
        WHERE session_id = ? AND role = 'system'
        ORDER BY id DESC
        LIMIT 1
        "#,
        )
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;

        if latest_prompt.as_deref() != Some(system_prompt) {
            let wiped = sqlx::query("DELETE FROM conversations WHERE session_id = ?")
                .bind(session_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            let seeded = sqlx::query_as::<_, DbMessage>(
                r#"
            INSERT INTO conversations (session_id, role, content, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, session_id, role, content, created_at
            "#,
            )
            .bind(session_id)
            .bind(ChatRole::System.as_str())
            .bind(system_prompt)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            debug!(
                session_id,
                wiped,
                had_prompt = latest_prompt.is_some(),
                "Conversation (re)seeded with current system prompt"
            );
            return Ok(vec![seeded]);
        }

        let mut rows = sqlx::query_as::<_, DbMessage>(
            r#"
        SELECT id, session_id, role, content, created_at
        FROM conversations
        WHERE session_id = ?
        ORDER BY id
        "#,
        )
        .bind(session_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        // Stable: keeps chronological order within each group.
        rows.sort_by_key(|row| row.role != ChatRole::System.as_str());
        Ok(rows)
    }

    async fn list(&self, pool: &SqlitePool, session_id: &str) -> Result<Vec<DbMessage>, KubechatError> {
        let rows = sqlx::query_as::<_, DbMessage>(
            r#"
        SELECT id, session_id, role, content, created_at
        FROM conversations
        WHERE session_id = ?
        ORDER BY id
        "#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn clear(&self, pool: &SqlitePool, session_id: &str) -> Result<u64, KubechatError> {
        let deleted = sqlx::query("DELETE FROM conversations WHERE session_id = ?")
            .bind(session_id)
            .execute(pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, KubechatError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| KubechatError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), KubechatError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

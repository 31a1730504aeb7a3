use kubechat_schema::{ChatEnvelope, ChatMessage, ChatRole};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::command::GeneratedCommand;
use super::prompts::{COMMAND_INSTRUCTION, system_prompt};
use crate::config::{AssistantConfig, AssistantMode};
use crate::db::{DbActorHandle, DbMessage, NewMessage};
use crate::error::ChatError;
use crate::kube::{ClusterInspector, KubectlExecutor, truncate_output};
use crate::providers::{ChatProvider, CompletionRequest, body_preview};

pub const EMPTY_MESSAGE: &str = "⚠️ Empty message received";
pub const NO_COMMAND_MESSAGE: &str =
    "⚠️ Could not generate a valid Kubernetes command. Please try rephrasing your question.";

#[derive(Clone)]
enum Flow {
    Chatbot,
    Chatops {
        executor: KubectlExecutor,
        cluster: ClusterInspector,
    },
}

/// One chat turn end to end: history, provider call, optional kubectl run, persistence.
#[derive(Clone)]
pub struct ChatService {
    store: DbActorHandle,
    provider: Arc<dyn ChatProvider>,
    flow: Flow,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
    history_limit: usize,
    history_output_chars: usize,
}

impl ChatService {
    pub fn chatbot(cfg: &AssistantConfig, store: DbActorHandle, provider: Arc<dyn ChatProvider>) -> Self {
        Self::with_flow(cfg, store, provider, Flow::Chatbot)
    }

    pub fn chatops(
        cfg: &AssistantConfig,
        store: DbActorHandle,
        provider: Arc<dyn ChatProvider>,
        executor: KubectlExecutor,
        cluster: ClusterInspector,
    ) -> Self {
        Self::with_flow(cfg, store, provider, Flow::Chatops { executor, cluster })
    }

    fn with_flow(
        cfg: &AssistantConfig,
        store: DbActorHandle,
        provider: Arc<dyn ChatProvider>,
        flow: Flow,
    ) -> Self {
        Self {
            store,
            provider,
            flow,
            system_prompt: system_prompt(cfg),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            history_limit: cfg.history_limit,
            history_output_chars: cfg.history_output_chars,
        }
    }

    pub fn mode(&self) -> AssistantMode {
        match self.flow {
            Flow::Chatbot => AssistantMode::Chatbot,
            Flow::Chatops { .. } => AssistantMode::Chatops,
        }
    }

    pub fn cluster(&self) -> Option<&ClusterInspector> {
        match &self.flow {
            Flow::Chatbot => None,
            Flow::Chatops { cluster, .. } => Some(cluster),
        }
    }

    pub async fn handle_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatEnvelope, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(ChatEnvelope::error("EMPTY_MESSAGE", EMPTY_MESSAGE));
        }

        let started = Instant::now();
        let reply = match &self.flow {
            Flow::Chatbot => self.answer(session_id, message).await,
            Flow::Chatops { executor, cluster } => {
                self.operate(session_id, message, executor, cluster).await
            }
        };

        debug!(
            session_id,
            mode = %self.mode(),
            provider = self.provider.name(),
            ok = reply.as_ref().is_ok_and(ChatEnvelope::is_success),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat turn finished"
        );
        reply
    }

    async fn answer(&self, session_id: &str, message: &str) -> Result<ChatEnvelope, ChatError> {
        let mut messages = self.prompt_history(session_id).await?;
        messages.push(ChatMessage::user(message));

        let request = CompletionRequest::new(messages, self.max_tokens, self.temperature);
        let answer = self.provider.complete(&request).await?;

        self.save_turn(session_id, message, &answer).await?;
        let conversation = self.conversation(session_id).await?;

        Ok(ChatEnvelope::success(answer.clone()).with_data(json!({
            "response": answer,
            "conversation": conversation,
        })))
    }

    async fn operate(
        &self,
        session_id: &str,
        message: &str,
        executor: &KubectlExecutor,
        cluster: &ClusterInspector,
    ) -> Result<ChatEnvelope, ChatError> {
        let status = cluster.status().await;
        if !status.connected {
            warn!(session_id, status = %status.message, "Cluster connection failed");
            return Ok(
                ChatEnvelope::error("CLUSTER_UNREACHABLE", status.connection_error_message())
                    .with_data(json!({ "suggested_actions": status.suggested_actions })),
            );
        }

        let mut messages = self.prompt_history(session_id).await?;
        messages.push(ChatMessage::system(COMMAND_INSTRUCTION));
        messages.push(ChatMessage::user(message));

        let request = CompletionRequest::new(messages, self.max_tokens, self.temperature).json();
        let reply = self.provider.complete(&request).await?;

        let Some(generated) = GeneratedCommand::parse(&reply) else {
            warn!(session_id, reply = %body_preview(&reply), "Model reply had no usable command");
            return Ok(ChatEnvelope::error("NO_COMMAND", NO_COMMAND_MESSAGE));
        };
        info!(
            session_id,
            command = %generated.command,
            explanation = %generated.explanation,
            "Generated kubectl command"
        );

        let report = executor.execute_line(&generated.command).await;
        let stored = truncate_output(&report.message, self.history_output_chars);
        self.save_turn(session_id, message, &stored).await?;

        Ok(ChatEnvelope::success(report.message.clone()).with_data(json!({
            "command": generated.command,
            "explanation": generated.explanation,
            "result": report.message,
            "blocked": report.blocked,
        })))
    }

    /// System prompt plus the most recent `history_limit` turns.
    async fn prompt_history(&self, session_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
        let rows = self.store.history(session_id, &self.system_prompt).await?;
        Ok(trim_history(to_messages(&rows)?, self.history_limit))
    }

    async fn save_turn(&self, session_id: &str, user: &str, assistant: &str) -> Result<(), ChatError> {
        self.store
            .append(NewMessage::new(session_id, ChatRole::User, user))
            .await?;
        self.store
            .append(NewMessage::new(session_id, ChatRole::Assistant, assistant))
            .await?;
        Ok(())
    }

    /// User and assistant turns of a session, oldest first.
    pub async fn conversation(&self, session_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
        let rows = self.store.list(session_id).await?;
        Ok(to_messages(&rows)?
            .into_iter()
            .filter(|m| m.role != ChatRole::System)
            .collect())
    }

    pub async fn clear(&self, session_id: &str) -> Result<u64, ChatError> {
        let deleted = self.store.clear(session_id).await?;
        info!(session_id, deleted, "Conversation cleared");
        Ok(deleted)
    }
}

fn to_messages(rows: &[DbMessage]) -> Result<Vec<ChatMessage>, crate::error::KubechatError> {
    rows.iter().map(DbMessage::to_chat_message).collect()
}

/// Keep every system turn and only the last `limit` other turns.
fn trim_history(messages: Vec<ChatMessage>, limit: usize) -> Vec<ChatMessage> {
    let (system, turns): (Vec<_>, Vec<_>) = messages
        .into_iter()
        .partition(|m| m.role == ChatRole::System);
    let skip = turns.len().saturating_sub(limit);
    system.into_iter().chain(turns.into_iter().skip(skip)).collect()
}

//! Chat flows on top of the store, the LLM provider and (in ChatOps mode) kubectl.

mod command;
mod prompts;
mod service;

pub use command::GeneratedCommand;
pub use prompts::{CHATBOT_SYSTEM_PROMPT, CHATOPS_SYSTEM_PROMPT, COMMAND_INSTRUCTION, system_prompt};
pub use service::{ChatService, EMPTY_MESSAGE, NO_COMMAND_MESSAGE};

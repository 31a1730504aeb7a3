mod envelope;
mod message;

pub use envelope::{ChatEnvelope, EnvelopeStatus};
pub use message::{ChatMessage, ChatRole};

mod chat;
mod kube;
mod kubechat;
mod llm;

pub use chat::ChatError;
pub use kube::{GuardRejection, KubeError};
pub use kubechat::KubechatError;
pub use llm::LlmError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

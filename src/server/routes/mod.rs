pub mod chat;
pub mod k8s;

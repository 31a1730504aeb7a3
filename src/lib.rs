pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod kube;
pub mod providers;
pub mod server;
pub(crate) mod utils;

pub use error::{ChatError, KubechatError};

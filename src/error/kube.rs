use std::time::Duration;
use thiserror::Error as ThisError;

/// Failure running or interpreting a `kubectl` subprocess.
#[derive(Debug, ThisError)]
pub enum KubeError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("kubectl timed out after {0:?}")]
    Timeout(Duration),

    #[error("kubectl exited with code {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("unexpected kubectl output: {0}")]
    Parse(String),

    #[error("invalid context name: {0:?}")]
    InvalidContextName(String),

    #[error("unknown context: {0}")]
    UnknownContext(String),
}

/// Why a generated command line was refused before anything ran.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum GuardRejection {
    #[error("the command is empty")]
    Empty,

    #[error("shell syntax `{0}` is not allowed")]
    ShellSyntax(String),

    #[error("unbalanced quotes")]
    UnbalancedQuotes,

    #[error("only kubectl commands may run, got `{0}`")]
    NotKubectl(String),

    #[error("`{0}` can modify the cluster")]
    Denied(String),

    #[error("`{0}` is not a read-only kubectl command")]
    NotAllowed(String),
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::ConfigError;

/// kubectl invocation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KubectlConfig {
    /// Binary name or path. TOML: `kubectl.binary`. Default: `kubectl`.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Explicit kubeconfig; `~/` is expanded. Unset means `$KUBECONFIG` or `~/.kube/config`.
    /// TOML: `kubectl.kubeconfig`.
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// TOML: `kubectl.command_timeout_secs`. Default: `30`.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Timeout for each probe of the cluster status check.
    /// TOML: `kubectl.status_timeout_secs`. Default: `5`.
    #[serde(default = "default_status_timeout_secs")]
    pub status_timeout_secs: u64,

    /// How long a cluster status result is reused. `0` disables caching.
    /// TOML: `kubectl.status_cache_secs`. Default: `10`.
    #[serde(default = "default_status_cache_secs")]
    pub status_cache_secs: u64,

    /// Command output beyond this many characters is cut in the middle.
    /// TOML: `kubectl.max_output_chars`. Default: `50000`.
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            kubeconfig: None,
            command_timeout_secs: default_command_timeout_secs(),
            status_timeout_secs: default_status_timeout_secs(),
            status_cache_secs: default_status_cache_secs(),
            max_output_chars: default_max_output_chars(),
        }
    }
}

impl KubectlConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    pub fn status_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.status_cache_secs)
    }

    /// Kubeconfig path the status check inspects: explicit setting, then
    /// `$KUBECONFIG` (first entry), then `~/.kube/config`.
    pub fn resolved_kubeconfig(&self) -> Option<PathBuf> {
        if let Some(path) = &self.kubeconfig {
            return Some(expand_home(path));
        }
        if let Some(from_env) = std::env::var_os("KUBECONFIG")
            && let Some(first) = std::env::split_paths(&from_env).next()
        {
            return Some(first);
        }
        home_dir().map(|home| home.join(".kube").join("config"))
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "kubectl.command_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.status_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "kubectl.status_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn expand_home(path: &std::path::Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("kubectl")
}

fn default_command_timeout_secs() -> u64 {
    30
}

fn default_status_timeout_secs() -> u64 {
    5
}

fn default_status_cache_secs() -> u64 {
    10
}

fn default_max_output_chars() -> usize {
    50_000
}

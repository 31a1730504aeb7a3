use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// HTTP server listen address (e.g., "0.0.0.0", "127.0.0.1").
    /// TOML: `basic.listen_addr`. Default: `0.0.0.0`.
    #[serde(default = "default_listen_ip")]
    pub listen_addr: IpAddr,

    /// HTTP server listen port.
    /// TOML: `basic.listen_port`. Default: `5000`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Database URL for the SQLite conversation store.
    /// TOML: `basic.database_url`. Default: `sqlite://db/conversations.db`.
    #[serde(default)]
    pub database_url: String,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default)]
    pub loglevel: String,

    /// Optional key required on `/api/*` requests. Empty disables inbound auth.
    /// TOML: `basic.api_key`.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub api_key: String,

    /// Directory served under `/static`.
    /// TOML: `basic.static_dir`. Default: `static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Allow the session cookie over plain HTTP. Set to `false` behind TLS.
    /// TOML: `basic.insecure_cookie`. Default: `true`.
    #[serde(default = "default_insecure_cookie")]
    pub insecure_cookie: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_ip(),
            listen_port: default_listen_port(),
            database_url: "sqlite://db/conversations.db".to_string(),
            loglevel: "info".to_string(),
            api_key: String::new(),
            static_dir: default_static_dir(),
            insecure_cookie: default_insecure_cookie(),
        }
    }
}

impl BasicConfig {
    /// Inbound key, if auth is enabled.
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for basic.api_key",
        )),
    }
}

/// Default IP address for the HTTP server listen address.
fn default_listen_ip() -> IpAddr {
    Ipv4Addr::new(0, 0, 0, 0).into()
}

/// Default port for the HTTP server.
fn default_listen_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_insecure_cookie() -> bool {
    true
}

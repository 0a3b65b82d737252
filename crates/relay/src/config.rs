//! Configuration for the relay.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Which ConnectionStore backing to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Key-value set held in process memory.
    Memory,
    /// Relational table in a sqlite file.
    Sqlite,
}

/// Which PushCapability transport to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushBackend {
    /// Sockets terminated by this process.
    Local,
    /// External gateway management API at the given endpoint.
    Gateway { endpoint: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_path: PathBuf,
    pub push_backend: PushBackend,
    pub push_timeout: Duration,
    pub outbound_buffer: usize,
    pub ping_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; `from_env` passes the process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let store_backend = match var("STORE_BACKEND").as_deref() {
            None | Some("sqlite") => StoreBackend::Sqlite,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };
        let database_path = var("DATABASE_PATH")
            .or_else(|| var("DATABASE_URL"))
            .map(|s| PathBuf::from(s.trim_start_matches("sqlite:")))
            .unwrap_or_else(|| PathBuf::from("./data/relay.db"));

        let push_backend = match var("PUSH_BACKEND").as_deref() {
            None | Some("local") => PushBackend::Local,
            Some("gateway") => {
                let endpoint = var("GATEWAY_ENDPOINT")
                    .filter(|e| !e.trim().is_empty())
                    .ok_or(ConfigError::Missing("GATEWAY_ENDPOINT"))?;
                PushBackend::Gateway {
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                }
            }
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "PUSH_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let push_timeout_ms: u64 = var("PUSH_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .unwrap_or(5000);
        let outbound_buffer: usize = var("OUTBOUND_BUFFER")
            .unwrap_or_else(|| "64".to_string())
            .parse()
            .unwrap_or(64)
            .max(1);
        let ping_interval_secs: u64 = var("PING_INTERVAL_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .unwrap_or(30)
            .max(1);

        Ok(Self {
            host,
            port,
            store_backend,
            database_path,
            push_backend,
            push_timeout: Duration::from_millis(push_timeout_ms),
            outbound_buffer,
            ping_interval: Duration::from_secs(ping_interval_secs),
        })
    }

    /// In-memory store, local push, short timeouts.
    pub fn for_test() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            store_backend: StoreBackend::Memory,
            database_path: PathBuf::from(":memory:"),
            push_backend: PushBackend::Local,
            push_timeout: Duration::from_millis(200),
            outbound_buffer: 8,
            ping_interval: Duration::from_secs(30),
        }
    }
}

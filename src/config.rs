//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The composition root in `main` turns
//! a [`GatewayConfig`] into explicitly constructed broker and gateway
//! instances; nothing here is global.

use std::net::SocketAddr;
use std::time::Duration;

use crate::store::{DEFAULT_HISTORY_CAPACITY, RetryPolicy};
use crate::transport::TransportKind;

/// Settings consumed by [`crate::service::NotificationBroker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Keep pushed notifications in the bounded history.
    pub persist: bool,
    /// Log every push at `info` (otherwise `debug`).
    pub enable_logging: bool,
    /// Maximum number of notifications kept in history.
    pub history_capacity: usize,
    /// Retry schedule for history writes.
    pub retry: RetryPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            persist: true,
            enable_logging: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            retry: RetryPolicy::default(),
        }
    }
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Broker settings.
    pub broker: BrokerConfig,

    /// Transport used to reach clients.
    pub transport: TransportKind,

    /// Outbound queue length per connected client.
    pub client_buffer: usize,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub log_json: bool,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`], or if `NOTIFY_TRANSPORT` names an unsupported
    /// transport.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: parse_env("NOTIFY_MAX_RETRIES", defaults.max_retries),
            base_delay: Duration::from_millis(parse_env(
                "NOTIFY_RETRY_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(parse_env(
                "NOTIFY_RETRY_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
            )),
        };

        let broker = BrokerConfig {
            persist: parse_env_bool("NOTIFY_PERSIST", true),
            enable_logging: parse_env_bool("NOTIFY_ENABLE_LOGGING", true),
            history_capacity: parse_env("NOTIFY_HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY),
            retry,
        };

        let transport: TransportKind = std::env::var("NOTIFY_TRANSPORT")
            .unwrap_or_else(|_| "websocket".to_string())
            .parse()?;

        let client_buffer = parse_env("NOTIFY_CLIENT_BUFFER", 256_usize).max(1);
        let log_json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            listen_addr,
            broker,
            transport,
            client_buffer,
            log_json,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_defaults_match_documented_values() {
        let cfg = BrokerConfig::default();
        assert!(cfg.persist);
        assert!(cfg.enable_logging);
        assert_eq!(cfg.history_capacity, 1000);
        assert_eq!(cfg.retry.max_retries, 3);
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        assert_eq!(parse_env("NOTIFY_TEST_SURELY_UNSET_KEY", 42_u32), 42);
        assert!(parse_env_bool("NOTIFY_TEST_SURELY_UNSET_KEY", true));
    }
}

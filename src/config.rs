use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::HANDLER_NAME;
use crate::error::{BridgeError, BridgeResult};

/// Broker connection settings
///
/// Every key is optional in the settings document; missing keys fall back to
/// the defaults below and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// List key the alert records are pushed onto
    pub channel: String,
    pub db: i64,

    /// Upper bound for a single connection attempt
    pub connect_timeout_ms: u64,

    /// Upper bound for a single list push
    pub publish_timeout_ms: u64,

    /// Delay between connection attempts while the broker is unreachable
    pub reconnect_interval_ms: u64,

    /// How often a live connection is probed
    pub heartbeat_interval_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 6379,
            channel: String::from("events"),
            db: 0,
            connect_timeout_ms: 5_000,
            publish_timeout_ms: 5_000,
            reconnect_interval_ms: 1_000,
            heartbeat_interval_ms: 30_000,
        }
    }
}

impl BrokerConfig {
    /// Resolve the broker settings from a host settings document
    ///
    /// Only the `flapjack` section is considered. When it is missing or not an
    /// object the defaults are returned unchanged.
    pub fn from_settings(settings: &serde_json::Value) -> BridgeResult<Self> {
        match settings.get(HANDLER_NAME) {
            Some(section) if section.is_object() => {
                serde_json::from_value(section.clone())
                    .map_err(|e| BridgeError::Config(format!("{HANDLER_NAME}: {e}")))
                    .inspect(|config| trace!("resolved broker config: {config:?}"))
            }
            _ => Ok(Self::default()),
        }
    }

    /// `host:port`, as used in log lines
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms.max(1))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }
}

pub fn read_settings_file(path: &str) -> anyhow::Result<serde_json::Value> {
    let file_content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid settings file provided!"))
        .inspect(|settings| trace!("loaded settings: {settings:?}"))
}

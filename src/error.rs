//! Error types for the bridge
//!
//! Connection trouble (`Connection`, `TransientIo`) feeds the reconnect state
//! machine and is never fatal. `Publish` is what a single event sees when it
//! could not be handed to the broker.

use thiserror::Error;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while shaping or delivering an event
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The broker could not be reached when opening a connection
    #[error("broker is not available on {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// A live connection failed mid-operation
    #[error("broker connection failed: {0}")]
    TransientIo(String),

    /// An event could not be handed to the broker
    #[error("failed to publish to '{channel}': {reason}")]
    Publish { channel: String, reason: String },

    /// The broker rejected a command on a healthy connection
    #[error("broker rejected command: {0}")]
    Broker(String),

    /// Alert record encoding failed
    #[error("alert serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid settings
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BridgeError {
    /// Create a connection error for the given endpoint
    pub fn connection(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a publish error for the given channel
    pub fn publish(channel: impl Into<String>, reason: impl ToString) -> Self {
        Self::Publish {
            channel: channel.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this failure means the connection itself is gone
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BridgeError::Connection { .. } | BridgeError::TransientIo(_)
        )
    }
}

impl From<redis::RedisError> for BridgeError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
            || err.is_timeout()
        {
            BridgeError::TransientIo(err.to_string())
        } else {
            BridgeError::Broker(err.to_string())
        }
    }
}

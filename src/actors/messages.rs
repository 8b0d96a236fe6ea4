//! Message types for the connection actor
//!
//! Commands go to the actor over its mpsc channel and carry a oneshot sender
//! for the reply. State changes are published the other way: the current state
//! through a watch channel, every transition on a broadcast channel.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::error::BridgeResult;

/// Lifecycle of the single broker connection
///
/// ```text
/// Disconnected → Connecting → Connected
///      ↑             │            │ I/O failure
///      └─────────────┘            ▼
///         attempt failed     Reconnecting ⟲ (attempt failed)
///                                 │
///                                 └──→ Connected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

/// Event published on every state change
///
/// Repeated failed reconnect attempts show up as `Reconnecting → Reconnecting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,

    /// Broker location (format: "host:port")
    pub endpoint: String,

    pub at: DateTime<Utc>,
}

/// Commands that can be sent to the ConnectionActor
#[derive(Debug)]
pub enum ConnectionCommand {
    /// Push one payload onto `channel`, followed by the sidecar marker
    Publish {
        channel: String,
        payload: String,
        respond_to: oneshot::Sender<BridgeResult<i64>>,
    },

    /// Get delivery statistics
    GetStats {
        respond_to: oneshot::Sender<ConnectionStats>,
    },

    /// Close the connection and stop the actor
    Shutdown,
}

/// Delivery statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Events pushed onto their channel
    pub published: u64,

    /// Publishes that did not reach the broker
    pub failed: u64,

    /// Delivered events whose sidecar marker push failed
    pub markers_lost: u64,

    /// Successful reconnects after a lost connection
    pub reconnects: u64,
}

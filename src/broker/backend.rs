//! Broker transport trait definitions

use async_trait::async_trait;

use crate::error::BridgeResult;

/// Opens connections to a queue broker
///
/// Implementations must be `Send + Sync` as the connector is owned by the
/// connection actor's task.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// Open a new connection, ready for pushes
    ///
    /// Fails with `BridgeError::Connection` when the broker is unreachable.
    /// The caller bounds the attempt with its own timeout.
    async fn connect(&self) -> BridgeResult<Box<dyn BrokerConnection>>;

    /// Human-readable broker location for log lines (e.g. `127.0.0.1:6379`)
    fn endpoint(&self) -> String;
}

/// One live connection to the broker
#[async_trait]
pub trait BrokerConnection: Send {
    /// Push `value` onto the head of the list `key`
    ///
    /// Returns the length of the list after the push.
    async fn push(&mut self, key: &str, value: &str) -> BridgeResult<i64>;

    /// Lightweight liveness probe
    async fn ping(&mut self) -> BridgeResult<()>;
}

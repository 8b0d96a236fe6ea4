//! Queue broker transports
//!
//! The connection supervisor talks to the broker only through the
//! [`BrokerConnector`] and [`BrokerConnection`] traits, so the reconnect
//! state machine can be driven against a real Redis server or an in-process
//! list store.
//!
//! ## Backends
//!
//! - **Redis** (default): list pushes over a multiplexed tokio connection
//! - **Memory**: in-process lists with an availability switch, for tests
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use flapjack_bridge::broker::{BrokerConnector, redis_queue::RedisConnector};
//! use flapjack_bridge::config::BrokerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let connector = RedisConnector::new(&BrokerConfig::default());
//!     let mut connection = connector.connect().await?;
//!     connection.push("events", "{}").await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod memory;
pub mod redis_queue;

pub use backend::{BrokerConnection, BrokerConnector};

/// Sidecar list receiving one marker per delivered event
pub const ACTIONS_KEY: &str = "events_actions";

/// Marker pushed onto [`ACTIONS_KEY`]
pub const ACTION_MARKER: &str = "+";

//! Forwards monitoring check results to a Flapjack-style Redis queue
//!
//! Each event is reshaped into an [`alert::AlertRecord`] by the
//! [`translator::EventTranslator`] and pushed onto the broker by the
//! connection actor in [`actors::connection`], which keeps the connection alive
//! across broker outages.

pub mod actors;
pub mod alert;
pub mod broker;
pub mod config;
pub mod error;
pub mod event;
pub mod pipe;
pub mod severity;
pub mod translator;
pub mod util;

pub use actors::connection::{ConnectionHandle, Unreachable};
pub use actors::messages::{ConnectionState, StateTransition};
pub use alert::AlertRecord;
pub use config::BrokerConfig;
pub use error::{BridgeError, BridgeResult};
pub use event::RawEvent;
pub use severity::SeverityTable;
pub use translator::{EventTranslator, HandlerResponse};

/// Handler name, also the settings section holding the broker config
pub const HANDLER_NAME: &str = "flapjack";

pub const HANDLER_DESCRIPTION: &str = "sends monitoring events to the flapjack redis queue";

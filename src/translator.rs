//! Event translation and hand-off
//!
//! One call per monitoring event: shape the alert record, encode it, and hand
//! it to the connection actor. The translator keeps no state between calls
//! besides the shared connection handle.

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::actors::connection::ConnectionHandle;
use crate::alert::AlertRecord;
use crate::error::BridgeResult;
use crate::event::RawEvent;
use crate::severity::SeverityTable;

/// Message reported back to the host pipeline after a successful hand-off
pub const ACKNOWLEDGMENT: &str = "sent an event to the flapjack redis queue";

/// Handler outcome in the host pipeline's convention (status 0 is success)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub message: String,
    pub status: i32,
}

impl HandlerResponse {
    fn sent() -> Self {
        Self {
            message: ACKNOWLEDGMENT.to_string(),
            status: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventTranslator {
    connection: ConnectionHandle,
    channel: String,
    severities: Arc<SeverityTable>,
}

impl EventTranslator {
    pub fn new(
        connection: ConnectionHandle,
        channel: impl Into<String>,
        severities: Arc<SeverityTable>,
    ) -> Self {
        Self {
            connection,
            channel: channel.into(),
            severities,
        }
    }

    /// List key records are published to
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn translate(&self, event: &RawEvent) -> AlertRecord {
        AlertRecord::from_event(event, &self.severities)
    }

    /// Translate and publish one event
    ///
    /// A failed publish is returned as-is; the event is not retried or buffered.
    #[instrument(skip(self, event), fields(entity = %event.client.name, check = %event.check.name))]
    pub async fn process(&self, event: &RawEvent) -> BridgeResult<HandlerResponse> {
        let record = self.translate(event);
        let payload = record.to_json()?;
        trace!("publishing {payload}");

        let queued = self.connection.publish(&self.channel, payload).await?;
        debug!("alert queued on '{}' ({queued} pending)", self.channel);

        Ok(HandlerResponse::sent())
    }
}

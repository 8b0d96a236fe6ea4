//! Helper functions for integration tests

use std::sync::Arc;
use std::time::Duration;

use flapjack_bridge::{
    BrokerConfig, ConnectionHandle, EventTranslator, RawEvent, SeverityTable,
    broker::memory::MemoryBroker,
    event::{Check, Client},
};

pub const WAIT: Duration = Duration::from_secs(2);

/// Broker config with timings short enough for tests
pub fn create_test_config() -> BrokerConfig {
    BrokerConfig {
        connect_timeout_ms: 200,
        publish_timeout_ms: 200,
        reconnect_interval_ms: 10,
        heartbeat_interval_ms: 60_000,
        ..BrokerConfig::default()
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// The `web1` / `disk` event used throughout the tests
pub fn create_disk_event() -> RawEvent {
    RawEvent {
        client: Client {
            name: "web1".into(),
            address: "10.0.0.1".into(),
            tags: Some(strings(&["prod"])),
            environment: Some("prod".into()),
            subscriptions: strings(&["a", "b", "c"]),
        },
        check: Check {
            name: "disk".into(),
            status: 2,
            output: "disk full".into(),
            notification: None,
            executed: 1000,
            tags: Some(strings(&["fs"])),
            subscribers: Some(strings(&["a", "c"])),
        },
    }
}

pub fn create_check_event(client: &str, check: &str, status: i64) -> RawEvent {
    let mut event = create_disk_event();
    event.client.name = client.to_string();
    event.check.name = check.to_string();
    event.check.status = status;
    event
}

/// Connected translator on top of an in-memory broker
pub async fn create_translator(broker: &MemoryBroker) -> (EventTranslator, ConnectionHandle) {
    let connection = ConnectionHandle::connect(&create_test_config(), Arc::new(broker.clone()))
        .await
        .expect("memory broker should accept connections");

    let translator = EventTranslator::new(
        connection.clone(),
        "events",
        Arc::new(SeverityTable::default()),
    );

    (translator, connection)
}

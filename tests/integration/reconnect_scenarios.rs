//! Broker outage and recovery tests
//!
//! These tests verify the connection state machine end to end:
//! - Publishing during an outage fails per event
//! - The connection recovers without caller intervention
//! - Every transition is observable

use std::sync::Arc;

use assert_matches::assert_matches;
use flapjack_bridge::{
    BridgeError, ConnectionHandle, ConnectionState, broker::ACTIONS_KEY,
    broker::memory::MemoryBroker,
};

use crate::helpers::*;

#[tokio::test]
async fn test_drop_during_publish_then_recovery() {
    let broker = MemoryBroker::new();
    let (translator, connection) = create_translator(&broker).await;
    let mut transitions = connection.subscribe();

    broker.set_available(false);

    let result = translator.process(&create_disk_event()).await;
    assert_matches!(result, Err(BridgeError::Publish { .. }));
    assert_eq!(broker.len("events").await, 0);

    let lost = transitions.recv().await.unwrap();
    assert_eq!(
        (lost.from, lost.to),
        (ConnectionState::Connected, ConnectionState::Reconnecting)
    );

    broker.set_available(true);
    assert!(
        connection
            .wait_for_state(ConnectionState::Connected, WAIT)
            .await
    );

    // the failed event is not replayed
    translator.process(&create_disk_event()).await.unwrap();
    assert_eq!(broker.len("events").await, 1);
    assert_eq!(broker.len(ACTIONS_KEY).await, 1);

    connection.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_recovery_transitions_end_with_connected_from_reconnecting() {
    let broker = MemoryBroker::new();
    let (translator, connection) = create_translator(&broker).await;
    let mut transitions = connection.subscribe();

    broker.set_available(false);
    let _ = translator.process(&create_disk_event()).await;
    broker.set_available(true);

    let mut last = None;
    while let Ok(Ok(transition)) = tokio::time::timeout(WAIT, transitions.recv()).await {
        let reached = transition.to == ConnectionState::Connected;
        last = Some(transition);
        if reached {
            break;
        }
    }

    let last = last.expect("no transitions observed");
    assert_eq!(last.from, ConnectionState::Reconnecting);
    assert_eq!(last.to, ConnectionState::Connected);
    assert_eq!(last.endpoint, "memory");

    connection.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_startup_without_broker_is_not_fatal() {
    let broker = MemoryBroker::new();
    broker.set_available(false);

    let config = flapjack_bridge::BrokerConfig {
        connect_timeout_ms: 30,
        ..create_test_config()
    };

    let unreachable = ConnectionHandle::connect(&config, Arc::new(broker.clone()))
        .await
        .unwrap_err();
    assert_matches!(unreachable.error, BridgeError::Connection { .. });
    let connection = unreachable.handle;

    let result = connection.publish("events", "early".into()).await;
    assert_matches!(result, Err(BridgeError::Publish { .. }));

    broker.set_available(true);
    assert!(
        connection
            .wait_for_state(ConnectionState::Connected, WAIT)
            .await
    );
    assert_eq!(connection.publish("events", "late".into()).await.unwrap(), 1);

    connection.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_repeated_outages() {
    let broker = MemoryBroker::new();
    let (translator, connection) = create_translator(&broker).await;

    for _ in 0..3 {
        broker.set_available(false);
        assert!(translator.process(&create_disk_event()).await.is_err());

        broker.set_available(true);
        assert!(
            connection
                .wait_for_state(ConnectionState::Connected, WAIT)
                .await
        );
        translator.process(&create_disk_event()).await.unwrap();
    }

    let stats = connection.stats().await.unwrap();
    assert_eq!(stats.published, 3);
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.reconnects, 3);

    connection.shutdown().await.unwrap();
}

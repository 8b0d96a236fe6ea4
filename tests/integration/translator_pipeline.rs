//! End-to-end translation tests: raw event in, queued JSON record out

use flapjack_bridge::{AlertRecord, broker::ACTIONS_KEY, broker::memory::MemoryBroker};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_disk_full_event_reaches_queue() {
    let broker = MemoryBroker::new();
    let (translator, connection) = create_translator(&broker).await;

    let response = translator.process(&create_disk_event()).await.unwrap();
    assert_eq!(response.status, 0);
    assert_eq!(response.message, "sent an event to the flapjack redis queue");

    let queued = broker.list("events").await;
    assert_eq!(queued.len(), 1);

    let record: serde_json::Value = serde_json::from_str(&queued[0]).unwrap();
    assert_eq!(
        record,
        json!({
            "entity": "web1",
            "check": "disk",
            "type": "service",
            "state": "critical",
            "summary": "disk full",
            "details": "Address:10.0.0.1 Tags:prod,fs,prod,a,c",
            "time": 1000,
            "tags": ["prod", "fs", "prod", "a", "c"]
        })
    );

    assert_eq!(broker.list(ACTIONS_KEY).await, vec!["+"]);

    connection.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_event_from_host_json() {
    let broker = MemoryBroker::new();
    let (translator, connection) = create_translator(&broker).await;

    let event = serde_json::from_value(json!({
        "client": {
            "name": "db1",
            "address": "192.168.1.20",
            "subscriptions": ["mysql", "linux"],
            "timestamp": 1700000000
        },
        "check": {
            "name": "replication",
            "status": 1,
            "output": "Seconds_Behind_Master: 120",
            "notification": "replication lag on db1",
            "executed": 1700000042,
            "subscribers": ["mysql"],
            "handlers": ["flapjack"]
        },
        "action": "create"
    }))
    .unwrap();

    translator.process(&event).await.unwrap();

    let record: AlertRecord = serde_json::from_str(&broker.list("events").await[0]).unwrap();
    assert_eq!(record.entity, "db1");
    assert_eq!(record.state, "warning");
    assert_eq!(record.summary, "replication lag on db1");
    assert_eq!(
        record.details,
        "Address:192.168.1.20 Tags:mysql Raw Output: Seconds_Behind_Master: 120"
    );
    assert_eq!(record.time, 1_700_000_042);
    assert_eq!(record.tags, vec!["mysql"]);

    connection.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_events_queue_in_push_order() {
    let broker = MemoryBroker::new();
    let (translator, connection) = create_translator(&broker).await;

    for (check, status) in [("cpu", 0), ("memory", 1), ("disk", 2)] {
        translator
            .process(&create_check_event("web1", check, status))
            .await
            .unwrap();
    }

    // head of the list holds the newest record
    let checks: Vec<String> = broker
        .list("events")
        .await
        .iter()
        .map(|payload| serde_json::from_str::<AlertRecord>(payload).unwrap().check)
        .collect();
    assert_eq!(checks, vec!["disk", "memory", "cpu"]);
    assert_eq!(broker.len(ACTIONS_KEY).await, 3);

    connection.shutdown().await.unwrap();
}

//! Concurrent publishers sharing one connection
//!
//! All publishes are serialized through the connection actor, so every
//! record is followed by exactly one marker and nothing is lost.

use flapjack_bridge::{AlertRecord, broker::ACTIONS_KEY, broker::memory::MemoryBroker};

use crate::helpers::*;

#[tokio::test]
async fn test_concurrent_process_calls_all_delivered() {
    let broker = MemoryBroker::new();
    let (translator, connection) = create_translator(&broker).await;

    let mut tasks = vec![];
    for i in 0..20 {
        let translator = translator.clone();
        tasks.push(tokio::spawn(async move {
            let event = create_check_event(&format!("host{i}"), "ping", i % 4);
            translator.process(&event).await
        }));
    }

    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let queued = broker.list("events").await;
    assert_eq!(queued.len(), 20);
    assert_eq!(broker.len(ACTIONS_KEY).await, 20);

    // every payload is a complete record
    let mut entities: Vec<String> = queued
        .iter()
        .map(|payload| serde_json::from_str::<AlertRecord>(payload).unwrap().entity)
        .collect();
    entities.sort();
    entities.dedup();
    assert_eq!(entities.len(), 20);

    connection.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_state_queries() {
    let broker = MemoryBroker::new();
    let (_translator, connection) = create_translator(&broker).await;

    let mut tasks = vec![];
    for _ in 0..10 {
        let connection = connection.clone();
        tasks.push(tokio::spawn(async move { connection.stats().await }));
    }

    for task in tasks {
        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats.published, 0);
    }

    connection.shutdown().await.unwrap();
}

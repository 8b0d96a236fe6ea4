//! In-memory broker (no network)
//!
//! Lists live in a shared map. The broker can be switched off and on again to
//! simulate outages: while unavailable, new connections are refused and every
//! operation on an existing connection fails as if the socket had dropped.
//! Connections opened before an outage stay broken afterwards, like a real
//! socket would, so recovery always goes through a fresh `connect`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{BridgeError, BridgeResult};

use super::backend::{BrokerConnection, BrokerConnector};

#[derive(Default)]
struct Shared {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    unavailable: AtomicBool,
    /// Bumped on every outage, invalidating older connections
    generation: AtomicU64,
    /// Key whose pushes are rejected without touching the connection
    rejected_key: std::sync::Mutex<Option<String>>,
}

/// In-memory list broker
///
/// Cloning yields another handle onto the same lists.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    shared: Arc<Shared>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage (`false`) or recovery (`true`)
    pub fn set_available(&self, available: bool) {
        debug!("memory broker available: {available}");
        if !available {
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
        }
        self.shared.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        !self.shared.unavailable.load(Ordering::SeqCst)
    }

    /// Make pushes onto `key` fail with a broker-side rejection
    pub fn reject_pushes_to(&self, key: Option<&str>) {
        if let Ok(mut rejected) = self.shared.rejected_key.lock() {
            *rejected = key.map(str::to_string);
        }
    }

    /// Contents of a list, head first
    pub async fn list(&self, key: &str) -> Vec<String> {
        self.shared
            .lists
            .lock()
            .await
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn len(&self, key: &str) -> usize {
        self.shared
            .lists
            .lock()
            .await
            .get(key)
            .map_or(0, VecDeque::len)
    }

    fn rejects(&self, key: &str) -> bool {
        self.shared
            .rejected_key
            .lock()
            .map(|rejected| rejected.as_deref() == Some(key))
            .unwrap_or(false)
    }
}

#[async_trait]
impl BrokerConnector for MemoryBroker {
    async fn connect(&self) -> BridgeResult<Box<dyn BrokerConnection>> {
        if !self.is_available() {
            return Err(BridgeError::connection(self.endpoint(), "connection refused"));
        }

        Ok(Box::new(MemoryConnection {
            broker: self.clone(),
            generation: self.shared.generation.load(Ordering::SeqCst),
        }))
    }

    fn endpoint(&self) -> String {
        String::from("memory")
    }
}

struct MemoryConnection {
    broker: MemoryBroker,
    generation: u64,
}

impl MemoryConnection {
    fn check_alive(&self) -> BridgeResult<()> {
        let current = self.broker.shared.generation.load(Ordering::SeqCst);
        if !self.broker.is_available() || current != self.generation {
            return Err(BridgeError::TransientIo("connection reset by peer".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerConnection for MemoryConnection {
    async fn push(&mut self, key: &str, value: &str) -> BridgeResult<i64> {
        self.check_alive()?;

        if self.broker.rejects(key) {
            return Err(BridgeError::Broker(format!(
                "WRONGTYPE Operation against a key holding the wrong kind of value ({key})"
            )));
        }

        let mut lists = self.broker.shared.lists.lock().await;
        let list = lists.entry(key.to_string()).or_default();
        list.push_front(value.to_string());

        Ok(list.len() as i64)
    }

    async fn ping(&mut self) -> BridgeResult<()> {
        self.check_alive()
    }
}

//! Redis list transport
//!
//! Connections are opened against `redis://host:port/db`, so the database is
//! selected as part of the handshake. Records go onto the head of the list
//! (`LPUSH`); the notification router pops from the tail.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::{debug, instrument, trace};

use crate::config::BrokerConfig;
use crate::error::{BridgeError, BridgeResult};

use super::backend::{BrokerConnection, BrokerConnector};

pub struct RedisConnector {
    url: String,
    endpoint: String,
}

impl RedisConnector {
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            url: format!("redis://{}:{}/{}", config.host, config.port, config.db),
            endpoint: config.endpoint(),
        }
    }
}

#[async_trait]
impl BrokerConnector for RedisConnector {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn connect(&self) -> BridgeResult<Box<dyn BrokerConnection>> {
        let client = redis::Client::open(self.url.as_str())
            .map_err(|e| BridgeError::connection(&self.endpoint, e))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BridgeError::connection(&self.endpoint, e))?;

        debug!("opened redis connection");

        Ok(Box::new(RedisConnection { connection }))
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

struct RedisConnection {
    connection: MultiplexedConnection,
}

#[async_trait]
impl BrokerConnection for RedisConnection {
    async fn push(&mut self, key: &str, value: &str) -> BridgeResult<i64> {
        let length = redis::cmd("LPUSH")
            .arg(key)
            .arg(value)
            .query_async::<_, i64>(&mut self.connection)
            .await?;

        trace!("pushed onto {key}, list length is now {length}");
        Ok(length)
    }

    async fn ping(&mut self) -> BridgeResult<()> {
        redis::cmd("PING")
            .query_async::<_, String>(&mut self.connection)
            .await?;
        Ok(())
    }
}

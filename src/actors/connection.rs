//! ConnectionActor - Owns the broker connection
//!
//! The actor is the only writer on the connection: publishes arrive as commands
//! and are handled one at a time, so the two list pushes of an event are never
//! interleaved with another event's.
//!
//! ## Reconnect Loop
//!
//! ```text
//! retry tick (only while not connected)  → spawned connect attempt → Connected
//! heartbeat tick (only while connected)  → PING ─┐
//! Publish command → LPUSH channel, LPUSH marker ─┴─ I/O failure → Reconnecting
//! ```
//!
//! Every attempt and every push is bounded by a timeout, so the actor never
//! waits on a dead broker for longer than the configured limits. Connect
//! attempts run off the loop; commands arriving meanwhile are answered at once.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at, timeout};
use tracing::{debug, info, instrument, trace, warn};

use crate::broker::{ACTION_MARKER, ACTIONS_KEY, BrokerConnection, BrokerConnector};
use crate::config::BrokerConfig;
use crate::error::{BridgeError, BridgeResult};

use super::messages::{ConnectionCommand, ConnectionState, ConnectionStats, StateTransition};

/// Actor that keeps one connection to the broker alive
pub struct ConnectionActor {
    /// Opens new connections
    connector: Arc<dyn BrokerConnector>,

    /// Broker location for logging
    endpoint: String,

    /// Live connection, `None` unless connected
    connection: Option<Box<dyn BrokerConnection>>,

    state: ConnectionState,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<ConnectionCommand>,

    /// Current state, observed by handles
    state_tx: watch::Sender<ConnectionState>,

    /// Transition stream for observers
    transition_tx: broadcast::Sender<StateTransition>,

    connect_timeout: Duration,
    publish_timeout: Duration,
    reconnect_interval: Duration,
    heartbeat_interval: Duration,

    stats: ConnectionStats,
}

impl ConnectionActor {
    /// Create a new connection actor
    pub fn new(
        config: &BrokerConfig,
        connector: Arc<dyn BrokerConnector>,
        command_rx: mpsc::Receiver<ConnectionCommand>,
        state_tx: watch::Sender<ConnectionState>,
        transition_tx: broadcast::Sender<StateTransition>,
    ) -> Self {
        Self {
            endpoint: connector.endpoint(),
            connector,
            connection: None,
            state: ConnectionState::Disconnected,
            command_rx,
            state_tx,
            transition_tx,
            connect_timeout: config.connect_timeout(),
            publish_timeout: config.publish_timeout(),
            reconnect_interval: config.reconnect_interval(),
            heartbeat_interval: config.heartbeat_interval(),
            stats: ConnectionStats::default(),
        }
    }

    /// Run the actor's main loop
    ///
    /// The first connection attempt happens immediately. The loop runs until a
    /// Shutdown command is received or every handle has been dropped.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn run(mut self) {
        debug!("starting connection actor");

        let mut retry = interval(self.reconnect_interval);
        retry.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut heartbeat = interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempt: Option<ConnectAttempt> = None;

        loop {
            tokio::select! {
                _ = retry.tick(), if self.connection.is_none() && attempt.is_none() => {
                    attempt = Some(self.begin_attempt());
                }

                Some(joined) = join_attempt(&mut attempt), if attempt.is_some() => {
                    attempt = None;
                    let outcome = joined.unwrap_or_else(|e| {
                        Err(BridgeError::connection(
                            &self.endpoint,
                            format!("connection attempt aborted: {e}"),
                        ))
                    });
                    self.finish_attempt(outcome);
                }

                _ = heartbeat.tick(), if self.connection.is_some() => {
                    self.probe().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(ConnectionCommand::Publish { channel, payload, respond_to }) => {
                            let result = self.publish(&channel, &payload).await;
                            let _ = respond_to.send(result);
                        }

                        Some(ConnectionCommand::GetStats { respond_to }) => {
                            let _ = respond_to.send(self.stats.clone());
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        if let Some(attempt) = attempt.take() {
            attempt.abort();
        }

        self.connection = None;
        if self.state != ConnectionState::Disconnected {
            self.transition(ConnectionState::Disconnected);
        }

        debug!("connection actor stopped");
    }

    /// Start one bounded connection attempt in the background
    ///
    /// Commands keep being served while the attempt is in flight, so publishes
    /// made during `Connecting`/`Reconnecting` fail right away.
    fn begin_attempt(&mut self) -> ConnectAttempt {
        let attempt = match self.state {
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                ConnectionState::Connecting
            }
            ConnectionState::Connected | ConnectionState::Reconnecting => {
                ConnectionState::Reconnecting
            }
        };
        self.transition(attempt);

        let connector = Arc::clone(&self.connector);
        let endpoint = self.endpoint.clone();
        let limit = self.connect_timeout;

        tokio::spawn(async move {
            timeout(limit, connector.connect())
                .await
                .unwrap_or_else(|_| {
                    Err(BridgeError::connection(
                        endpoint,
                        "connection attempt timed out",
                    ))
                })
        })
    }

    fn finish_attempt(&mut self, outcome: BridgeResult<Box<dyn BrokerConnection>>) {
        let attempt = self.state;

        match outcome {
            Ok(connection) => {
                self.connection = Some(connection);
                if attempt == ConnectionState::Reconnecting {
                    self.stats.reconnects += 1;
                }
                self.transition(ConnectionState::Connected);
            }
            Err(e) => {
                warn!("{e}");
                if attempt == ConnectionState::Connecting {
                    self.transition(ConnectionState::Disconnected);
                }
            }
        }
    }

    /// Probe the live connection
    async fn probe(&mut self) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };

        let result = timeout(self.publish_timeout, connection.ping())
            .await
            .unwrap_or_else(|_| Err(BridgeError::TransientIo("heartbeat timed out".into())));

        match result {
            Ok(()) => trace!("heartbeat ok"),
            Err(e) if e.is_transient() => self.connection_lost(&e),
            Err(e) => warn!("heartbeat rejected: {e}"),
        }
    }

    /// Push the payload, then the sidecar marker
    ///
    /// The two pushes are not atomic. Once the payload is on the broker the
    /// event counts as delivered, even if the marker push fails afterwards.
    #[instrument(skip(self, payload))]
    async fn publish(&mut self, channel: &str, payload: &str) -> BridgeResult<i64> {
        let Some(connection) = self.connection.as_mut() else {
            self.stats.failed += 1;
            return Err(BridgeError::publish(channel, format!("broker is {}", self.state)));
        };

        let queued =
            match bounded_push(&mut **connection, channel, payload, self.publish_timeout).await {
                Ok(length) => length,
                Err(e) => {
                    self.stats.failed += 1;
                    if e.is_transient() {
                        self.connection_lost(&e);
                    }
                    return Err(BridgeError::publish(channel, e));
                }
            };
        self.stats.published += 1;

        if let Some(connection) = self.connection.as_mut() {
            let marker = bounded_push(
                &mut **connection,
                ACTIONS_KEY,
                ACTION_MARKER,
                self.publish_timeout,
            )
            .await;

            if let Err(e) = marker {
                self.stats.markers_lost += 1;
                warn!("event delivered to '{channel}' but its {ACTIONS_KEY} marker was lost: {e}");
                if e.is_transient() {
                    self.connection_lost(&e);
                }
            }
        }

        trace!("published to '{channel}', {queued} queued");
        Ok(queued)
    }

    fn connection_lost(&mut self, error: &BridgeError) {
        warn!("lost connection to broker on {}: {error}", self.endpoint);
        self.connection = None;
        self.transition(ConnectionState::Reconnecting);
    }

    /// Move to `to`, log it, and notify observers
    fn transition(&mut self, to: ConnectionState) {
        let from = self.state;
        self.state = to;

        match (from, to) {
            (_, ConnectionState::Connecting) => {
                warn!("connecting to broker on {}", self.endpoint)
            }
            (_, ConnectionState::Reconnecting) => {
                warn!("reconnecting to broker on {}", self.endpoint)
            }
            (ConnectionState::Reconnecting, ConnectionState::Connected) => {
                info!("reconnected to broker on {}", self.endpoint)
            }
            (_, ConnectionState::Connected) => info!("connected to broker on {}", self.endpoint),
            (_, ConnectionState::Disconnected) => {
                warn!("disconnected from broker on {}", self.endpoint)
            }
        }

        self.state_tx.send_replace(to);

        // No subscribers is fine
        let _ = self.transition_tx.send(StateTransition {
            from,
            to,
            endpoint: self.endpoint.clone(),
            at: Utc::now(),
        });
    }
}

type ConnectAttempt = JoinHandle<BridgeResult<Box<dyn BrokerConnection>>>;

/// Resolves once the in-flight attempt finishes, `None` without one
async fn join_attempt(
    attempt: &mut Option<ConnectAttempt>,
) -> Option<Result<BridgeResult<Box<dyn BrokerConnection>>, JoinError>> {
    match attempt {
        Some(handle) => Some(handle.await),
        None => None,
    }
}

async fn bounded_push(
    connection: &mut dyn BrokerConnection,
    key: &str,
    value: &str,
    limit: Duration,
) -> BridgeResult<i64> {
    timeout(limit, connection.push(key, value))
        .await
        .unwrap_or_else(|_| Err(BridgeError::TransientIo(format!("push onto {key} timed out"))))
}

/// The broker was not reachable within the connect timeout
///
/// The supervisor keeps retrying in the background; the handle is usable and
/// publishes will succeed once the connection comes up.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Unreachable {
    pub handle: ConnectionHandle,
    pub error: BridgeError,
}

/// Handle for controlling a ConnectionActor
///
/// Cheap to clone; all clones talk to the same actor and connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Command sender
    sender: mpsc::Sender<ConnectionCommand>,

    state_rx: watch::Receiver<ConnectionState>,

    transition_tx: broadcast::Sender<StateTransition>,

    /// Broker location (format: "host:port")
    pub endpoint: String,
}

impl ConnectionHandle {
    /// Spawn a new connection actor
    ///
    /// Returns immediately; the first connection attempt runs in the background.
    pub fn spawn(config: &BrokerConfig, connector: Arc<dyn BrokerConnector>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (transition_tx, _) = broadcast::channel(64);

        let endpoint = connector.endpoint();
        let actor = ConnectionActor::new(config, connector, cmd_rx, state_tx, transition_tx.clone());

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            state_rx,
            transition_tx,
            endpoint,
        }
    }

    /// Spawn the actor and wait for the first connection
    ///
    /// Waits at most the configured connect timeout. On failure the still
    /// running handle is handed back inside [`Unreachable`].
    pub async fn connect(
        config: &BrokerConfig,
        connector: Arc<dyn BrokerConnector>,
    ) -> std::result::Result<Self, Unreachable> {
        let handle = Self::spawn(config, connector);

        if handle
            .wait_for_state(ConnectionState::Connected, config.connect_timeout())
            .await
        {
            return Ok(handle);
        }

        let error = BridgeError::connection(
            &handle.endpoint,
            format!(
                "no connection within {}ms, retrying in the background",
                config.connect_timeout_ms
            ),
        );
        Err(Unreachable { handle, error })
    }

    /// Publish one payload onto `channel`
    ///
    /// Fails fast with `BridgeError::Publish` when the broker is not connected
    /// or the connection drops during the push. Nothing is buffered.
    pub async fn publish(&self, channel: &str, payload: String) -> BridgeResult<i64> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ConnectionCommand::Publish {
                channel: channel.to_string(),
                payload,
                respond_to: tx,
            })
            .await
            .map_err(|_| BridgeError::publish(channel, "connection manager stopped"))?;

        rx.await
            .map_err(|_| BridgeError::publish(channel, "connection manager stopped"))?
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Wait until the connection reaches `state`
    ///
    /// Returns `false` if it did not within `limit`.
    pub async fn wait_for_state(&self, state: ConnectionState, limit: Duration) -> bool {
        let mut state_rx = self.state_rx.clone();
        matches!(
            timeout(limit, state_rx.wait_for(|current| *current == state)).await,
            Ok(Ok(_))
        )
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> broadcast::Receiver<StateTransition> {
        self.transition_tx.subscribe()
    }

    /// Get delivery statistics
    pub async fn stats(&self) -> Result<ConnectionStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ConnectionCommand::GetStats { respond_to: tx })
            .await
            .context("failed to send GetStats command")?;

        rx.await.context("failed to receive stats")
    }

    /// Close the connection and stop the actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(ConnectionCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}

//! Actor-based connection supervision
//!
//! The broker connection is owned by a single actor running as an independent
//! async task. Everything else talks to it through a [`connection::ConnectionHandle`].
//!
//! ## Architecture Overview
//!
//! ```text
//!   host pipeline ──event──▶ EventTranslator
//!                                  │ publish (mpsc + oneshot reply)
//!                                  ▼
//!                          ┌─────────────────┐  connect / LPUSH / PING
//!                          │ ConnectionActor │ ─────────────────────────▶ broker
//!                          └────────┬────────┘
//!                                   │ state (watch), transitions (broadcast)
//!                                   ▼
//!                               observers
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the actor's mpsc command channel (publish, stats, shutdown)
//! 2. **Events**: state transitions on a broadcast channel for fan-out
//! 3. **Request/Response**: oneshot channels carry publish results back

pub mod connection;
pub mod messages;

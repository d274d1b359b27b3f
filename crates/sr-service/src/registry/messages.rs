//! Messages accepted by the registry actor's mailbox.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::protocol::{ServerEvent, SignalKind};

/// Opaque identifier for a live WebSocket connection.
///
/// Distinct from the caller-supplied participant id: a participant that
/// reconnects gets a fresh `ConnectionId` and overwrites its old
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mailbox messages for the registry actor.
#[derive(Debug)]
pub enum RegistryMessage {
    /// A new WebSocket connection opened; register its outbound sender.
    Register {
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    },

    /// A connection asked to join a session.
    Join {
        connection_id: ConnectionId,
        session_id: String,
        participant_id: String,
        participant_name: String,
    },

    /// A connection asked to forward a handshake message to a target.
    Relay {
        connection_id: ConnectionId,
        kind: SignalKind,
        session_id: String,
        target_id: String,
        payload: Value,
    },

    /// A connection explicitly ended its session.
    EndSession {
        connection_id: ConnectionId,
        session_id: String,
    },

    /// A connection closed (graceful or not).
    Disconnect { connection_id: ConnectionId },

    /// Periodic staleness sweep. Time is supplied by the caller so tests
    /// can drive the sweep deterministically.
    SweepStale {
        now: DateTime<Utc>,
        retention: Duration,
    },

    /// Snapshot of registry counters, for readiness checks and tests.
    GetStatus {
        respond_to: oneshot::Sender<RegistryStatus>,
    },
}

/// Point-in-time registry counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStatus {
    pub session_count: usize,
    pub participant_count: usize,
    pub connection_count: usize,
}

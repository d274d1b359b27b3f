//! # SR Test Utilities
//!
//! Shared test utilities for the Beacon Signaling Relay.
//!
//! The centerpiece is [`RegistryHarness`], which spawns a real registry
//! actor and lets tests act as any number of fake client connections
//! without a WebSocket in sight. Each fake connection is a
//! `(ConnectionId, receiver)` pair: the receiver yields exactly the
//! [`ServerEvent`]s that connection's socket would have been sent.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sr_test_utils::RegistryHarness;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let harness = RegistryHarness::new();
//!     let mut alice = harness.connect();
//!     harness.join(&alice, "room-1", "alice", "Alice");
//!     let event = alice.recv().await;
//!     // assert on the event...
//! }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sr_service::protocol::{ServerEvent, SignalKind};
use sr_service::registry::{ConnectionId, RegistryActor, RegistryHandle, RegistryStatus};

/// How long [`TestConnection::recv`] waits before declaring no event
/// arrived.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// A fake client connection registered with the harness's registry.
pub struct TestConnection {
    pub id: ConnectionId,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestConnection {
    /// Receive the next event pushed to this connection, panicking if
    /// none arrives within [`RECV_TIMEOUT`].
    pub async fn recv(&mut self) -> ServerEvent {
        tokio::time::timeout(RECV_TIMEOUT, self.rx.recv())
            .await
            .expect("timed out waiting for server event")
            .expect("connection channel closed")
    }

    /// Assert that no event is delivered within `window`.
    ///
    /// Used to verify silent-drop behavior: the absence of an event is
    /// the behavior under test.
    pub async fn assert_silent(&mut self, window: Duration) {
        let result = tokio::time::timeout(window, self.rx.recv()).await;
        assert!(
            result.is_err(),
            "expected no event, got {:?}",
            result.unwrap()
        );
    }

    /// Drain and return every event currently queued for this connection.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Spawns a real registry actor and mediates fake connections to it.
pub struct RegistryHarness {
    pub registry: RegistryHandle,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl Default for RegistryHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryHarness {
    pub fn new() -> Self {
        let cancel = CancellationToken::new();
        let (registry, task) = RegistryActor::spawn(cancel.clone());
        Self {
            registry,
            cancel,
            _task: task,
        }
    }

    /// Open a fake connection and register it with the actor.
    pub fn connect(&self) -> TestConnection {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry.register(id, tx);
        TestConnection { id, rx }
    }

    pub fn join(&self, conn: &TestConnection, session: &str, participant: &str, name: &str) {
        self.registry.join(
            conn.id,
            session.to_string(),
            participant.to_string(),
            name.to_string(),
        );
    }

    pub fn relay(
        &self,
        conn: &TestConnection,
        kind: SignalKind,
        session: &str,
        target: &str,
        payload: Value,
    ) {
        self.registry
            .relay(conn.id, kind, session.to_string(), target.to_string(), payload);
    }

    pub fn end_session(&self, conn: &TestConnection, session: &str) {
        self.registry.end_session(conn.id, session.to_string());
    }

    pub fn disconnect(&self, conn: &TestConnection) {
        self.registry.disconnect(conn.id);
    }

    pub fn sweep(&self, now: DateTime<Utc>, retention: Duration) {
        self.registry.sweep_stale(now, retention);
    }

    /// Snapshot registry counters.
    ///
    /// Because the actor processes its mailbox in order, the returned
    /// snapshot reflects every message sent before this call. Tests use
    /// it both for assertions and as a synchronization barrier.
    pub async fn status(&self) -> RegistryStatus {
        self.registry
            .status()
            .await
            .expect("registry actor has shut down")
    }
}

impl Drop for RegistryHarness {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

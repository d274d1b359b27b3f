//! The registry actor: single owner of all signaling state.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics::{
    record_message_dropped, record_message_relayed, record_sessions_swept, set_connections_active,
    set_sessions_active,
};
use crate::protocol::{ServerEvent, SignalKind};

use super::messages::{ConnectionId, RegistryMessage, RegistryStatus};
use super::state::{Participant, Session, SessionMember};

/// Cheaply cloneable handle for sending messages to the registry actor.
///
/// All methods except [`status`](RegistryHandle::status) are
/// fire-and-forget: if the actor has shut down the message is silently
/// discarded, which is the correct behavior during drain.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    tx: mpsc::UnboundedSender<RegistryMessage>,
}

impl RegistryHandle {
    pub fn register(&self, connection_id: ConnectionId, sender: mpsc::UnboundedSender<ServerEvent>) {
        let _ = self.tx.send(RegistryMessage::Register {
            connection_id,
            sender,
        });
    }

    pub fn join(
        &self,
        connection_id: ConnectionId,
        session_id: String,
        participant_id: String,
        participant_name: String,
    ) {
        let _ = self.tx.send(RegistryMessage::Join {
            connection_id,
            session_id,
            participant_id,
            participant_name,
        });
    }

    pub fn relay(
        &self,
        connection_id: ConnectionId,
        kind: SignalKind,
        session_id: String,
        target_id: String,
        payload: Value,
    ) {
        let _ = self.tx.send(RegistryMessage::Relay {
            connection_id,
            kind,
            session_id,
            target_id,
            payload,
        });
    }

    pub fn end_session(&self, connection_id: ConnectionId, session_id: String) {
        let _ = self.tx.send(RegistryMessage::EndSession {
            connection_id,
            session_id,
        });
    }

    pub fn disconnect(&self, connection_id: ConnectionId) {
        let _ = self.tx.send(RegistryMessage::Disconnect { connection_id });
    }

    pub fn sweep_stale(&self, now: DateTime<Utc>, retention: Duration) {
        let _ = self.tx.send(RegistryMessage::SweepStale { now, retention });
    }

    /// Request a snapshot of registry counters.
    ///
    /// Returns `None` if the actor has shut down.
    pub async fn status(&self) -> Option<RegistryStatus> {
        let (respond_to, rx) = oneshot::channel();
        self.tx
            .send(RegistryMessage::GetStatus { respond_to })
            .ok()?;
        rx.await.ok()
    }
}

/// Owns the session registry, participant registry, and connection senders.
pub struct RegistryActor {
    sessions: HashMap<String, Session>,
    participants: HashMap<ConnectionId, Participant>,
    connections: HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
    rx: mpsc::UnboundedReceiver<RegistryMessage>,
    cancel: CancellationToken,
}

impl RegistryActor {
    /// Spawn the actor task, returning a handle and the task's join handle.
    pub fn spawn(cancel: CancellationToken) -> (RegistryHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = RegistryActor {
            sessions: HashMap::new(),
            participants: HashMap::new(),
            connections: HashMap::new(),
            rx,
            cancel,
        };
        let task = tokio::spawn(actor.run());
        (RegistryHandle { tx }, task)
    }

    async fn run(mut self) {
        tracing::info!(target: "sr.registry", "Registry actor started");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!(target: "sr.registry", "Registry actor shutting down");
                    break;
                }
                msg = self.rx.recv() => {
                    match msg {
                        Some(msg) => self.handle_message(msg),
                        None => {
                            tracing::info!(target: "sr.registry", "Registry mailbox closed");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn handle_message(&mut self, msg: RegistryMessage) {
        match msg {
            RegistryMessage::Register {
                connection_id,
                sender,
            } => self.handle_register(connection_id, sender),
            RegistryMessage::Join {
                connection_id,
                session_id,
                participant_id,
                participant_name,
            } => self.handle_join(connection_id, session_id, participant_id, participant_name),
            RegistryMessage::Relay {
                connection_id,
                kind,
                session_id,
                target_id,
                payload,
            } => self.handle_relay(connection_id, kind, &session_id, &target_id, payload),
            RegistryMessage::EndSession {
                connection_id,
                session_id,
            } => self.handle_end_session(connection_id, &session_id),
            RegistryMessage::Disconnect { connection_id } => self.handle_disconnect(connection_id),
            RegistryMessage::SweepStale { now, retention } => self.handle_sweep(now, retention),
            RegistryMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(RegistryStatus {
                    session_count: self.sessions.len(),
                    participant_count: self.participants.len(),
                    connection_count: self.connections.len(),
                });
            }
        }
    }

    fn handle_register(
        &mut self,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) {
        self.connections.insert(connection_id, sender);
        set_connections_active(self.connections.len());
        tracing::debug!(
            target: "sr.registry",
            connection_id = %connection_id,
            "Connection registered"
        );
    }

    fn handle_join(
        &mut self,
        connection_id: ConnectionId,
        session_id: String,
        participant_id: String,
        participant_name: String,
    ) {
        if !self.connections.contains_key(&connection_id) {
            record_message_dropped("unknown_sender");
            return;
        }

        let now = Utc::now();
        let session = self
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| Session::new(now));

        // A re-join under the same participant id overwrites the old
        // membership. If the old membership belonged to a different
        // connection, scrub its reverse-lookup entry so a later
        // disconnect of that connection cannot evict the new member.
        let previous = session.members.insert(
            participant_id.clone(),
            SessionMember {
                participant_id: participant_id.clone(),
                name: participant_name.clone(),
                connection_id,
                joined_at: now,
            },
        );
        if let Some(old) = &previous {
            if old.connection_id != connection_id {
                self.participants.remove(&old.connection_id);
            }
        }

        self.participants.insert(
            connection_id,
            Participant {
                participant_id: participant_id.clone(),
                name: participant_name.clone(),
                session_id: session_id.clone(),
            },
        );

        let member_count = self
            .sessions
            .get(&session_id)
            .map_or(0, |s| s.members.len());

        tracing::info!(
            target: "sr.registry",
            session_id = %session_id,
            participant_id = %participant_id,
            member_count = member_count,
            "Participant joined session"
        );

        send_to(
            &self.connections,
            connection_id,
            ServerEvent::SessionJoined {
                session_id: session_id.clone(),
                participant_id: participant_id.clone(),
                participant_count: member_count,
            },
        );

        // Pairing fires exactly once per session lifetime: on the join
        // that takes the distinct-member count from one to two. A
        // re-join that merely overwrites an existing membership does
        // not re-announce the pairing.
        if previous.is_none() && member_count == 2 {
            let partner = self.sessions.get(&session_id).and_then(|s| {
                s.members
                    .values()
                    .find(|m| m.participant_id != participant_id)
                    .cloned()
            });

            if let Some(partner) = partner {
                send_to(
                    &self.connections,
                    connection_id,
                    ServerEvent::PartnerConnected {
                        partner_id: partner.participant_id.clone(),
                        partner_name: partner.name.clone(),
                    },
                );
                send_to(
                    &self.connections,
                    partner.connection_id,
                    ServerEvent::PartnerConnected {
                        partner_id: participant_id,
                        partner_name: participant_name,
                    },
                );
                tracing::info!(
                    target: "sr.registry",
                    session_id = %session_id,
                    "Session paired"
                );
            }
        }

        set_sessions_active(self.sessions.len());
    }

    fn handle_relay(
        &mut self,
        connection_id: ConnectionId,
        kind: SignalKind,
        session_id: &str,
        target_id: &str,
        payload: Value,
    ) {
        let Some(sender) = self.participants.get(&connection_id) else {
            record_message_dropped("unknown_sender");
            return;
        };

        let Some(session) = self.sessions.get(session_id) else {
            record_message_dropped("unknown_session");
            return;
        };

        let Some(target) = session.members.get(target_id) else {
            record_message_dropped("unknown_target");
            return;
        };

        let event = match kind {
            SignalKind::Offer => ServerEvent::Offer {
                from_id: sender.participant_id.clone(),
                from_name: sender.name.clone(),
                payload,
            },
            SignalKind::Answer => ServerEvent::Answer {
                from_id: sender.participant_id.clone(),
                from_name: sender.name.clone(),
                payload,
            },
            SignalKind::IceCandidate => ServerEvent::IceCandidate {
                from_id: sender.participant_id.clone(),
                candidate: payload,
            },
        };

        send_to(&self.connections, target.connection_id, event);
        record_message_relayed(kind.as_str());
    }

    fn handle_end_session(&mut self, connection_id: ConnectionId, session_id: &str) {
        let Some(participant) = self.participants.get(&connection_id) else {
            return;
        };
        let partner_id = participant.participant_id.clone();
        let partner_name = participant.name.clone();

        tracing::info!(
            target: "sr.registry",
            session_id = %session_id,
            participant_id = %partner_id,
            "Participant ended session"
        );

        // Announce against the session id named in the request, then run
        // the shared departure path, which announces again against the
        // session the participant is actually recorded in. When the two
        // agree the partner hears the event twice; clients treat it as
        // idempotent.
        if let Some(session) = self.sessions.get(session_id) {
            let others: Vec<ConnectionId> = session
                .members
                .values()
                .filter(|m| m.connection_id != connection_id)
                .map(|m| m.connection_id)
                .collect();
            for other in others {
                send_to(
                    &self.connections,
                    other,
                    ServerEvent::PartnerDisconnected {
                        partner_id: partner_id.clone(),
                        partner_name: partner_name.clone(),
                    },
                );
            }
        }

        self.remove_participant(connection_id);
    }

    fn handle_disconnect(&mut self, connection_id: ConnectionId) {
        self.remove_participant(connection_id);
        self.connections.remove(&connection_id);
        set_connections_active(self.connections.len());
        tracing::debug!(
            target: "sr.registry",
            connection_id = %connection_id,
            "Connection closed"
        );
    }

    /// Shared departure path: remove the membership, notify whoever is
    /// left, and delete the session if it emptied.
    fn remove_participant(&mut self, connection_id: ConnectionId) {
        let Some(participant) = self.participants.remove(&connection_id) else {
            return;
        };

        let Some(session) = self.sessions.get_mut(&participant.session_id) else {
            return;
        };

        session.members.remove(&participant.participant_id);

        let remaining: Vec<ConnectionId> =
            session.members.values().map(|m| m.connection_id).collect();
        let emptied = session.members.is_empty();

        for other in remaining {
            send_to(
                &self.connections,
                other,
                ServerEvent::PartnerDisconnected {
                    partner_id: participant.participant_id.clone(),
                    partner_name: participant.name.clone(),
                },
            );
        }

        if emptied {
            self.sessions.remove(&participant.session_id);
            tracing::info!(
                target: "sr.registry",
                session_id = %participant.session_id,
                "Session deleted, no participants remaining"
            );
        }

        set_sessions_active(self.sessions.len());
    }

    fn handle_sweep(&mut self, now: DateTime<Utc>, retention: Duration) {
        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| {
                session.members.is_empty() && age_exceeds(session.created_at, now, retention)
            })
            .map(|(id, _)| id.clone())
            .collect();

        let mut swept = 0_u64;
        for session_id in stale {
            // Re-check at the instant of deletion: a join processed
            // between the scan and this point repopulates the session.
            let still_stale = self.sessions.get(&session_id).is_some_and(|session| {
                session.members.is_empty() && age_exceeds(session.created_at, now, retention)
            });
            if still_stale {
                self.sessions.remove(&session_id);
                swept += 1;
                tracing::info!(
                    target: "sr.registry",
                    session_id = %session_id,
                    "Swept stale session"
                );
            }
        }

        if swept > 0 {
            record_sessions_swept(swept);
            set_sessions_active(self.sessions.len());
        }
    }
}

/// Deliver an event to one connection, ignoring closed channels. A send
/// failure means the connection task already exited; its Disconnect
/// message is in flight behind this one.
fn send_to(
    connections: &HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
    connection_id: ConnectionId,
    event: ServerEvent,
) {
    if let Some(tx) = connections.get(&connection_id) {
        let _ = tx.send(event);
    }
}

fn age_exceeds(created_at: DateTime<Utc>, now: DateTime<Utc>, retention: Duration) -> bool {
    now.signed_duration_since(created_at)
        .to_std()
        .is_ok_and(|age| age > retention)
}

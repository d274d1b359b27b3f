//! Wire protocol for the signaling WebSocket.
//!
//! Every frame is a JSON object with an `event` discriminator. Event names
//! are kebab-case on the wire; payload fields are camelCase. Handshake
//! payloads (SDP blobs, ICE candidates) are carried as opaque JSON values
//! and never inspected by the relay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events a client may send to the relay.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join (or lazily create) a session.
    #[serde(rename_all = "camelCase")]
    JoinSession {
        session_id: String,
        participant_id: String,
        participant_name: String,
    },

    /// Forward an SDP offer to a specific participant.
    ///
    /// The payload field is named after the message kind on the wire.
    #[serde(rename_all = "camelCase")]
    Offer {
        session_id: String,
        target_id: String,
        #[serde(rename = "offer")]
        payload: Value,
    },

    /// Forward an SDP answer to a specific participant.
    #[serde(rename_all = "camelCase")]
    Answer {
        session_id: String,
        target_id: String,
        #[serde(rename = "answer")]
        payload: Value,
    },

    /// Forward an ICE candidate to a specific participant.
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        session_id: String,
        target_id: String,
        #[serde(rename = "candidate")]
        payload: Value,
    },

    /// Explicitly leave a session.
    #[serde(rename_all = "camelCase")]
    EndSession { session_id: String },
}

impl ClientEvent {
    /// Wire-level event name, used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinSession { .. } => "join-session",
            ClientEvent::Offer { .. } => "offer",
            ClientEvent::Answer { .. } => "answer",
            ClientEvent::IceCandidate { .. } => "ice-candidate",
            ClientEvent::EndSession { .. } => "end-session",
        }
    }
}

/// Events the relay pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Acknowledges a join; always sent, even on re-join.
    #[serde(rename_all = "camelCase")]
    SessionJoined {
        session_id: String,
        participant_id: String,
        participant_count: usize,
    },

    /// Sent to both members when a session reaches two distinct participants.
    #[serde(rename_all = "camelCase")]
    PartnerConnected {
        partner_id: String,
        partner_name: String,
    },

    /// A relayed SDP offer.
    #[serde(rename_all = "camelCase")]
    Offer {
        from_id: String,
        from_name: String,
        #[serde(rename = "offer")]
        payload: Value,
    },

    /// A relayed SDP answer.
    #[serde(rename_all = "camelCase")]
    Answer {
        from_id: String,
        from_name: String,
        #[serde(rename = "answer")]
        payload: Value,
    },

    /// A relayed ICE candidate.
    #[serde(rename_all = "camelCase")]
    IceCandidate { from_id: String, candidate: Value },

    /// The partner left the session or dropped its connection.
    #[serde(rename_all = "camelCase")]
    PartnerDisconnected {
        partner_id: String,
        partner_name: String,
    },

    /// A frame was rejected before reaching the registry.
    #[serde(rename_all = "camelCase")]
    Error { code: String, message: String },
}

/// The three handshake message kinds the relay forwards verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_session_deserializes_from_wire_shape() {
        let frame = json!({
            "event": "join-session",
            "sessionId": "room-42",
            "participantId": "alice",
            "participantName": "Alice"
        });

        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinSession {
                session_id: "room-42".to_string(),
                participant_id: "alice".to_string(),
                participant_name: "Alice".to_string(),
            }
        );
    }

    #[test]
    fn test_inbound_payload_fields_named_after_kind() {
        // The handshake payload travels under the message kind's own
        // name: `offer`, `answer`, `candidate`.
        let frame = json!({
            "event": "offer",
            "sessionId": "room-42",
            "targetId": "bob",
            "offer": {"type": "offer", "sdp": "v=0..."}
        });
        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        let ClientEvent::Offer { payload, .. } = event else {
            panic!("expected offer");
        };
        assert_eq!(payload["sdp"], "v=0...");

        let frame = json!({
            "event": "answer",
            "sessionId": "room-42",
            "targetId": "alice",
            "answer": {"type": "answer", "sdp": "v=0..."}
        });
        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        let ClientEvent::Answer { payload, .. } = event else {
            panic!("expected answer");
        };
        assert_eq!(payload["sdp"], "v=0...");

        let frame = json!({
            "event": "ice-candidate",
            "sessionId": "room-42",
            "targetId": "bob",
            "candidate": {"candidate": "candidate:1 1 UDP ..."}
        });
        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        assert!(matches!(event, ClientEvent::IceCandidate { .. }));
    }

    #[test]
    fn test_inbound_offer_under_generic_field_name_rejected() {
        let frame = json!({
            "event": "offer",
            "sessionId": "room-42",
            "targetId": "bob",
            "payload": {"sdp": "v=0..."}
        });
        assert!(serde_json::from_value::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn test_outbound_offer_and_answer_field_names() {
        let event = ServerEvent::Offer {
            from_id: "alice".to_string(),
            from_name: "Alice".to_string(),
            payload: json!({"sdp": "v=0"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "offer",
                "fromId": "alice",
                "fromName": "Alice",
                "offer": {"sdp": "v=0"}
            })
        );

        let event = ServerEvent::Answer {
            from_id: "bob".to_string(),
            from_name: "Bob".to_string(),
            payload: json!({"sdp": "v=0"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "answer");
        assert_eq!(value["answer"], json!({"sdp": "v=0"}));
        assert!(value.get("payload").is_none());
    }

    #[test]
    fn test_unknown_event_rejected() {
        let frame = json!({"event": "shout", "sessionId": "room-42"});
        assert!(serde_json::from_value::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn test_missing_field_rejected() {
        let frame = json!({"event": "join-session", "sessionId": "room-42"});
        assert!(serde_json::from_value::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn test_session_joined_serializes_camel_case() {
        let event = ServerEvent::SessionJoined {
            session_id: "room-42".to_string(),
            participant_id: "alice".to_string(),
            participant_count: 1,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "session-joined",
                "sessionId": "room-42",
                "participantId": "alice",
                "participantCount": 1
            })
        );
    }

    #[test]
    fn test_partner_disconnected_serializes_kebab_event_name() {
        let event = ServerEvent::PartnerDisconnected {
            partner_id: "bob".to_string(),
            partner_name: "Bob".to_string(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "partner-disconnected");
        assert_eq!(value["partnerId"], "bob");
        assert_eq!(value["partnerName"], "Bob");
    }

    #[test]
    fn test_ice_candidate_outbound_field_is_candidate() {
        let event = ServerEvent::IceCandidate {
            from_id: "alice".to_string(),
            candidate: json!({"candidate": "candidate:1 1 UDP ..."}),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "ice-candidate");
        assert!(value.get("candidate").is_some());
        assert!(value.get("payload").is_none());
    }

    #[test]
    fn test_client_event_names() {
        let join = ClientEvent::JoinSession {
            session_id: String::new(),
            participant_id: String::new(),
            participant_name: String::new(),
        };
        assert_eq!(join.name(), "join-session");

        let end = ClientEvent::EndSession {
            session_id: String::new(),
        };
        assert_eq!(end.name(), "end-session");
    }

    #[test]
    fn test_signal_kind_labels() {
        assert_eq!(SignalKind::Offer.as_str(), "offer");
        assert_eq!(SignalKind::Answer.as_str(), "answer");
        assert_eq!(SignalKind::IceCandidate.as_str(), "ice-candidate");
    }
}

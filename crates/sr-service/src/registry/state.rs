//! In-memory registry state.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::messages::ConnectionId;

/// Reverse-lookup entry: what a live connection is participating in.
#[derive(Debug, Clone)]
pub struct Participant {
    pub participant_id: String,
    pub name: String,
    pub session_id: String,
}

/// A participant's membership record inside a session.
#[derive(Debug, Clone)]
pub struct SessionMember {
    pub participant_id: String,
    pub name: String,
    pub connection_id: ConnectionId,
    pub joined_at: DateTime<Utc>,
}

/// A named two-party session.
///
/// Members are keyed by participant id, so a re-join from a new
/// connection overwrites the old membership instead of adding a third
/// member.
#[derive(Debug)]
pub struct Session {
    pub created_at: DateTime<Utc>,
    pub members: HashMap<String, SessionMember>,
}

impl Session {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            members: HashMap::new(),
        }
    }
}

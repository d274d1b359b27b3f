//! Session and participant registry.
//!
//! A single [`RegistryActor`] task owns the session registry, the
//! participant registry, and the outbound sender for every live
//! connection. All mutation flows through its mailbox one message at a
//! time, which is what makes the pairing trigger and the departure
//! broadcasts race-free without locks.

mod actor;
mod messages;
mod state;

pub use actor::{RegistryActor, RegistryHandle};
pub use messages::{ConnectionId, RegistryMessage, RegistryStatus};
pub use state::{Participant, Session, SessionMember};

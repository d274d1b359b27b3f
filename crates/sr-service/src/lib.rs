//! Beacon Signaling Relay library.
//!
//! Brokers peer-to-peer connection setup between exactly two participants
//! in a named session. The relay exchanges handshake messages (offer,
//! answer, ICE candidates) and tracks presence; no media or application
//! data transits it.
//!
//! # Architecture
//!
//! All session and participant state is owned by a single
//! [`registry::RegistryActor`] task. Per-connection WebSocket tasks and the
//! periodic staleness sweeper communicate with it exclusively through its
//! mailbox, so every inbound event is processed as an atomic unit with
//! respect to registry state.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod protocol;
pub mod registry;
pub mod routes;
pub mod sweeper;

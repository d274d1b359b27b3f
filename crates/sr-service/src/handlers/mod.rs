//! HTTP and WebSocket request handlers for the signaling relay.

pub mod health;
pub mod metrics;
pub mod tokens;
pub mod ws;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use tokens::{issue_token_handler, validate_token_handler};
pub use ws::ws_handler;

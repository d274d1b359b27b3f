//! Metrics definitions for the signaling relay.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sr_` prefix for the signaling relay
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `event`: 5 values (the client event vocabulary)
//! - `kind`: 3 values (offer, answer, ice-candidate)
//! - `reason`: 4 values (unknown_sender, unknown_session, unknown_target,
//!   rejected_input)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving metrics via HTTP.
///
/// Must be called before any metrics are recorded. Event handling is an
/// in-memory map operation, so latency buckets skew low.
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g., already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("sr_event".to_string()),
            &[
                0.000_1, 0.000_5, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250,
            ],
        )
        .map_err(|e| format!("Failed to set event latency buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Set the number of live WebSocket connections.
///
/// Metric: `sr_connections_active`
/// Labels: none
pub fn set_connections_active(count: usize) {
    // usize to f64 conversion is safe for realistic connection counts (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("sr_connections_active").set(count as f64);
}

/// Set the number of session records currently held.
///
/// Metric: `sr_sessions_active`
/// Labels: none
///
/// Counts empty-but-unswept sessions too; it tracks registry memory, not
/// paired calls.
pub fn set_sessions_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("sr_sessions_active").set(count as f64);
}

/// Record a successfully relayed handshake message.
///
/// Metric: `sr_messages_relayed_total`
/// Labels: `kind` (offer, answer, ice-candidate)
pub fn record_message_relayed(kind: &str) {
    counter!("sr_messages_relayed_total", "kind" => kind.to_string()).increment(1);
}

/// Record a message dropped before delivery.
///
/// Metric: `sr_messages_dropped_total`
/// Labels: `reason` (unknown_sender, unknown_session, unknown_target,
/// rejected_input)
///
/// Drops are silent on the wire (except rejected_input); this counter is
/// the only place they surface.
pub fn record_message_dropped(reason: &str) {
    counter!("sr_messages_dropped_total", "reason" => reason.to_string()).increment(1);
}

/// Record sessions deleted by the staleness sweeper.
///
/// Metric: `sr_sessions_swept_total`
/// Labels: none
///
/// A consistently non-zero rate means departure events are being lost
/// somewhere upstream of the registry.
pub fn record_sessions_swept(count: u64) {
    counter!("sr_sessions_swept_total").increment(count);
}

/// Record end-to-end handling latency for one inbound client event.
///
/// Metric: `sr_event_latency_seconds`
/// Labels: `event` (join-session, offer, answer, ice-candidate, end-session)
pub fn record_event_latency(event: &str, duration: Duration) {
    histogram!("sr_event_latency_seconds", "event" => event.to_string())
        .record(duration.as_secs_f64());
}

//! Periodic staleness sweeper.
//!
//! Runs beside the registry actor and, on each tick, asks it to delete
//! session records that are both empty and older than the retention
//! window. All actual inspection and deletion happens inside the actor,
//! so the sweep cannot race live join or departure traffic.

use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::registry::RegistryHandle;

/// Spawn the sweeper task.
///
/// Ticks every `interval`, sending the registry a sweep request stamped
/// with the current wall-clock time. Exits when `cancel` fires.
pub fn spawn(
    registry: RegistryHandle,
    interval: Duration,
    retention: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of tokio's interval fires immediately; a sweep
        // at startup is pointless since nothing can be stale yet.
        ticker.tick().await;

        tracing::info!(
            target: "sr.sweeper",
            interval_secs = interval.as_secs(),
            retention_secs = retention.as_secs(),
            "Staleness sweeper started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!(target: "sr.sweeper", "Staleness sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    registry.sweep_stale(Utc::now(), retention);
                }
            }
        }
    })
}

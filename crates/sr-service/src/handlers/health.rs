//! Health check handlers.
//!
//! - `/health`: liveness probe - returns OK if the process is running
//! - `/ready`: readiness probe - checks the registry actor is responsive

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::routes::AppState;

/// How long the readiness probe waits for the registry actor.
const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

/// Readiness probe response body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe handler.
///
/// Returns a simple "OK" to indicate the process is running. Does not
/// check any dependencies - failure means the process is hung.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Round-trips a status request through the registry actor's mailbox.
/// Returns 200 if the actor answered in time, 503 otherwise.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = tokio::time::timeout(READINESS_TIMEOUT, state.registry.status()).await;

    match status {
        Ok(Some(status)) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                sessions: Some(status.session_count),
                connections: Some(status.connection_count),
                error: None,
            }),
        ),
        Ok(None) | Err(_) => {
            tracing::warn!(target: "sr.health", "Readiness check failed: registry unresponsive");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    sessions: None,
                    connections: None,
                    error: Some("Service dependencies unavailable".to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let result = health_check().await;
        assert_eq!(result, "OK");
    }

    #[test]
    fn test_readiness_response_serialization() {
        let ready = ReadinessResponse {
            status: "ready",
            sessions: Some(2),
            connections: Some(4),
            error: None,
        };

        let json = serde_json::to_string(&ready).unwrap();
        assert!(json.contains("\"status\":\"ready\""));
        assert!(json.contains("\"sessions\":2"));
        assert!(!json.contains("\"error\""));

        let not_ready = ReadinessResponse {
            status: "not_ready",
            sessions: None,
            connections: None,
            error: Some("Service dependencies unavailable".to_string()),
        };

        let json = serde_json::to_string(&not_ready).unwrap();
        assert!(json.contains("\"status\":\"not_ready\""));
        assert!(!json.contains("\"sessions\""));
        assert!(json.contains("\"error\":\"Service dependencies unavailable\""));
    }
}

//! Access-token issuance and validation endpoints.
//!
//! Clients obtain a token here before opening a signaling connection.
//! Validation is offered as a separate endpoint so clients can check a
//! cached token without opening a WebSocket.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::SrError;
use crate::routes::AppState;
use common::token::{issue_token, validate_token};

/// Request body for `POST /api/v1/token`.
///
/// Fields are optional so a missing field yields our 400 response
/// instead of axum's default rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest {
    pub user_id: Option<String>,
    pub room_id: Option<String>,
}

/// Response body for `POST /api/v1/token`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenResponse {
    pub token: String,
    pub user_id: String,
    pub room_id: String,
    pub expires_in: u64,
}

/// Request body for `POST /api/v1/token/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: Option<String>,
}

/// Response body for `POST /api/v1/token/validate`.
#[derive(Debug, Serialize)]
pub struct ValidateTokenResponse {
    pub valid: bool,
}

/// Issue an access token for a user/room pair.
///
/// The room id is echoed back for client convenience; the token itself
/// binds only the user id.
pub async fn issue_token_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IssueTokenRequest>,
) -> Result<Json<IssueTokenResponse>, SrError> {
    let (Some(user_id), Some(room_id)) = (request.user_id, request.room_id) else {
        return Err(SrError::RejectedInput(
            "userId and roomId are required".to_string(),
        ));
    };

    let token = issue_token(
        &state.config.token_secret,
        state.config.app_id,
        &user_id,
        state.config.token_ttl,
    )
    .map_err(|e| SrError::Internal(format!("token signing failed: {e}")))?;

    tracing::info!(
        target: "sr.tokens",
        room_id = %room_id,
        "Issued access token"
    );

    Ok(Json(IssueTokenResponse {
        token,
        user_id,
        room_id,
        expires_in: state.config.token_ttl.as_secs(),
    }))
}

/// Check whether a token is currently valid.
///
/// Always returns 200 with a boolean; the reason for invalidity is
/// logged server-side only.
pub async fn validate_token_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateTokenRequest>,
) -> Result<Json<ValidateTokenResponse>, SrError> {
    let Some(token) = request.token else {
        return Err(SrError::RejectedInput("token is required".to_string()));
    };

    let valid = validate_token(&state.config.token_secret, state.config.app_id, &token).is_ok();

    Ok(Json(ValidateTokenResponse { valid }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_request_accepts_camel_case() {
        let request: IssueTokenRequest =
            serde_json::from_str(r#"{"userId": "alice", "roomId": "room-42"}"#).unwrap();
        assert_eq!(request.user_id.as_deref(), Some("alice"));
        assert_eq!(request.room_id.as_deref(), Some("room-42"));
    }

    #[test]
    fn test_issue_request_tolerates_missing_fields() {
        let request: IssueTokenRequest = serde_json::from_str("{}").unwrap();
        assert!(request.user_id.is_none());
        assert!(request.room_id.is_none());
    }

    #[test]
    fn test_issue_response_serializes_camel_case() {
        let response = IssueTokenResponse {
            token: "abc".to_string(),
            user_id: "alice".to_string(),
            room_id: "room-42".to_string(),
            expires_in: 86_400,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"userId\":\"alice\""));
        assert!(json.contains("\"roomId\":\"room-42\""));
        assert!(json.contains("\"expiresIn\":86400"));
    }
}

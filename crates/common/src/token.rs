//! Access-token utilities shared across Beacon components.
//!
//! Tokens are HS256-signed JWTs issued to clients before they open a
//! signaling connection. The relay itself treats them as an opaque
//! admission check: issue on request, verify signature + expiry + issuer.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HS256 is accepted during validation
//! - Error messages are intentionally generic to prevent information leakage
//! - The `sub` field in claims is redacted in Debug output

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Maximum allowed token size in bytes (8KB).
///
/// Typical tokens are a few hundred bytes; anything larger is rejected
/// before base64 decoding or signature verification runs.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Default token lifetime (24 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(86_400);

/// Errors that can occur during token issuance or validation.
///
/// Validation error messages are identical on purpose; callers log the
/// variant at debug level and return the generic message to clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is not a structurally valid JWT or the signature is wrong.
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token `exp` claim is in the past.
    #[error("The access token is invalid or expired")]
    Expired,

    /// Token `iss` claim does not match the configured application id.
    #[error("The access token is invalid or expired")]
    IssuerMismatch,

    /// Signing failed (bad key material).
    #[error("Token signing failed")]
    Signing,
}

/// Claims carried by a Beacon access token.
///
/// - `iss`: numeric application id the token was issued for
/// - `sub`: caller-supplied user id — redacted in Debug output
/// - `iat` / `exp`: Unix epoch seconds
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Application id the token was issued for.
    pub iss: i64,

    /// User id the token was issued to - redacted in Debug output.
    pub sub: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for AccessClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClaims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Issue an HS256 access token for `user_id`, valid for `ttl`.
///
/// # Errors
///
/// Returns `TokenError::Signing` if the encoding key is unusable.
pub fn issue_token(
    secret: &[u8],
    app_id: i64,
    user_id: &str,
    ttl: Duration,
) -> Result<String, TokenError> {
    issue_token_at(secret, app_id, user_id, ttl, chrono::Utc::now().timestamp())
}

/// Deterministic variant of [`issue_token`] with an explicit `now`.
///
/// Exists so expiry boundaries can be unit-tested without wall-clock
/// dependence; production code goes through [`issue_token`].
pub fn issue_token_at(
    secret: &[u8],
    app_id: i64,
    user_id: &str,
    ttl: Duration,
    now: i64,
) -> Result<String, TokenError> {
    // ttl is operator-configured and far below i64 range
    #[allow(clippy::cast_possible_wrap)]
    let ttl_secs = ttl.as_secs() as i64;

    let claims = AccessClaims {
        iss: app_id,
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| {
        tracing::debug!(target: "common.token", error = %e, "Token signing failed");
        TokenError::Signing
    })
}

/// Validate an access token: size limit, HS256 signature, expiry, issuer.
///
/// A token is valid iff the signature verifies, `exp` is strictly in the
/// future, and `iss` equals the configured application id.
///
/// # Errors
///
/// Returns a `TokenError` variant describing why validation failed. All
/// validation variants render the same client-safe message.
pub fn validate_token(secret: &[u8], app_id: i64, token: &str) -> Result<AccessClaims, TokenError> {
    validate_token_at(secret, app_id, token, chrono::Utc::now().timestamp())
}

/// Deterministic variant of [`validate_token`] with an explicit `now`.
pub fn validate_token_at(
    secret: &[u8],
    app_id: i64,
    token: &str,
    now: i64,
) -> Result<AccessClaims, TokenError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "common.token",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(TokenError::TokenTooLarge);
    }

    // Expiry and issuer are checked explicitly below against the supplied
    // `now`, so the library's wall-clock exp validation is disabled.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims = HashSet::new();

    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| {
            tracing::debug!(target: "common.token", error = %e, "Token rejected: decode failed");
            TokenError::MalformedToken
        })?;

    if data.claims.exp <= now {
        tracing::debug!(
            target: "common.token",
            exp = data.claims.exp,
            now = now,
            "Token rejected: expired"
        );
        return Err(TokenError::Expired);
    }

    if data.claims.iss != app_id {
        tracing::debug!(
            target: "common.token",
            iss = data.claims.iss,
            "Token rejected: issuer mismatch"
        );
        return Err(TokenError::IssuerMismatch);
    }

    Ok(data.claims)
}

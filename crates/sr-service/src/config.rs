use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Minimum decoded token secret length in bytes.
const MIN_TOKEN_SECRET_BYTES: usize = 32;

/// Service configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP/WebSocket server binds to.
    pub bind_address: String,
    /// HMAC secret for access tokens (base64 in the environment).
    pub token_secret: Vec<u8>,
    /// Application id embedded in issued tokens as `iss`.
    pub app_id: i64,
    /// Whether the WebSocket endpoint requires a valid access token.
    pub require_token: bool,
    /// Lifetime of issued access tokens.
    pub token_ttl: Duration,
    /// Age past which an empty session becomes eligible for sweeping.
    pub session_retention: Duration,
    /// Period of the staleness sweeper.
    pub sweep_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid token secret: {0}")]
    InvalidTokenSecret(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let token_secret_base64 = vars
            .get("SR_TOKEN_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("SR_TOKEN_SECRET".to_string()))?;

        let token_secret = general_purpose::STANDARD
            .decode(token_secret_base64)
            .map_err(ConfigError::Base64Error)?;

        if token_secret.len() < MIN_TOKEN_SECRET_BYTES {
            return Err(ConfigError::InvalidTokenSecret(format!(
                "Expected at least {} bytes, got {}",
                MIN_TOKEN_SECRET_BYTES,
                token_secret.len()
            )));
        }

        let app_id = parse_or("SR_APP_ID", vars, 1_i64)?;
        let require_token = parse_bool_or("SR_REQUIRE_TOKEN", vars, false)?;
        let token_ttl = Duration::from_secs(parse_or("SR_TOKEN_TTL_SECS", vars, 86_400_u64)?);
        let session_retention =
            Duration::from_secs(parse_or("SR_SESSION_RETENTION_SECS", vars, 86_400_u64)?);
        let sweep_interval =
            Duration::from_secs(parse_or("SR_SWEEP_INTERVAL_SECS", vars, 3_600_u64)?);

        Ok(Config {
            bind_address,
            token_secret,
            app_id,
            require_token,
            token_ttl,
            session_retention,
            sweep_interval,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &str,
    vars: &HashMap<String, String>,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), raw.clone())),
    }
}

fn parse_bool_or(
    key: &str,
    vars: &HashMap<String, String>,
    default: bool,
) -> Result<bool, ConfigError> {
    match vars.get(key).map(String::as_str) {
        None => Ok(default),
        Some("true" | "1") => Ok(true),
        Some("false" | "0") => Ok(false),
        Some(raw) => Err(ConfigError::InvalidValue(key.to_string(), raw.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn test_secret_base64() -> String {
        general_purpose::STANDARD.encode([0u8; 32])
    }

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([("SR_TOKEN_SECRET".to_string(), test_secret_base64())])
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.token_secret.len(), 32);
        assert_eq!(config.app_id, 1);
        assert!(!config.require_token);
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.session_retention, Duration::from_secs(86_400));
        assert_eq!(config.sweep_interval, Duration::from_secs(3_600));
    }

    #[test]
    fn test_from_vars_overrides() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("SR_APP_ID".to_string(), "1390967091".to_string());
        vars.insert("SR_REQUIRE_TOKEN".to_string(), "true".to_string());
        vars.insert("SR_TOKEN_TTL_SECS".to_string(), "3600".to_string());
        vars.insert("SR_SESSION_RETENTION_SECS".to_string(), "7200".to_string());
        vars.insert("SR_SWEEP_INTERVAL_SECS".to_string(), "60".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.app_id, 1_390_967_091);
        assert!(config.require_token);
        assert_eq!(config.token_ttl, Duration::from_secs(3_600));
        assert_eq!(config.session_retention, Duration::from_secs(7_200));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_from_vars_missing_token_secret() {
        let result = Config::from_vars(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "SR_TOKEN_SECRET"));
    }

    #[test]
    fn test_from_vars_invalid_base64_secret() {
        let vars = HashMap::from([(
            "SR_TOKEN_SECRET".to_string(),
            "not-valid-base64!@#$".to_string(),
        )]);

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::Base64Error(_))));
    }

    #[test]
    fn test_from_vars_secret_too_short() {
        let vars = HashMap::from([(
            "SR_TOKEN_SECRET".to_string(),
            general_purpose::STANDARD.encode([0u8; 16]),
        )]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidTokenSecret(msg)) if msg.contains("got 16"))
        );
    }

    #[test]
    fn test_from_vars_invalid_bool() {
        let mut vars = base_vars();
        vars.insert("SR_REQUIRE_TOKEN".to_string(), "yes".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(key, _)) if key == "SR_REQUIRE_TOKEN")
        );
    }

    #[test]
    fn test_from_vars_invalid_number() {
        let mut vars = base_vars();
        vars.insert("SR_SWEEP_INTERVAL_SECS".to_string(), "soon".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(key, raw)) if key == "SR_SWEEP_INTERVAL_SECS" && raw == "soon")
        );
    }
}

//! Configuration for the Identity Controller.
//!
//! All values come from environment variables. Secrets are held as
//! [`SecretString`] so they cannot leak through `Debug` or log output.
//! Parse failures are typed and abort startup; nothing falls back to a
//! half-configured service.

use std::collections::HashMap;
use std::time::Duration;

use common::issuer::{TokenTtls, DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL};
use common::secret::{ExposeSecret, SecretString};
use common::signing::{DEV_SIGNING_SECRET, MIN_SECRET_LEN};
use thiserror::Error;

// ===== Defaults =====

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8083";

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Default per-operation deadline for TTL store calls, in milliseconds.
pub const DEFAULT_STORE_OP_TIMEOUT_MS: u64 = 2_000;

/// Default session cache entry lifetime, in seconds.
pub const DEFAULT_SESSION_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

// ===== Errors =====

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable is set to an unusable value.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// Name of the offending variable.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },
}

// ===== Config =====

/// Runtime configuration for the Identity Controller.
#[derive(Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// Connection URL for the TTL store (may embed credentials).
    pub redis_url: SecretString,
    /// Symmetric secret for token signing and verification.
    pub signing_secret: SecretString,
    /// Access and refresh token lifetimes.
    pub token_ttls: TokenTtls,
    /// Lifetime of session cache entries.
    pub session_cache_ttl: Duration,
    /// bcrypt cost factor for password hashing.
    pub bcrypt_cost: u32,
    /// Per-operation deadline for TTL store calls.
    pub store_op_timeout: Duration,
}

// Manual Debug so the secrets never reach logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("redis_url", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("token_ttls", &self.token_ttls)
            .field("session_cache_ttl", &self.session_cache_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("store_op_timeout", &self.store_op_timeout)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `REDIS_URL` is missing or any variable holds an
    /// unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load configuration from an explicit variable map.
    ///
    /// # Errors
    ///
    /// Returns an error if `REDIS_URL` is missing or any variable holds an
    /// unusable value.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let redis_url = vars
            .get("REDIS_URL")
            .cloned()
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("REDIS_URL".to_string()))?;

        let signing_secret = vars
            .get("AUTH_SIGNING_SECRET")
            .cloned()
            .unwrap_or_else(|| DEV_SIGNING_SECRET.to_string());
        if signing_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue {
                var: "AUTH_SIGNING_SECRET".to_string(),
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }
        let signing_secret = SecretString::from(signing_secret);

        let access_secs = parse_positive(vars, "ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL.as_secs())?;
        let refresh_secs =
            parse_positive(vars, "REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL.as_secs())?;
        let session_secs =
            parse_positive(vars, "SESSION_CACHE_TTL_SECS", DEFAULT_SESSION_CACHE_TTL_SECS)?;
        let timeout_ms = parse_positive(vars, "STORE_OP_TIMEOUT_MS", DEFAULT_STORE_OP_TIMEOUT_MS)?;

        let bcrypt_cost = match vars.get("BCRYPT_COST") {
            None => DEFAULT_BCRYPT_COST,
            Some(raw) => {
                let cost: u32 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    var: "BCRYPT_COST".to_string(),
                    reason: format!("expected an integer, got {raw:?}"),
                })?;
                // bcrypt only accepts costs in 4..=31.
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::InvalidValue {
                        var: "BCRYPT_COST".to_string(),
                        reason: format!("must be between 4 and 31, got {cost}"),
                    });
                }
                cost
            }
        };

        Ok(Self {
            bind_address,
            redis_url,
            signing_secret,
            token_ttls: TokenTtls {
                access: Duration::from_secs(access_secs),
                refresh: Duration::from_secs(refresh_secs),
            },
            session_cache_ttl: Duration::from_secs(session_secs),
            bcrypt_cost,
            store_op_timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Whether the development placeholder secret is in effect.
    #[must_use]
    pub fn placeholder_secret_active(&self) -> bool {
        self.signing_secret.expose_secret() == DEV_SIGNING_SECRET
    }
}

fn parse_positive(
    vars: &HashMap<String, String>,
    var: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = vars.get(var) else {
        return Ok(default);
    };
    let value: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        reason: format!("expected an integer, got {raw:?}"),
    })?;
    // Zero would mint tokens that are born expired or disable the store
    // deadline entirely.
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(value)
}

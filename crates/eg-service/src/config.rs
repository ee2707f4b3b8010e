//! Configuration for the Edge Gateway.
//!
//! All values come from environment variables. Secrets are held as
//! [`SecretString`] so they cannot leak through `Debug` or log output.
//! Parse failures are typed and abort startup; nothing falls back to a
//! half-configured gateway.

use std::collections::HashMap;
use std::time::Duration;

use common::secret::{ExposeSecret, SecretString};
use common::signing::{DEV_SIGNING_SECRET, MIN_SECRET_LEN};
use thiserror::Error;

// ===== Defaults =====

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default per-operation deadline for TTL store calls, in milliseconds.
pub const DEFAULT_STORE_OP_TIMEOUT_MS: u64 = 2_000;

/// Path prefixes that bypass token validation when `EG_ALLOW_LIST` is unset.
///
/// Login, registration, code delivery and refresh must be reachable without
/// an access token (refresh authenticates itself with the refresh token it
/// carries). Probes and metrics stay open for the platform around us.
pub const DEFAULT_ALLOW_LIST: &[&str] = &[
    "/api/v1/auth/login",
    "/api/v1/auth/register",
    "/api/v1/auth/code",
    "/api/v1/auth/refresh",
    "/health",
    "/ready",
    "/metrics",
    "/favicon.ico",
];

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

// ===== Allow list =====

/// Ordered path prefixes exempt from token validation.
///
/// Parsed once at config load and read-only afterwards. Matching is plain
/// prefix comparison, so `/health` also admits `/health/live`.
#[derive(Clone, Debug)]
pub struct AllowList(Vec<String>);

impl AllowList {
    /// The built-in prefixes from [`DEFAULT_ALLOW_LIST`].
    #[must_use]
    pub fn defaults() -> Self {
        Self(DEFAULT_ALLOW_LIST.iter().map(|&p| p.to_owned()).collect())
    }

    /// Whether `path` starts with any listed prefix.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.0.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Number of prefixes, for startup logging.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty. Config loading never produces one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ===== Config =====

/// Runtime configuration for the Edge Gateway.
#[derive(Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// Connection URL for the TTL store (may embed credentials).
    pub redis_url: SecretString,
    /// Symmetric secret for token verification.
    pub signing_secret: SecretString,
    /// Path prefixes exempt from token validation.
    pub allow_list: AllowList,
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
            .field("allow_list", &self.allow_list)
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

        let allow_list = match vars.get("EG_ALLOW_LIST") {
            None => AllowList::defaults(),
            Some(raw) => parse_allow_list(raw)?,
        };

        let timeout_ms = parse_positive(vars, "STORE_OP_TIMEOUT_MS", DEFAULT_STORE_OP_TIMEOUT_MS)?;

        Ok(Self {
            bind_address,
            redis_url,
            signing_secret,
            allow_list,
            store_op_timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Whether the development placeholder secret is in effect.
    #[must_use]
    pub fn placeholder_secret_active(&self) -> bool {
        self.signing_secret.expose_secret() == DEV_SIGNING_SECRET
    }
}

fn parse_allow_list(raw: &str) -> Result<AllowList, ConfigError> {
    let prefixes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    // An empty list would shut out the platform's own probes; unset means
    // "use the defaults", so an all-blank value is a mistake.
    if prefixes.is_empty() {
        return Err(ConfigError::InvalidValue {
            var: "EG_ALLOW_LIST".to_string(),
            reason: "must contain at least one path prefix".to_string(),
        });
    }
    for prefix in &prefixes {
        if !prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                var: "EG_ALLOW_LIST".to_string(),
                reason: format!("prefix {prefix:?} must start with '/'"),
            });
        }
    }
    Ok(AllowList(prefixes))
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
    // Zero would disable the store deadline entirely.
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(value)
}

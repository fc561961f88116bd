//! Client and authentication configuration.
//!
//! Both [`ClientConfig`] and [`AuthConfig`] load from environment variables
//! via `from_env`, or from a map via `from_vars` for tests.

use crate::backoff::{ExponentialBackoff, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF};
use crate::error::TokenError;
use crate::secret::SecretString;
use crate::token_manager::TokenManager;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout for HTTP client.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default ceiling for network-level retries (liveness probe attempts).
pub const DEFAULT_MAX_NETWORK_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("No authentication method configured")]
    NoAuthMethod,
}

fn parse_var<T: FromStr>(vars: &HashMap<String, String>, name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: fmt::Display,
{
    vars.get(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Connection settings for the catalog service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Tenant base URL (e.g., `https://tenant.example.com`).
    pub base_url: String,

    /// Ceiling for network-level retries.
    pub max_network_retries: u32,

    /// HTTP request timeout.
    pub http_timeout: Duration,

    /// HTTP connect timeout.
    pub connect_timeout: Duration,

    /// First backoff delay.
    pub backoff_initial: Duration,

    /// Largest backoff delay.
    pub backoff_max: Duration,
}

impl ClientConfig {
    /// Create a configuration with default timeouts and retry settings.
    ///
    /// Using HTTP URLs in production sends credentials in plain text. Use
    /// [`ClientConfig::new_secure`] to enforce HTTPS.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            max_network_retries: DEFAULT_MAX_NETWORK_RETRIES,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            backoff_initial: DEFAULT_INITIAL_BACKOFF,
            backoff_max: DEFAULT_MAX_BACKOFF,
        }
    }

    /// Create a configuration requiring HTTPS.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` if the URL doesn't use HTTPS.
    pub fn new_secure(base_url: String) -> Result<Self, TokenError> {
        if !base_url.starts_with("https://") {
            return Err(TokenError::Configuration(
                "Catalog base URL must use HTTPS".into(),
            ));
        }
        Ok(Self::new(base_url))
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `CATALOG_BASE_URL` is absent
    /// and `ConfigError::InvalidValue` if a numeric setting does not parse.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let base_url = vars
            .get("CATALOG_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("CATALOG_BASE_URL".to_string()))?
            .clone();

        let mut config = Self::new(base_url);

        if let Some(retries) = parse_var::<u32>(vars, "CATALOG_MAX_NETWORK_RETRIES")? {
            config.max_network_retries = retries;
        }
        if let Some(secs) = parse_var::<u64>(vars, "CATALOG_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(vars, "CATALOG_CONNECT_TIMEOUT_SECS")? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64>(vars, "CATALOG_BACKOFF_INITIAL_MS")? {
            config.backoff_initial = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(vars, "CATALOG_BACKOFF_MAX_MS")? {
            config.backoff_max = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Set the network retry ceiling.
    #[must_use]
    pub fn with_max_network_retries(mut self, retries: u32) -> Self {
        self.max_network_retries = retries;
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the backoff bounds.
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff_initial = initial;
        self.backoff_max = max;
        self
    }

    /// Backoff policy described by this configuration.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.backoff_initial, self.backoff_max)
    }
}

// =============================================================================
// Authentication Configuration
// =============================================================================

/// Which credential strategy to use, with its inputs.
#[derive(Clone)]
pub enum AuthConfig {
    /// Pre-issued API key.
    ApiToken { api_key: SecretString },
    /// OAuth client-credentials grant.
    OAuthClient {
        client_id: String,
        client_secret: SecretString,
    },
    /// Local basic authentication.
    Basic {
        username: String,
        password: SecretString,
    },
    /// Impersonate a user via in-tenant trust.
    Impersonation { user_id: String },
    /// Escalate with no credentials.
    Escalation,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::ApiToken { .. } => f
                .debug_struct("ApiToken")
                .field("api_key", &"[REDACTED]")
                .finish(),
            AuthConfig::OAuthClient { client_id, .. } => f
                .debug_struct("OAuthClient")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
            AuthConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            AuthConfig::Impersonation { user_id } => f
                .debug_struct("Impersonation")
                .field("user_id", user_id)
                .finish(),
            AuthConfig::Escalation => f.write_str("Escalation"),
        }
    }
}

impl AuthConfig {
    /// Load the authentication method from environment variables
    ///
    /// # Errors
    ///
    /// See [`AuthConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load the authentication method from a `HashMap` (for testing)
    ///
    /// Checked in order: `CATALOG_API_KEY`, `CATALOG_CLIENT_ID` +
    /// `CATALOG_CLIENT_SECRET`, `CATALOG_BASIC_USER` +
    /// `CATALOG_BASIC_PASSWORD`, `CATALOG_IMPERSONATE_USER`,
    /// `CATALOG_ESCALATE=true`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingEnvVar` if only half of a pair is set
    /// - `ConfigError::InvalidValue` if `CATALOG_ESCALATE` is not a boolean
    /// - `ConfigError::NoAuthMethod` if nothing is configured
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| vars.get(name).filter(|v| !v.is_empty()).cloned();
        let required = |name: &str| {
            non_empty(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
        };

        if let Some(api_key) = non_empty("CATALOG_API_KEY") {
            return Ok(AuthConfig::ApiToken {
                api_key: SecretString::from(api_key),
            });
        }

        if let Some(client_id) = non_empty("CATALOG_CLIENT_ID") {
            let client_secret = required("CATALOG_CLIENT_SECRET")?;
            return Ok(AuthConfig::OAuthClient {
                client_id,
                client_secret: SecretString::from(client_secret),
            });
        }

        if let Some(username) = non_empty("CATALOG_BASIC_USER") {
            let password = required("CATALOG_BASIC_PASSWORD")?;
            return Ok(AuthConfig::Basic {
                username,
                password: SecretString::from(password),
            });
        }

        if let Some(user_id) = non_empty("CATALOG_IMPERSONATE_USER") {
            return Ok(AuthConfig::Impersonation { user_id });
        }

        if parse_var::<bool>(vars, "CATALOG_ESCALATE")?.unwrap_or(false) {
            return Ok(AuthConfig::Escalation);
        }

        Err(ConfigError::NoAuthMethod)
    }

    /// Build the token manager for this method, using the client's backoff.
    #[must_use]
    pub fn into_manager(self, client: &ClientConfig) -> TokenManager {
        let manager = match self {
            AuthConfig::ApiToken { api_key } => TokenManager::api_token(api_key),
            AuthConfig::OAuthClient {
                client_id,
                client_secret,
            } => TokenManager::oauth_client(client_id, client_secret),
            AuthConfig::Basic { username, password } => {
                TokenManager::basic_auth(&username, &password)
            }
            AuthConfig::Impersonation { user_id } => TokenManager::impersonation(user_id),
            AuthConfig::Escalation => TokenManager::escalation(),
        };
        manager.with_backoff(Arc::new(client.backoff()))
    }
}

// =============================================================================
// Observability Configuration
// =============================================================================

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Enable JSON-formatted logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

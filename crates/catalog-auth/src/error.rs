//! Error types for credential management.

use thiserror::Error;

/// Errors that can occur while obtaining, validating, or using a credential.
///
/// Transient acquisition failures are not represented here: a strategy
/// reports them as `Ok(None)` and the manager retries them locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The strategy has no way to mint a new credential. Never retried.
    #[error("Cannot refresh credential: {0}")]
    Unsupported(String),

    /// No credential is held.
    #[error("No credential is held")]
    MissingCredential,

    /// The held credential is a zero-length string.
    #[error("Credential is empty")]
    EmptyCredential,

    /// The held credential contains whitespace.
    #[error("Credential is malformed: contains whitespace")]
    MalformedCredential,

    /// Every refresh attempt failed.
    #[error("Credential refresh failed after {attempts} attempts")]
    RefreshExhausted {
        /// Number of acquisition attempts made.
        attempts: u32,
    },

    /// HTTP client error.
    #[error("HTTP client error: {0}")]
    HttpError(String),

    /// Credentials rejected by the catalog (400, 401, 403).
    #[error("Authentication rejected: {0}")]
    AuthenticationRejected(String),

    /// Response body could not be parsed.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TokenError {
    /// Whether this error came from talking to the remote service.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            TokenError::HttpError(_)
                | TokenError::AuthenticationRejected(_)
                | TokenError::InvalidResponse(_)
        )
    }
}

/// Result type alias using `TokenError`
pub type Result<T> = std::result::Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_display() {
        let err = TokenError::Unsupported("api tokens are pre-issued".to_string());
        assert!(err.to_string().contains("api tokens are pre-issued"));

        let err = TokenError::HttpError("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = TokenError::AuthenticationRejected("Status 401".to_string());
        assert!(err.to_string().contains("401"));

        let err = TokenError::RefreshExhausted { attempts: 5 };
        assert!(err.to_string().contains("5 attempts"));

        let err = TokenError::MalformedCredential;
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn test_is_remote() {
        assert!(TokenError::HttpError("x".into()).is_remote());
        assert!(TokenError::AuthenticationRejected("x".into()).is_remote());
        assert!(TokenError::InvalidResponse("x".into()).is_remote());
        assert!(!TokenError::Unsupported("x".into()).is_remote());
        assert!(!TokenError::MissingCredential.is_remote());
    }
}

//! The secret value a [`TokenManager`](crate::TokenManager) holds.

use crate::error::TokenError;
use crate::secret::{ExposeSecret, SecretString};
use base64::{engine::general_purpose, Engine as _};
use std::fmt;

/// Authorization scheme prefixed to a credential on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Bearer <token>`
    Bearer,
    /// `Basic <base64(user:pass)>`
    Basic,
}

impl AuthScheme {
    /// Scheme name as it appears in the header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer",
            AuthScheme::Basic => "Basic",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque credential.
///
/// Replaced wholesale on refresh, never mutated in place. The header value is
/// computed on demand by [`Credential::header_value`].
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a raw credential string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Build the pre-encoded credential used by the `Basic` scheme.
    #[must_use]
    pub fn basic(username: &str, password: &SecretString) -> Self {
        let raw = format!("{username}:{}", password.expose_secret());
        Self::new(general_purpose::STANDARD.encode(raw))
    }

    /// Expose the raw credential. Never log the result.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the credential is a zero-length string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose_secret().is_empty()
    }

    /// Check the credential is non-empty and whitespace-free.
    ///
    /// # Errors
    ///
    /// - `TokenError::EmptyCredential` for a zero-length credential
    /// - `TokenError::MalformedCredential` if it contains any whitespace
    pub fn check(&self) -> Result<(), TokenError> {
        let raw = self.expose_secret();
        if raw.is_empty() {
            return Err(TokenError::EmptyCredential);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(TokenError::MalformedCredential);
        }
        Ok(())
    }

    /// Format as an `Authorization` header value.
    #[must_use]
    pub fn header_value(&self, scheme: AuthScheme) -> String {
        format!("{scheme} {}", self.expose_secret())
    }
}

impl From<SecretString> for Credential {
    fn from(secret: SecretString) -> Self {
        Self(secret)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

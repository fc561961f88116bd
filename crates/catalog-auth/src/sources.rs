//! Credential acquisition strategies.
//!
//! | Source | Header | Refresh |
//! |---|---|---|
//! | [`ApiTokenSource`] | `Bearer` | unsupported |
//! | [`BasicAuthSource`] | `Basic` | unsupported |
//! | [`OAuthClientSource`] | `Bearer` | OAuth client-credentials exchange |
//! | [`ImpersonationSource`] | `Bearer` | impersonate a user |
//! | [`EscalationSource`] | `Bearer` | tokenless escalation |

use crate::client::CatalogApi;
use crate::credential::{AuthScheme, Credential};
use crate::error::TokenError;
use crate::secret::{ExposeSecret, SecretString};
use crate::token_manager::TokenSource;
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

/// Pre-issued API key. The key is supplied at construction and never renewed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiTokenSource;

#[async_trait]
impl TokenSource for ApiTokenSource {
    fn name(&self) -> &'static str {
        "api_token"
    }

    async fn refresh_token(
        &self,
        _client: &dyn CatalogApi,
    ) -> Result<Option<Credential>, TokenError> {
        Err(TokenError::Unsupported(
            "API tokens are pre-issued and cannot be refreshed".to_string(),
        ))
    }
}

/// Local basic authentication with a pre-encoded `user:pass`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAuthSource;

#[async_trait]
impl TokenSource for BasicAuthSource {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn scheme(&self) -> AuthScheme {
        AuthScheme::Basic
    }

    async fn refresh_token(
        &self,
        _client: &dyn CatalogApi,
    ) -> Result<Option<Credential>, TokenError> {
        Err(TokenError::Unsupported(
            "basic authentication cannot be refreshed".to_string(),
        ))
    }
}

/// OAuth client-credentials grant.
pub struct OAuthClientSource {
    client_id: String,
    client_secret: SecretString,
}

impl OAuthClientSource {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    /// OAuth client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Debug for OAuthClientSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientSource")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenSource for OAuthClientSource {
    fn name(&self) -> &'static str {
        "oauth_client"
    }

    async fn refresh_token(
        &self,
        client: &dyn CatalogApi,
    ) -> Result<Option<Credential>, TokenError> {
        let access_token = client
            .oauth_exchange(&self.client_id, &self.client_secret)
            .await?;

        if access_token.expose_secret().is_empty() {
            debug!(
                target: "catalog_auth.sources",
                client_id = %self.client_id,
                "OAuth exchange returned no access token"
            );
            return Ok(None);
        }

        Ok(Some(Credential::from(access_token)))
    }
}

/// Impersonates a user through in-tenant trust.
#[derive(Debug, Clone)]
pub struct ImpersonationSource {
    user_id: String,
}

impl ImpersonationSource {
    #[must_use]
    pub fn new(user_id: String) -> Self {
        Self { user_id }
    }
}

#[async_trait]
impl TokenSource for ImpersonationSource {
    fn name(&self) -> &'static str {
        "impersonation"
    }

    async fn refresh_token(
        &self,
        client: &dyn CatalogApi,
    ) -> Result<Option<Credential>, TokenError> {
        Ok(client
            .impersonate_as_user(&self.user_id)
            .await?
            .map(Credential::from))
    }
}

/// Escalates with no credentials, relying on ambient in-process trust.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalationSource;

#[async_trait]
impl TokenSource for EscalationSource {
    fn name(&self) -> &'static str {
        "escalation"
    }

    async fn refresh_token(
        &self,
        client: &dyn CatalogApi,
    ) -> Result<Option<Credential>, TokenError> {
        Ok(client.escalate().await?.map(Credential::from))
    }
}

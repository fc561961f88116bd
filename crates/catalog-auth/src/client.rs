//! Remote catalog operations used by the token manager.
//!
//! [`CatalogApi`] is the seam between credential management and the wire.
//! [`HttpCatalogClient`] is the production implementation; tests substitute a
//! scripted one.
//!
//! # Security
//!
//! - Client secrets and returned tokens stay in `SecretString`
//! - Rejection bodies are logged at trace level only
//! - Request and connect timeouts bound every call

use crate::config::ClientConfig;
use crate::error::TokenError;
use crate::secret::{ExposeSecret, SecretString};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument, trace, warn};

/// OAuth client-credentials exchange path.
pub const OAUTH_TOKEN_PATH: &str = "/api/service/oauth-clients/token";

/// Impersonate-as-user path.
pub const IMPERSONATE_USER_PATH: &str = "/api/service/impersonate/user";

/// Tokenless escalation path.
pub const ESCALATE_PATH: &str = "/api/service/impersonate/escalate";

/// Type definition listing path, used as the liveness probe.
pub const TYPEDEFS_PATH: &str = "/api/meta/types/typedefs";

// =============================================================================
// Wire Types
// =============================================================================

/// Category filter for a type definition listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefCategory {
    Enum,
    Struct,
    Classification,
    Entity,
    Relationship,
    BusinessMetadata,
}

impl TypeDefCategory {
    /// Value of the `type` query parameter.
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            TypeDefCategory::Enum => "enum",
            TypeDefCategory::Struct => "struct",
            TypeDefCategory::Classification => "classification",
            TypeDefCategory::Entity => "entity",
            TypeDefCategory::Relationship => "relationship",
            TypeDefCategory::BusinessMetadata => "business_metadata",
        }
    }
}

/// Response of a type definition listing.
///
/// Definitions are kept as raw JSON; only their presence matters here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeDefListing {
    pub enum_defs: Vec<serde_json::Value>,
    pub struct_defs: Vec<serde_json::Value>,
    pub classification_defs: Vec<serde_json::Value>,
    pub entity_defs: Vec<serde_json::Value>,
    pub relationship_defs: Vec<serde_json::Value>,
    pub business_metadata_defs: Vec<serde_json::Value>,
}

impl TypeDefListing {
    /// Total number of definitions across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.enum_defs.len()
            + self.struct_defs.len()
            + self.classification_defs.len()
            + self.entity_defs.len()
            + self.relationship_defs.len()
            + self.business_metadata_defs.len()
    }

    /// Whether the listing holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OAuthTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

/// Token response shared by the exchange, impersonate, and escalate calls.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<SecretString>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[derive(Serialize)]
struct ImpersonateRequest<'a> {
    user: &'a str,
}

// =============================================================================
// Catalog API
// =============================================================================

/// Remote operations the token manager depends on.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// OAuth2 client-credentials grant. An empty token means none was issued.
    async fn oauth_exchange(
        &self,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<SecretString, TokenError>;

    /// Mint a token for `user_id` using in-tenant trust.
    async fn impersonate_as_user(&self, user_id: &str)
        -> Result<Option<SecretString>, TokenError>;

    /// Mint an escalated token with no caller credentials.
    async fn escalate(&self) -> Result<Option<SecretString>, TokenError>;

    /// Cheap, idempotent read that needs an active token to return content.
    async fn list_type_defs(
        &self,
        category: TypeDefCategory,
        auth_header: &str,
    ) -> Result<TypeDefListing, TokenError>;

    /// Upper bound on attempts for network-level retries such as the liveness probe.
    fn max_network_retries(&self) -> u32;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// `CatalogApi` over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    base_url: String,
    http_client: reqwest::Client,
    max_network_retries: u32,
}

impl HttpCatalogClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, TokenError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TokenError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            max_network_retries: config.max_network_retries,
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<T, TokenError> {
        let response = request.send().await.map_err(|e| {
            debug!(target: "catalog_auth.client", operation, error = %e, "HTTP request failed");
            TokenError::HttpError(e.to_string())
        })?;

        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                warn!(target: "catalog_auth.client", operation, error = %e, "Failed to parse response");
                TokenError::InvalidResponse(e.to_string())
            });
        }

        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let body = response.text().await.unwrap_or_else(|e| {
                trace!(target: "catalog_auth.client", error = %e, "Failed to read error response body");
                "<failed to read body>".to_string()
            });
            warn!(target: "catalog_auth.client", operation, status = %status, "Request rejected by catalog");
            trace!(target: "catalog_auth.client", body = %body, "Rejection response body");
            return Err(TokenError::AuthenticationRejected(format!("Status {status}")));
        }

        if status.is_server_error() {
            warn!(target: "catalog_auth.client", operation, status = %status, "Catalog returned server error");
            return Err(TokenError::HttpError(format!("Catalog server error: {status}")));
        }

        warn!(target: "catalog_auth.client", operation, status = %status, "Unexpected response from catalog");
        Err(TokenError::HttpError(format!("Unexpected status: {status}")))
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    #[instrument(skip_all, fields(client_id = %client_id))]
    async fn oauth_exchange(
        &self,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<SecretString, TokenError> {
        let body = OAuthTokenRequest {
            client_id,
            client_secret: client_secret.expose_secret(),
        };
        let request = self.http_client.post(self.url(OAUTH_TOKEN_PATH)).json(&body);
        let response: TokenResponse = self.send(request, "oauth_exchange").await?;

        debug!(
            target: "catalog_auth.client",
            expires_in_secs = ?response.expires_in,
            "OAuth exchange completed"
        );

        Ok(response
            .access_token
            .unwrap_or_else(|| SecretString::from("")))
    }

    #[instrument(skip_all)]
    async fn impersonate_as_user(
        &self,
        user_id: &str,
    ) -> Result<Option<SecretString>, TokenError> {
        let request = self
            .http_client
            .post(self.url(IMPERSONATE_USER_PATH))
            .json(&ImpersonateRequest { user: user_id });
        let response: TokenResponse = self.send(request, "impersonate_as_user").await?;
        Ok(response.access_token)
    }

    #[instrument(skip_all)]
    async fn escalate(&self) -> Result<Option<SecretString>, TokenError> {
        let request = self.http_client.post(self.url(ESCALATE_PATH));
        let response: TokenResponse = self.send(request, "escalate").await?;
        Ok(response.access_token)
    }

    #[instrument(skip_all, fields(category = category.as_query()))]
    async fn list_type_defs(
        &self,
        category: TypeDefCategory,
        auth_header: &str,
    ) -> Result<TypeDefListing, TokenError> {
        let request = self
            .http_client
            .get(self.url(TYPEDEFS_PATH))
            .query(&[("type", category.as_query())])
            .header(AUTHORIZATION, auth_header);
        self.send(request, "list_type_defs").await
    }

    fn max_network_retries(&self) -> u32 {
        self.max_network_retries
    }
}

// =============================================================================
// Tests
// =============================================================================

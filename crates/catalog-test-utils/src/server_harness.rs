//! Wiremock-backed catalog server for end-to-end tests.
//!
//! Provides `TestCatalogServer`, which mounts the endpoints
//! `HttpCatalogClient` calls.

use catalog_auth::client::{
    HttpCatalogClient, ESCALATE_PATH, IMPERSONATE_USER_PATH, OAUTH_TOKEN_PATH, TYPEDEFS_PATH,
};
use catalog_auth::config::ClientConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Test harness wrapping a `wiremock::MockServer`.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_oauth_flow_e2e() {
///     let server = TestCatalogServer::start().await;
///     server.mount_oauth_tokens(&["tok-xyz"]).await;
///     server.mount_typedefs("Bearer tok-xyz").await;
///
///     let client = server.client();
///     let manager = TokenManager::oauth_client("client".into(), "secret".into());
///     assert_eq!(manager.header(&client).await?, "Bearer tok-xyz");
/// }
/// ```
pub struct TestCatalogServer {
    server: MockServer,
}

impl TestCatalogServer {
    /// Start a server on a random local port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the server.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Client configuration pointing at this server with millisecond backoff.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.uri())
            .with_http_timeout(Duration::from_secs(2))
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5))
    }

    /// HTTP client for [`TestCatalogServer::client_config`].
    pub fn client(&self) -> HttpCatalogClient {
        HttpCatalogClient::new(&self.client_config()).expect("build HTTP client")
    }

    /// Underlying mock server, for custom mounts and request inspection.
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Serve OAuth tokens in order; the last one repeats. `""` issues no token.
    pub async fn mount_oauth_tokens(&self, tokens: &[&str]) {
        let tokens: Vec<String> = tokens.iter().map(|t| (*t).to_string()).collect();
        let calls = Arc::new(AtomicUsize::new(0));

        Mock::given(method("POST"))
            .and(path(OAUTH_TOKEN_PATH))
            .respond_with(move |_: &Request| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                let token = tokens
                    .get(n)
                    .or_else(|| tokens.last())
                    .cloned()
                    .unwrap_or_default();
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "accessToken": token,
                    "expiresIn": 600,
                    "tokenType": "Bearer"
                }))
            })
            .mount(&self.server)
            .await;
    }

    /// Serve an impersonation token for `user`.
    pub async fn mount_impersonation(&self, user: &str, token: &str) {
        Mock::given(method("POST"))
            .and(path(IMPERSONATE_USER_PATH))
            .and(body_json(serde_json::json!({ "user": user })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "accessToken": token })),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve an escalation token.
    pub async fn mount_escalation(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path(ESCALATE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "accessToken": token })),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer the liveness probe with one definition when called with `auth_header`.
    pub async fn mount_typedefs(&self, auth_header: &str) {
        Mock::given(method("GET"))
            .and(path(TYPEDEFS_PATH))
            .and(header("authorization", auth_header))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "structDefs": [{"name": "Link", "category": "STRUCT"}]
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer `method_name path_str` with a bare status code.
    pub async fn mount_status(&self, method_name: &str, path_str: &str, status: u16) {
        Mock::given(method(method_name))
            .and(path(path_str))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for `path_str`.
    pub async fn request_count(&self, path_str: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == path_str)
            .count()
    }
}

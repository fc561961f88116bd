//! Scripted `CatalogApi` for exercising token managers without HTTP.

use async_trait::async_trait;
use catalog_auth::client::{CatalogApi, TypeDefCategory, TypeDefListing};
use catalog_auth::secret::{ExposeSecret, SecretString};
use catalog_auth::TokenError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A listing with one struct definition, which the liveness probe accepts.
pub fn active_listing() -> TypeDefListing {
    TypeDefListing {
        struct_defs: vec![serde_json::json!({"name": "Link", "category": "STRUCT"})],
        ..TypeDefListing::default()
    }
}

/// A listing with no definitions, which the liveness probe rejects.
pub fn empty_listing() -> TypeDefListing {
    TypeDefListing::default()
}

/// Mock catalog replaying scripted responses per operation.
///
/// Once a script runs out, each operation falls back to its failure value
/// (empty OAuth token, no impersonation/escalation token) and the probe falls
/// back to [`active_listing`].
pub struct MockCatalog {
    oauth: Mutex<VecDeque<Result<String, TokenError>>>,
    impersonation: Mutex<VecDeque<Result<Option<String>, TokenError>>>,
    escalation: Mutex<VecDeque<Result<Option<String>, TokenError>>>,
    probes: Mutex<VecDeque<Result<TypeDefListing, TokenError>>>,
    oauth_calls: AtomicUsize,
    impersonation_calls: AtomicUsize,
    escalation_calls: AtomicUsize,
    probe_calls: AtomicUsize,
    oauth_client_ids: Mutex<Vec<String>>,
    impersonated_users: Mutex<Vec<String>>,
    probe_headers: Mutex<Vec<String>>,
    max_network_retries: u32,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create a mock with empty scripts and a network retry ceiling of 3.
    pub fn new() -> Self {
        Self {
            oauth: Mutex::default(),
            impersonation: Mutex::default(),
            escalation: Mutex::default(),
            probes: Mutex::default(),
            oauth_calls: AtomicUsize::new(0),
            impersonation_calls: AtomicUsize::new(0),
            escalation_calls: AtomicUsize::new(0),
            probe_calls: AtomicUsize::new(0),
            oauth_client_ids: Mutex::default(),
            impersonated_users: Mutex::default(),
            probe_headers: Mutex::default(),
            max_network_retries: 3,
        }
    }

    /// Script OAuth exchange tokens, in order. `""` means no token issued.
    pub fn with_oauth_tokens<const N: usize>(self, tokens: [&str; N]) -> Self {
        self.with_oauth_results(tokens.iter().map(|t| Ok((*t).to_string())).collect())
    }

    /// Script OAuth exchange results, in order.
    pub fn with_oauth_results(self, results: Vec<Result<String, TokenError>>) -> Self {
        self.oauth.lock().unwrap().extend(results);
        self
    }

    /// Script impersonation results, in order.
    pub fn with_impersonation(self, results: Vec<Result<Option<String>, TokenError>>) -> Self {
        self.impersonation.lock().unwrap().extend(results);
        self
    }

    /// Script escalation results, in order.
    pub fn with_escalation(self, results: Vec<Result<Option<String>, TokenError>>) -> Self {
        self.escalation.lock().unwrap().extend(results);
        self
    }

    /// Script liveness probe results, in order.
    pub fn with_probes(self, results: Vec<Result<TypeDefListing, TokenError>>) -> Self {
        self.probes.lock().unwrap().extend(results);
        self
    }

    /// Set the network retry ceiling reported to the manager.
    pub fn with_max_network_retries(mut self, retries: u32) -> Self {
        self.max_network_retries = retries;
        self
    }

    /// Number of OAuth exchanges performed.
    pub fn oauth_calls(&self) -> usize {
        self.oauth_calls.load(Ordering::SeqCst)
    }

    /// Number of impersonation calls performed.
    pub fn impersonation_calls(&self) -> usize {
        self.impersonation_calls.load(Ordering::SeqCst)
    }

    /// Number of escalation calls performed.
    pub fn escalation_calls(&self) -> usize {
        self.escalation_calls.load(Ordering::SeqCst)
    }

    /// Number of liveness probes performed.
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Total number of token-minting calls across all operations.
    pub fn acquisition_calls(&self) -> usize {
        self.oauth_calls() + self.impersonation_calls() + self.escalation_calls()
    }

    /// Client IDs passed to the OAuth exchange.
    pub fn oauth_client_ids(&self) -> Vec<String> {
        self.oauth_client_ids.lock().unwrap().clone()
    }

    /// Users passed to impersonation.
    pub fn impersonated_users(&self) -> Vec<String> {
        self.impersonated_users.lock().unwrap().clone()
    }

    /// Authorization headers the probe was called with.
    pub fn probe_headers(&self) -> Vec<String> {
        self.probe_headers.lock().unwrap().clone()
    }
}

fn secret(token: Option<String>) -> Option<SecretString> {
    token.map(SecretString::from)
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn oauth_exchange(
        &self,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<SecretString, TokenError> {
        self.oauth_calls.fetch_add(1, Ordering::SeqCst);
        self.oauth_client_ids
            .lock()
            .unwrap()
            .push(client_id.to_string());
        assert!(
            !client_secret.expose_secret().is_empty(),
            "OAuth exchange called without a client secret"
        );

        let next = self
            .oauth
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()));
        next.map(SecretString::from)
    }

    async fn impersonate_as_user(
        &self,
        user_id: &str,
    ) -> Result<Option<SecretString>, TokenError> {
        self.impersonation_calls.fetch_add(1, Ordering::SeqCst);
        self.impersonated_users
            .lock()
            .unwrap()
            .push(user_id.to_string());

        let next = self
            .impersonation
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None));
        next.map(secret)
    }

    async fn escalate(&self) -> Result<Option<SecretString>, TokenError> {
        self.escalation_calls.fetch_add(1, Ordering::SeqCst);

        let next = self
            .escalation
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None));
        next.map(secret)
    }

    async fn list_type_defs(
        &self,
        _category: TypeDefCategory,
        auth_header: &str,
    ) -> Result<TypeDefListing, TokenError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probe_headers
            .lock()
            .unwrap()
            .push(auth_header.to_string());

        self.probes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(active_listing()))
    }

    fn max_network_retries(&self) -> u32 {
        self.max_network_retries
    }
}

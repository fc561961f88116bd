//! Credential refresh coordinator.
//!
//! A [`TokenManager`] owns one credential slot and hands out `Authorization`
//! header values for it. How a new credential is obtained is delegated to a
//! [`TokenSource`]; everything else (locking, bounded retry with backoff, and
//! the post-refresh liveness probe) lives here once for all sources.
//!
//! # Locking
//!
//! The slot sits behind a fair `tokio::sync::RwLock`. Header reads and
//! [`TokenManager::validate`] take it shared. [`TokenManager::refresh`] takes
//! it exclusively for the whole retry sequence, backoff sleeps and liveness
//! probe included, so no reader ever observes a half-finished refresh.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_auth::client::HttpCatalogClient;
//! use catalog_auth::config::ClientConfig;
//! use catalog_auth::secret::SecretString;
//! use catalog_auth::TokenManager;
//!
//! let config = ClientConfig::new_secure("https://tenant.example.com".to_string())?;
//! let client = HttpCatalogClient::new(&config)?;
//! let manager = TokenManager::oauth_client("my-client".to_string(), SecretString::from("secret"));
//!
//! // Refreshes on first use, then serves the held credential.
//! let header = manager.header(&client).await?;
//! ```
//!
//! # Cancellation
//!
//! Nothing inside the manager times out a refresh. A hung acquisition call
//! blocks every reader until the HTTP client's own timeout fires; callers
//! that need a tighter bound can wrap calls in `tokio::time::timeout`.
//! Dropping the future releases the lock and zeroes the retry counter; the
//! held credential is left as it was.

use crate::backoff::{Backoff, ExponentialBackoff};
use crate::client::{CatalogApi, TypeDefCategory};
use crate::credential::{AuthScheme, Credential};
use crate::error::TokenError;
use crate::observability::metrics;
use crate::secret::SecretString;
use crate::sources::{
    ApiTokenSource, BasicAuthSource, EscalationSource, ImpersonationSource, OAuthClientSource,
};
use async_trait::async_trait;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

/// Acquisition attempts per refresh cycle.
pub const MAX_REFRESH_ATTEMPTS: u32 = 5;

/// Category listed by the liveness probe.
const PROBE_CATEGORY: TypeDefCategory = TypeDefCategory::Struct;

// =============================================================================
// Token Source
// =============================================================================

/// One way of obtaining a credential.
#[async_trait]
pub trait TokenSource: Send + Sync + fmt::Debug {
    /// Bounded label for logs and metrics.
    fn name(&self) -> &'static str;

    /// Scheme used when formatting the header.
    fn scheme(&self) -> AuthScheme {
        AuthScheme::Bearer
    }

    /// Format a held credential as an `Authorization` header value.
    fn format_header(&self, credential: &Credential) -> String {
        credential.header_value(self.scheme())
    }

    /// Make exactly one attempt to obtain a new credential.
    ///
    /// `Ok(None)` is a transient failure the manager will retry.
    ///
    /// # Errors
    ///
    /// - `TokenError::Unsupported` if this source cannot refresh at all
    /// - Remote errors from the catalog call, which stop the retry loop
    async fn refresh_token(&self, client: &dyn CatalogApi)
        -> Result<Option<Credential>, TokenError>;
}

// =============================================================================
// Token Manager
// =============================================================================

/// Observable lifecycle state of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Nothing held; the next header request will refresh.
    NoCredential,
    /// A refresh (or invalidation) holds the lock.
    Refreshing,
    /// A credential is held.
    Active,
}

#[derive(Default)]
struct TokenState {
    credential: Option<Credential>,
    retry_count: u32,
}

/// Retry counter scope for one refresh cycle.
///
/// Zeroes the counter on entry and again on drop, so a cycle cut short by
/// cancellation leaves no partial count behind.
struct RetryCycle<'a> {
    state: &'a mut TokenState,
}

impl<'a> RetryCycle<'a> {
    fn start(state: &'a mut TokenState) -> Self {
        state.retry_count = 0;
        Self { state }
    }
}

impl Deref for RetryCycle<'_> {
    type Target = TokenState;

    fn deref(&self) -> &TokenState {
        self.state
    }
}

impl DerefMut for RetryCycle<'_> {
    fn deref_mut(&mut self) -> &mut TokenState {
        self.state
    }
}

impl Drop for RetryCycle<'_> {
    fn drop(&mut self) {
        self.state.retry_count = 0;
    }
}

/// Coordinates credential refresh for one [`TokenSource`].
pub struct TokenManager {
    source: Box<dyn TokenSource>,
    state: RwLock<TokenState>,
    backoff: Arc<dyn Backoff>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("source", &self.source)
            .field("state", &self.state())
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl TokenManager {
    /// Create a manager with no credential held.
    #[must_use]
    pub fn new(source: impl TokenSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            state: RwLock::new(TokenState::default()),
            backoff: Arc::new(ExponentialBackoff::default()),
        }
    }

    /// Create a manager that starts out holding `credential`.
    #[must_use]
    pub fn with_credential(source: impl TokenSource + 'static, credential: Credential) -> Self {
        Self {
            state: RwLock::new(TokenState {
                credential: Some(credential),
                retry_count: 0,
            }),
            ..Self::new(source)
        }
    }

    /// Replace the backoff policy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Pre-issued API key. Cannot refresh.
    ///
    /// The key is installed as given, empty or not. Call
    /// [`TokenManager::validate`] before first use to reject a blank or
    /// malformed key.
    #[must_use]
    pub fn api_token(api_key: SecretString) -> Self {
        Self::with_credential(ApiTokenSource, Credential::from(api_key))
    }

    /// Local basic authentication. Cannot refresh.
    #[must_use]
    pub fn basic_auth(username: &str, password: &SecretString) -> Self {
        Self::with_credential(BasicAuthSource, Credential::basic(username, password))
    }

    /// OAuth client-credentials grant.
    #[must_use]
    pub fn oauth_client(client_id: String, client_secret: SecretString) -> Self {
        Self::new(OAuthClientSource::new(client_id, client_secret))
    }

    /// Impersonate `user_id`.
    #[must_use]
    pub fn impersonation(user_id: String) -> Self {
        Self::new(ImpersonationSource::new(user_id))
    }

    /// Tokenless escalation.
    #[must_use]
    pub fn escalation() -> Self {
        Self::new(EscalationSource)
    }

    /// Label of the underlying source.
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Current lifecycle state, without waiting for the lock.
    #[must_use]
    pub fn state(&self) -> ManagerState {
        match self.state.try_read() {
            Ok(state) if state.credential.is_some() => ManagerState::Active,
            Ok(_) => ManagerState::NoCredential,
            Err(_) => ManagerState::Refreshing,
        }
    }

    /// Current retry counter. Zero outside a refresh cycle.
    pub async fn retry_count(&self) -> u32 {
        self.state.read().await.retry_count
    }

    /// Value for the `Authorization` header, refreshing first if nothing is held.
    ///
    /// Callers that queue up behind an in-flight refresh reuse its result.
    ///
    /// # Errors
    ///
    /// - Any error [`TokenManager::refresh`] can return
    /// - `TokenError::RefreshExhausted` if every refresh attempt failed
    #[instrument(skip_all, fields(source = self.source.name()))]
    pub async fn header(&self, client: &dyn CatalogApi) -> Result<String, TokenError> {
        {
            let state = self.state.read().await;
            if let Some(credential) = &state.credential {
                return Ok(self.source.format_header(credential));
            }
        }

        let mut state = self.state.write().await;
        if state.credential.is_none() && !self.refresh_locked(&mut state, client).await? {
            return Err(TokenError::RefreshExhausted {
                attempts: MAX_REFRESH_ATTEMPTS,
            });
        }

        let state = RwLockWriteGuard::downgrade(state);
        state
            .credential
            .as_ref()
            .map(|credential| self.source.format_header(credential))
            .ok_or(TokenError::MissingCredential)
    }

    /// Formatted header for the held credential, if any. Never refreshes.
    pub async fn auth_header(&self) -> Option<String> {
        let state = self.state.read().await;
        state
            .credential
            .as_ref()
            .map(|credential| self.source.format_header(credential))
    }

    /// Obtain a new credential, retrying up to [`MAX_REFRESH_ATTEMPTS`] times.
    ///
    /// Holds the write lock for the entire cycle. Returns `Ok(false)` when
    /// every attempt failed; the held credential is then left unchanged.
    ///
    /// # Errors
    ///
    /// - `TokenError::Unsupported` for sources that cannot refresh
    /// - Remote errors from an acquisition or probe call, unmodified
    #[instrument(skip_all, fields(source = self.source.name()))]
    pub async fn refresh(&self, client: &dyn CatalogApi) -> Result<bool, TokenError> {
        let mut state = self.state.write().await;
        self.refresh_locked(&mut state, client).await
    }

    /// Check the held credential is present, non-empty, and whitespace-free.
    ///
    /// # Errors
    ///
    /// `MissingCredential`, `EmptyCredential`, or `MalformedCredential`.
    pub async fn validate(&self) -> Result<(), TokenError> {
        let state = self.state.read().await;
        state
            .credential
            .as_ref()
            .ok_or(TokenError::MissingCredential)?
            .check()
    }

    /// Drop the held credential so the next header request refreshes.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        if state.credential.take().is_some() {
            debug!(
                target: "catalog_auth.token_manager",
                source = self.source.name(),
                "Credential invalidated"
            );
        }
    }

    async fn refresh_locked(
        &self,
        state: &mut TokenState,
        client: &dyn CatalogApi,
    ) -> Result<bool, TokenError> {
        let started = Instant::now();
        let initial_acquisition = state.credential.is_none();

        let result = {
            let mut cycle = RetryCycle::start(state);
            self.acquire_with_retry(&mut cycle, client).await
        };

        let outcome = match &result {
            Ok(true) => "success",
            Ok(false) => "exhausted",
            Err(TokenError::Unsupported(_)) => "unsupported",
            Err(_) => "error",
        };
        metrics::record_refresh(self.source.name(), outcome, started.elapsed());

        if !matches!(result, Ok(true)) {
            return result;
        }

        if initial_acquisition {
            info!(
                target: "catalog_auth.token_manager",
                source = self.source.name(),
                "Initial credential acquired"
            );
        } else {
            debug!(
                target: "catalog_auth.token_manager",
                source = self.source.name(),
                "Credential refreshed"
            );
        }

        if let Some(credential) = &state.credential {
            let header = self.source.format_header(credential);
            self.validate_active(client, &header).await?;
        }

        Ok(true)
    }

    async fn acquire_with_retry(
        &self,
        state: &mut TokenState,
        client: &dyn CatalogApi,
    ) -> Result<bool, TokenError> {
        loop {
            if let Some(credential) = self.source.refresh_token(client).await? {
                state.credential = Some(credential);
                return Ok(true);
            }

            state.retry_count += 1;
            metrics::record_failed_attempt(self.source.name());

            if state.retry_count >= MAX_REFRESH_ATTEMPTS {
                warn!(
                    target: "catalog_auth.token_manager",
                    source = self.source.name(),
                    attempts = state.retry_count,
                    "Credential refresh failed on every attempt"
                );
                return Ok(false);
            }

            let delay = self.backoff.delay(state.retry_count);
            warn!(
                target: "catalog_auth.token_manager",
                source = self.source.name(),
                attempt = state.retry_count,
                backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Credential acquisition failed, will retry"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Confirm a fresh credential is usable end to end.
    ///
    /// Retries only the probe, up to the client's network retry ceiling.
    /// Running out of attempts is logged and swallowed: the backend may still
    /// be propagating the token and the caller gets it regardless.
    async fn validate_active(
        &self,
        client: &dyn CatalogApi,
        header: &str,
    ) -> Result<(), TokenError> {
        let ceiling = client.max_network_retries().max(1);
        let mut attempt = 1;

        loop {
            let active = match client.list_type_defs(PROBE_CATEGORY, header).await {
                Ok(listing) => !listing.is_empty(),
                Err(TokenError::AuthenticationRejected(reason)) => {
                    debug!(
                        target: "catalog_auth.token_manager",
                        attempt,
                        reason = %reason,
                        "Liveness probe rejected, credential not yet active"
                    );
                    false
                }
                Err(e) => return Err(e),
            };

            if active {
                metrics::record_liveness_probe("active");
                return Ok(());
            }

            if attempt >= ceiling {
                warn!(
                    target: "catalog_auth.token_manager",
                    source = self.source.name(),
                    attempts = attempt,
                    "Refreshed credential is not active yet, continuing without confirmation"
                );
                metrics::record_liveness_probe("inactive");
                return Ok(());
            }

            tokio::time::sleep(self.backoff.delay(attempt)).await;
            attempt += 1;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::client::TypeDefListing;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Source replaying a fixed list of outcomes, then failing transiently.
    #[derive(Debug)]
    struct ScriptedSource {
        outcomes: Mutex<VecDeque<Result<Option<&'static str>, TokenError>>>,
        calls: Arc<AtomicU32>,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<Option<&'static str>, TokenError>>) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let source = Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Arc::clone(&calls),
            };
            (source, calls)
        }
    }

    #[async_trait]
    impl TokenSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn refresh_token(
            &self,
            _client: &dyn CatalogApi,
        ) -> Result<Option<Credential>, TokenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(None));
            next.map(|token| token.map(Credential::new))
        }
    }

    /// Catalog whose probe answers from a script, defaulting to active.
    struct ProbeCatalog {
        probes: Mutex<VecDeque<Result<TypeDefListing, TokenError>>>,
        probe_calls: AtomicU32,
        max_retries: u32,
    }

    impl ProbeCatalog {
        fn active() -> Self {
            Self::scripted(vec![], 3)
        }

        fn scripted(probes: Vec<Result<TypeDefListing, TokenError>>, max_retries: u32) -> Self {
            Self {
                probes: Mutex::new(probes.into()),
                probe_calls: AtomicU32::new(0),
                max_retries,
            }
        }
    }

    fn non_empty_listing() -> TypeDefListing {
        TypeDefListing {
            struct_defs: vec![serde_json::json!({"name": "Link"})],
            ..TypeDefListing::default()
        }
    }

    #[async_trait]
    impl CatalogApi for ProbeCatalog {
        async fn oauth_exchange(
            &self,
            _client_id: &str,
            _client_secret: &SecretString,
        ) -> Result<SecretString, TokenError> {
            Ok(SecretString::from(""))
        }

        async fn impersonate_as_user(
            &self,
            _user_id: &str,
        ) -> Result<Option<SecretString>, TokenError> {
            Ok(None)
        }

        async fn escalate(&self) -> Result<Option<SecretString>, TokenError> {
            Ok(None)
        }

        async fn list_type_defs(
            &self,
            _category: TypeDefCategory,
            _auth_header: &str,
        ) -> Result<TypeDefListing, TokenError> {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            self.probes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(non_empty_listing()))
        }

        fn max_network_retries(&self) -> u32 {
            self.max_retries
        }
    }

    #[derive(Debug, Default)]
    struct CountingBackoff(AtomicU32);

    impl Backoff for CountingBackoff {
        fn delay(&self, _attempt: u32) -> Duration {
            self.0.fetch_add(1, Ordering::SeqCst);
            Duration::ZERO
        }
    }

    fn manager_with(source: ScriptedSource) -> (TokenManager, Arc<CountingBackoff>) {
        let backoff = Arc::new(CountingBackoff::default());
        let manager = TokenManager::new(source).with_backoff(backoff.clone());
        (manager, backoff)
    }

    #[tokio::test]
    async fn test_initial_state_without_credential() {
        let (source, _) = ScriptedSource::new(vec![]);
        let (manager, _) = manager_with(source);

        assert_eq!(manager.state(), ManagerState::NoCredential);
        assert!(manager.auth_header().await.is_none());
    }

    #[tokio::test]
    async fn test_with_credential_starts_active() {
        let (source, calls) = ScriptedSource::new(vec![]);
        let manager = TokenManager::with_credential(source, Credential::new("seeded"));

        assert_eq!(manager.state(), ManagerState::Active);
        let header = manager.header(&ProbeCatalog::active()).await.unwrap();
        assert_eq!(header, "Bearer seeded");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_success_first_attempt() {
        let (source, calls) = ScriptedSource::new(vec![Ok(Some("tok-1"))]);
        let (manager, backoff) = manager_with(source);

        assert!(manager.refresh(&ProbeCatalog::active()).await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(backoff.0.load(Ordering::SeqCst), 0);
        assert_eq!(manager.retry_count().await, 0);
        assert_eq!(manager.state(), ManagerState::Active);
    }

    #[tokio::test]
    async fn test_refresh_exhausted_keeps_previous_credential() {
        let (source, calls) = ScriptedSource::new(vec![]);
        let backoff = Arc::new(CountingBackoff::default());
        let manager = TokenManager::with_credential(source, Credential::new("old"))
            .with_backoff(backoff.clone());

        assert!(!manager.refresh(&ProbeCatalog::active()).await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_REFRESH_ATTEMPTS);
        assert_eq!(backoff.0.load(Ordering::SeqCst), MAX_REFRESH_ATTEMPTS - 1);
        assert_eq!(manager.retry_count().await, 0);
        assert_eq!(manager.auth_header().await.as_deref(), Some("Bearer old"));
    }

    #[tokio::test]
    async fn test_remote_error_interrupts_retry() {
        let (source, calls) = ScriptedSource::new(vec![
            Ok(None),
            Err(TokenError::HttpError("connection reset".to_string())),
            Ok(Some("never-reached")),
        ]);
        let (manager, _) = manager_with(source);

        let result = manager.refresh(&ProbeCatalog::active()).await;

        assert_eq!(
            result,
            Err(TokenError::HttpError("connection reset".to_string()))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.retry_count().await, 0);
        assert_eq!(manager.state(), ManagerState::NoCredential);
    }

    #[tokio::test]
    async fn test_header_refreshes_when_empty() {
        let (source, _) = ScriptedSource::new(vec![Ok(Some("fresh"))]);
        let (manager, _) = manager_with(source);

        let header = manager.header(&ProbeCatalog::active()).await.unwrap();
        assert_eq!(header, "Bearer fresh");
    }

    #[tokio::test]
    async fn test_header_reports_exhaustion() {
        let (source, _) = ScriptedSource::new(vec![]);
        let (manager, _) = manager_with(source);

        let result = manager.header(&ProbeCatalog::active()).await;
        assert_eq!(
            result,
            Err(TokenError::RefreshExhausted {
                attempts: MAX_REFRESH_ATTEMPTS
            })
        );
    }

    #[tokio::test]
    async fn test_probe_exhaustion_is_swallowed() {
        let (source, _) = ScriptedSource::new(vec![Ok(Some("tok"))]);
        let (manager, backoff) = manager_with(source);
        let catalog = ProbeCatalog::scripted(
            vec![
                Ok(TypeDefListing::default()),
                Err(TokenError::AuthenticationRejected("Status 401".to_string())),
                Ok(TypeDefListing::default()),
            ],
            3,
        );

        assert!(manager.refresh(&catalog).await.unwrap());
        assert_eq!(catalog.probe_calls.load(Ordering::SeqCst), 3);
        assert_eq!(backoff.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_probe_transport_error_propagates() {
        let (source, _) = ScriptedSource::new(vec![Ok(Some("tok"))]);
        let (manager, _) = manager_with(source);
        let catalog =
            ProbeCatalog::scripted(vec![Err(TokenError::HttpError("down".to_string()))], 3);

        let result = manager.refresh(&catalog).await;
        assert!(matches!(result, Err(TokenError::HttpError(_))));
    }

    #[tokio::test]
    async fn test_zero_network_retries_still_probes_once() {
        let (source, _) = ScriptedSource::new(vec![Ok(Some("tok"))]);
        let (manager, backoff) = manager_with(source);
        let catalog = ProbeCatalog::scripted(vec![Ok(TypeDefListing::default())], 0);

        assert!(manager.refresh(&catalog).await.unwrap());
        assert_eq!(catalog.probe_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backoff.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validate_kinds() {
        let (source, _) = ScriptedSource::new(vec![]);
        let manager = TokenManager::new(source);
        assert_eq!(manager.validate().await, Err(TokenError::MissingCredential));

        let (source, _) = ScriptedSource::new(vec![]);
        let manager = TokenManager::with_credential(source, Credential::new(""));
        assert_eq!(manager.validate().await, Err(TokenError::EmptyCredential));

        let (source, _) = ScriptedSource::new(vec![]);
        let manager = TokenManager::with_credential(source, Credential::new("a b"));
        assert_eq!(manager.validate().await, Err(TokenError::MalformedCredential));

        let (source, _) = ScriptedSource::new(vec![]);
        let manager = TokenManager::with_credential(source, Credential::new("ok"));
        assert!(manager.validate().await.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let (source, calls) = ScriptedSource::new(vec![Ok(Some("second"))]);
        let manager = TokenManager::with_credential(source, Credential::new("first"))
            .with_backoff(Arc::new(CountingBackoff::default()));

        manager.invalidate().await;
        assert_eq!(manager.state(), ManagerState::NoCredential);

        let header = manager.header(&ProbeCatalog::active()).await.unwrap();
        assert_eq!(header, "Bearer second");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_backoff_waits_between_attempts() {
        let (source, _) = ScriptedSource::new(vec![Ok(None), Ok(None), Ok(Some("late"))]);
        let manager = TokenManager::new(source);

        let started = tokio::time::Instant::now();
        assert!(manager.refresh(&ProbeCatalog::active()).await.unwrap());

        // 1s + 2s of virtual time
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_blank_api_key_is_held_until_validated() {
        let manager = TokenManager::api_token(SecretString::from(""));

        assert_eq!(manager.state(), ManagerState::Active);
        assert_eq!(manager.auth_header().await.as_deref(), Some("Bearer "));
        assert_eq!(manager.validate().await, Err(TokenError::EmptyCredential));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_refresh_resets_retry_count() {
        let (source, calls) = ScriptedSource::new(vec![]);
        let manager = TokenManager::new(source)
            .with_backoff(Arc::new(ExponentialBackoff::new(
                Duration::from_secs(10),
                Duration::from_secs(10),
            )));
        let catalog = ProbeCatalog::active();

        let result =
            tokio::time::timeout(Duration::from_secs(25), manager.refresh(&catalog)).await;

        assert!(result.is_err(), "refresh should still be backing off");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(manager.retry_count().await, 0);
        assert_eq!(manager.state(), ManagerState::NoCredential);
    }

    #[test]
    fn test_debug_redacts_credential() {
        let (source, _) = ScriptedSource::new(vec![]);
        let manager = TokenManager::with_credential(source, Credential::new("hidden-token"));

        let debug_str = format!("{manager:?}");
        assert!(!debug_str.contains("hidden-token"));
        assert!(debug_str.contains("Active"));
    }
}

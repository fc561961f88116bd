//! Token source that blocks mid-refresh until a test releases it.

use async_trait::async_trait;
use catalog_auth::client::CatalogApi;
use catalog_auth::credential::Credential;
use catalog_auth::{TokenError, TokenSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

/// A `TokenSource` whose acquisition waits on a [`Gate`].
///
/// The n-th acquisition returns `gated-token-<n>` (1-based) once released.
#[derive(Debug)]
pub struct GatedSource {
    started: Arc<Notify>,
    gate: watch::Receiver<bool>,
    calls: Arc<AtomicUsize>,
}

/// Test-side handle controlling a [`GatedSource`].
#[derive(Debug)]
pub struct Gate {
    started: Arc<Notify>,
    release: watch::Sender<bool>,
    calls: Arc<AtomicUsize>,
}

impl GatedSource {
    /// Create a closed gate and its source.
    pub fn new() -> (Self, Gate) {
        let started = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (release, gate) = watch::channel(false);

        let source = Self {
            started: Arc::clone(&started),
            gate,
            calls: Arc::clone(&calls),
        };
        let handle = Gate {
            started,
            release,
            calls,
        };
        (source, handle)
    }
}

impl Gate {
    /// Wait until an acquisition has started and is blocked on the gate.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Open the gate for current and future acquisitions.
    pub fn release(&self) {
        let _ = self.release.send(true);
    }

    /// Number of acquisitions attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for GatedSource {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn refresh_token(
        &self,
        _client: &dyn CatalogApi,
    ) -> Result<Option<Credential>, TokenError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.started.notify_one();

        let mut gate = self.gate.clone();
        while !*gate.borrow_and_update() {
            gate.changed()
                .await
                .map_err(|_| TokenError::HttpError("gate dropped".to_string()))?;
        }

        Ok(Some(Credential::new(format!("gated-token-{call}"))))
    }
}

//! Locking tests: readers never observe a refresh in progress.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use catalog_auth::credential::Credential;
use catalog_auth::{ManagerState, TokenManager};
use catalog_test_utils::{GatedSource, MockCatalog, RecordingBackoff};
use std::sync::Arc;
use std::time::Duration;

const READERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_wait_for_explicit_refresh() {
    let (source, gate) = GatedSource::new();
    let manager = Arc::new(
        TokenManager::with_credential(source, Credential::new("stale-token"))
            .with_backoff(RecordingBackoff::new()),
    );
    let catalog = Arc::new(MockCatalog::new());

    let refresh = {
        let manager = Arc::clone(&manager);
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move { manager.refresh(catalog.as_ref()).await })
    };

    gate.wait_started().await;
    assert_eq!(manager.state(), ManagerState::Refreshing);

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { manager.header(catalog.as_ref()).await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(
        readers.iter().all(|reader| !reader.is_finished()),
        "no reader may return while the refresh holds the lock"
    );

    gate.release();

    assert!(refresh.await.unwrap().unwrap());
    for reader in readers {
        assert_eq!(reader.await.unwrap().unwrap(), "Bearer gated-token-1");
    }
    assert_eq!(gate.calls(), 1);
    assert_eq!(manager.state(), ManagerState::Active);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_refreshes_once() {
    let (source, gate) = GatedSource::new();
    let manager = Arc::new(TokenManager::new(source).with_backoff(RecordingBackoff::new()));
    let catalog = Arc::new(MockCatalog::new());

    let callers: Vec<_> = (0..READERS)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { manager.header(catalog.as_ref()).await })
        })
        .collect();

    gate.wait_started().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(callers.iter().all(|caller| !caller.is_finished()));

    gate.release();

    for caller in callers {
        assert_eq!(caller.await.unwrap().unwrap(), "Bearer gated-token-1");
    }
    assert_eq!(gate.calls(), 1);
    assert_eq!(catalog.probe_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_serialize() {
    let (source, gate) = GatedSource::new();
    let manager = Arc::new(TokenManager::new(source).with_backoff(RecordingBackoff::new()));
    let catalog = Arc::new(MockCatalog::new());

    let first = {
        let manager = Arc::clone(&manager);
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move { manager.refresh(catalog.as_ref()).await })
    };
    gate.wait_started().await;

    let second = {
        let manager = Arc::clone(&manager);
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move { manager.refresh(catalog.as_ref()).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    // The second refresh is queued on the lock, not inside the source.
    assert_eq!(gate.calls(), 1);

    gate.release();

    assert!(first.await.unwrap().unwrap());
    assert!(second.await.unwrap().unwrap());
    assert_eq!(gate.calls(), 2);
    assert_eq!(
        manager.auth_header().await.as_deref(),
        Some("Bearer gated-token-2")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_proceed_concurrently_when_active() {
    let manager = Arc::new(TokenManager::api_token("abc123".into()));
    let catalog = Arc::new(MockCatalog::new());

    let readers: Vec<_> = (0..64)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { manager.header(catalog.as_ref()).await })
        })
        .collect();

    for reader in readers {
        assert_eq!(reader.await.unwrap().unwrap(), "Bearer abc123");
    }
    assert_eq!(catalog.acquisition_calls(), 0);
}

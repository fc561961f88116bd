//! # Catalog Auth Test Utilities
//!
//! Shared test utilities for `catalog-auth`.
//!
//! This crate provides:
//! - Scripted catalog operations (`MockCatalog`)
//! - A zero-delay backoff that records attempt numbers (`RecordingBackoff`)
//! - A token source that blocks until released (`GatedSource`)
//! - A wiremock-backed catalog server (`TestCatalogServer`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let catalog = MockCatalog::new().with_oauth_tokens(["", "tok-xyz"]);
//!     let backoff = RecordingBackoff::new();
//!     let manager = TokenManager::oauth_client("client".into(), "secret".into())
//!         .with_backoff(backoff.clone());
//!
//!     assert!(manager.refresh(&catalog).await?);
//!     assert_eq!(backoff.calls(), 1);
//! }
//! ```

pub mod backoff;
pub mod gated_source;
pub mod mock_catalog;
pub mod server_harness;

// Re-export commonly used items
pub use backoff::*;
pub use gated_source::*;
pub use mock_catalog::*;
pub use server_harness::*;

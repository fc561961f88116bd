//! Secret types for keeping credentials out of logs.
//!
//! Re-exports [`secrecy`] so callers building an [`AuthConfig`] or
//! implementing a [`CatalogApi`] do not need a direct dependency on it.
//! `SecretString` redacts itself in `Debug` and is zeroized on drop, so any
//! struct deriving `Debug` over one is safe to log.
//!
//! ```rust
//! use catalog_auth::secret::{ExposeSecret, SecretString};
//!
//! let api_key = SecretString::from("abc123");
//! assert!(!format!("{api_key:?}").contains("abc123"));
//! assert_eq!(api_key.expose_secret(), "abc123");
//! ```
//!
//! Use `SecretString` for API keys, OAuth client secrets, basic-auth
//! passwords, and every token returned by the catalog.
//!
//! [`AuthConfig`]: crate::config::AuthConfig
//! [`CatalogApi`]: crate::client::CatalogApi

pub use secrecy::{ExposeSecret, SecretString};

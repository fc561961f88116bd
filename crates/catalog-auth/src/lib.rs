//! Credential lifecycle management for the metadata-catalog client SDK.
//!
//! Every outbound catalog request needs an `Authorization` header. The
//! [`token_manager::TokenManager`] hands those out, refreshing the held
//! credential through one of the strategies in [`sources`] when needed.

#![warn(clippy::pedantic)]

/// Module for token manager error types
pub mod error;

/// Module for client and authentication configuration
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for the credential value held by a token manager
pub mod credential;

/// Module for retry backoff policies
pub mod backoff;

/// Module for the remote catalog operations the manager depends on
pub mod client;

/// Module for the refresh coordinator
pub mod token_manager;

/// Module for the concrete credential acquisition strategies
pub mod sources;

/// Module for logging initialization and metrics
pub mod observability;

pub use error::{Result, TokenError};
pub use token_manager::{ManagerState, TokenManager, TokenSource};

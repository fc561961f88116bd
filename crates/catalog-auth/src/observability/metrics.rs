//! Metrics definitions for credential management
//!
//! All metrics follow Prometheus naming conventions:
//! - `catalog_auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! - `source`: 5 values (`api_token`, `basic`, `oauth_client`, `impersonation`, `escalation`)
//! - `outcome`: 4 values (`success`, `exhausted`, `unsupported`, `error`)
//! - probe `outcome`: 2 values (`active`, `inactive`)

use ::metrics::{counter, histogram};
use std::time::Duration;

/// Record a completed refresh cycle
///
/// Metrics: `catalog_auth_refresh_total`, `catalog_auth_refresh_duration_seconds`
/// Labels: `source`, `outcome`
pub fn record_refresh(source: &'static str, outcome: &'static str, duration: Duration) {
    histogram!("catalog_auth_refresh_duration_seconds", "source" => source, "outcome" => outcome)
        .record(duration.as_secs_f64());

    counter!("catalog_auth_refresh_total", "source" => source, "outcome" => outcome).increment(1);
}

/// Record one transient acquisition failure
///
/// Metric: `catalog_auth_refresh_attempts_failed_total`
/// Labels: `source`
pub fn record_failed_attempt(source: &'static str) {
    counter!("catalog_auth_refresh_attempts_failed_total", "source" => source).increment(1);
}

/// Record the outcome of a liveness probe sequence
///
/// Metric: `catalog_auth_liveness_probe_total`
/// Labels: `outcome`
pub fn record_liveness_probe(outcome: &'static str) {
    counter!("catalog_auth_liveness_probe_total", "outcome" => outcome).increment(1);
}

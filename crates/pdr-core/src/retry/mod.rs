//! Retry and backoff policy for network operations.
//!
//! This module encapsulates the network error taxonomy, its classification
//! into retryable kinds (timeouts, throttling, connection failures) and
//! exponential backoff decisions, so the page fetcher and the probes share a
//! consistent view of what went wrong.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_http_status};
pub use error::NetworkError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;

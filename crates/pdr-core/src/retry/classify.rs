//! Classify HTTP status codes and network errors into retry policy kinds.

use super::error::NetworkError;
use super::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
///
/// Client errors other than 408 and 429 cannot change on retry.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        408 => ErrorKind::Timeout,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a network error into an ErrorKind.
pub fn classify(e: &NetworkError) -> ErrorKind {
    match e {
        NetworkError::Timeout(_) => ErrorKind::Timeout,
        NetworkError::Dns(_) | NetworkError::Connection(_) => ErrorKind::Connection,
        NetworkError::HttpStatus { status, .. } => classify_http_status(*status),
        NetworkError::Transport(_) => ErrorKind::Other,
    }
}

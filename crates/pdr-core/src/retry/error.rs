//! Network error taxonomy shared by the page fetcher and validation probes.

/// A failed HTTP exchange.
///
/// Fatal when fetching a landing page; recorded per asset when probing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// Connect or transfer timeout.
    #[error("timed out: {0}")]
    Timeout(String),
    /// Host (or proxy) name could not be resolved.
    #[error("DNS lookup failed: {0}")]
    Dns(String),
    /// Server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u32 },
    /// Connection refused, reset, or closed without a response.
    #[error("connection failed: {0}")]
    Connection(String),
    /// Anything else libcurl reported (bad URL, TLS, oversized body, ...).
    #[error("transport error: {0}")]
    Transport(String),
}

impl NetworkError {
    /// Short stable identifier used in report notes.
    pub fn reason(&self) -> &'static str {
        match self {
            NetworkError::Timeout(_) => "timeout",
            NetworkError::Dns(_) => "dns",
            NetworkError::HttpStatus { .. } => "http_status",
            NetworkError::Connection(_) => "connection",
            NetworkError::Transport(_) => "transport",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, NetworkError::Timeout(_))
    }
}

impl From<curl::Error> for NetworkError {
    fn from(e: curl::Error) -> Self {
        let msg = e.to_string();
        if e.is_operation_timedout() {
            NetworkError::Timeout(msg)
        } else if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
            NetworkError::Dns(msg)
        } else if e.is_couldnt_connect()
            || e.is_read_error()
            || e.is_recv_error()
            || e.is_send_error()
            || e.is_got_nothing()
        {
            NetworkError::Connection(msg)
        } else {
            NetworkError::Transport(msg)
        }
    }
}

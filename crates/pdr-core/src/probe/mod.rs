//! Lightweight remote probes: HTTP HEAD, with a partial GET fallback.
//!
//! Uses the curl crate (libcurl) to fetch the final response's status and
//! headers after following redirects. When a server rejects HEAD (405/501)
//! or answers it without a `Content-Type`, a `Range: bytes=0-1023` GET is
//! issued instead and aborted once the first KiB has arrived, so the leading
//! bytes can be sniffed. Nothing else of the payload is kept.

mod parse;
#[cfg(test)]
pub(crate) mod fake;

use curl::easy::Easy;
use std::str;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::retry::NetworkError;

/// Bytes kept from a partial GET for content sniffing.
pub const SNIFF_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Head,
    PartialGet,
}

/// Outcome of a probe that received a response (any status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u32,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    /// URL of the final response after redirects.
    pub final_url: Option<String>,
    pub method: ProbeMethod,
    /// Leading bytes of the body (partial GET only).
    pub sniff: Vec<u8>,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Remote probe used by validation and by cache revalidation.
///
/// Blocking; the async callers run it on tokio's blocking pool.
pub trait AssetProbe: Send + Sync {
    fn probe(&self, url: &str) -> Result<ProbeResponse, NetworkError>;
}

/// libcurl-backed probe.
#[derive(Debug, Clone)]
pub struct CurlProbe {
    user_agent: String,
    connect_timeout: Duration,
    timeout: Duration,
}

impl CurlProbe {
    pub fn new(http: &HttpConfig) -> Self {
        Self {
            user_agent: http.user_agent().to_string(),
            connect_timeout: http.connect_timeout(),
            timeout: http.probe_timeout(),
        }
    }

    fn easy(&self, url: &str) -> Result<Easy, NetworkError> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.useragent(&self.user_agent)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        Ok(easy)
    }

    /// Performs a HEAD request.
    pub fn head(&self, url: &str) -> Result<ProbeResponse, NetworkError> {
        let mut lines: Vec<String> = Vec::new();
        let mut easy = self.easy(url)?;
        easy.nobody(true)?;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.perform()?;
        }

        finish(&mut easy, &lines, ProbeMethod::Head, Vec::new())
    }

    /// Performs a ranged GET for the first `SNIFF_BYTES` bytes.
    pub fn partial_get(&self, url: &str) -> Result<ProbeResponse, NetworkError> {
        let mut lines: Vec<String> = Vec::new();
        let mut sniff: Vec<u8> = Vec::with_capacity(SNIFF_BYTES);
        let mut easy = self.easy(url)?;
        easy.get(true)?;
        easy.range(&format!("0-{}", SNIFF_BYTES - 1))?;

        let result = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                let room = SNIFF_BYTES - sniff.len();
                sniff.extend_from_slice(&data[..data.len().min(room)]);
                // Servers that ignore Range would stream the whole file; stop here.
                if sniff.len() >= SNIFF_BYTES {
                    Ok(0)
                } else {
                    Ok(data.len())
                }
            })?;
            transfer.perform()
        };

        if let Err(e) = result {
            if !(e.is_write_error() && sniff.len() >= SNIFF_BYTES) {
                return Err(e.into());
            }
        }

        finish(&mut easy, &lines, ProbeMethod::PartialGet, sniff)
    }
}

impl AssetProbe for CurlProbe {
    fn probe(&self, url: &str) -> Result<ProbeResponse, NetworkError> {
        let head = self.head(url)?;
        let inconclusive =
            matches!(head.status, 405 | 501) || (head.is_success() && head.content_type.is_none());
        if inconclusive {
            tracing::debug!(url, status = head.status, "HEAD inconclusive, probing with partial GET");
            return self.partial_get(url);
        }
        Ok(head)
    }
}

fn finish(
    easy: &mut Easy,
    lines: &[String],
    method: ProbeMethod,
    sniff: Vec<u8>,
) -> Result<ProbeResponse, NetworkError> {
    let status = easy.response_code()?;
    let final_url = easy.effective_url()?.map(String::from);
    let headers = parse::parse_headers(lines);
    Ok(ProbeResponse {
        status,
        content_type: headers.content_type,
        content_length: headers.content_length,
        final_url,
        method,
        sniff,
    })
}

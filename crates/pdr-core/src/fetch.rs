//! Landing-page retrieval over HTTP (libcurl) with bounded retry.

use curl::easy::Easy;

use crate::config::HttpConfig;
use crate::retry::{run_with_retry, NetworkError, RetryPolicy};

/// Source of landing-page HTML. Blocking; the resolver calls it from
/// tokio's blocking pool.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, NetworkError>;
}

/// Fetches pages with libcurl, following redirects, retrying transient
/// failures per the retry policy. Non-2xx final responses are errors.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    http: HttpConfig,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(http: HttpConfig, policy: RetryPolicy) -> Self {
        Self { http, policy }
    }

    fn fetch_once(&self, url: &str) -> Result<String, NetworkError> {
        let max = self.http.max_page_bytes;
        let mut body: Vec<u8> = Vec::new();
        let mut overflow = false;

        let mut easy = Easy::new();
        easy.url(url)?;
        easy.useragent(self.http.user_agent())?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        // Empty string: accept every encoding libcurl supports and decode it.
        easy.accept_encoding("")?;
        easy.connect_timeout(self.http.connect_timeout())?;
        easy.timeout(self.http.timeout())?;

        let result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                if body.len() + data.len() > max {
                    overflow = true;
                    return Ok(0);
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()
        };

        if overflow {
            return Err(NetworkError::Transport(format!(
                "page exceeds {} bytes: {}",
                max, url
            )));
        }
        result?;

        let status = easy.response_code()?;
        if !(200..300).contains(&status) {
            return Err(NetworkError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl PageSource for PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, NetworkError> {
        let html = run_with_retry(&self.policy, || self.fetch_once(url))?;
        tracing::debug!(url, bytes = html.len(), "fetched landing page");
        Ok(html)
    }
}

//! Canned probe responses for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{AssetProbe, ProbeMethod, ProbeResponse};
use crate::retry::NetworkError;

/// Answers from a fixed table; unknown URLs get a 404.
#[derive(Default)]
pub(crate) struct StaticProbe {
    routes: Mutex<HashMap<String, Result<ProbeResponse, NetworkError>>>,
    calls: Mutex<Vec<String>>,
}

impl StaticProbe {
    pub fn with(self, url: &str, response: Result<ProbeResponse, NetworkError>) -> Self {
        self.set(url, response);
        self
    }

    pub fn set(&self, url: &str, response: Result<ProbeResponse, NetworkError>) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub(crate) fn reply(status: u32, content_type: Option<&str>) -> Result<ProbeResponse, NetworkError> {
    Ok(ProbeResponse {
        status,
        content_type: content_type.map(String::from),
        content_length: None,
        final_url: None,
        method: ProbeMethod::Head,
        sniff: Vec::new(),
    })
}

pub(crate) const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

impl AssetProbe for StaticProbe {
    fn probe(&self, url: &str) -> Result<ProbeResponse, NetworkError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.routes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| reply(404, Some("text/html")))
    }
}

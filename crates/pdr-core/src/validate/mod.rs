//! Candidate validation: one lightweight probe per asset.
//!
//! A candidate passes when its final response (after redirects) is 2xx and
//! carries a data-file content type, or no content type and leading bytes
//! that do not open an HTML document. Probes run on tokio's blocking pool,
//! at most `max_concurrent` at a time, and results are written back in the
//! input order.

mod judge;

use std::sync::Arc;

use crate::asset::{RankedAsset, ValidationErrorCode};
use crate::probe::AssetProbe;

/// Result of validating one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub validated: bool,
    pub content_type: Option<String>,
    pub error: Option<ValidationErrorCode>,
}

impl ValidationOutcome {
    fn passed(content_type: Option<String>) -> Self {
        Self {
            validated: true,
            content_type,
            error: None,
        }
    }

    fn failed(content_type: Option<String>, code: ValidationErrorCode) -> Self {
        Self {
            validated: false,
            content_type,
            error: Some(code),
        }
    }

    /// Records this outcome on the asset.
    pub fn apply(&self, asset: &mut RankedAsset) {
        match self.error {
            None => asset.mark_passed(),
            Some(code) => asset.mark_failed(code),
        }
    }
}

/// Probes `url` and judges the response. Blocking.
pub fn validate(probe: &dyn AssetProbe, url: &str) -> ValidationOutcome {
    match probe.probe(url) {
        Ok(response) => {
            let content_type = response.content_type.clone();
            match judge::judge(&response) {
                Ok(()) => {
                    tracing::debug!(
                        url,
                        status = response.status,
                        ?content_type,
                        content_length = ?response.content_length,
                        method = ?response.method,
                        "validated"
                    );
                    ValidationOutcome::passed(content_type)
                }
                Err(code) => {
                    tracing::info!(
                        url,
                        final_url = response.final_url.as_deref().unwrap_or(url),
                        status = response.status,
                        ?content_type,
                        method = ?response.method,
                        %code,
                        "rejected"
                    );
                    ValidationOutcome::failed(content_type, code)
                }
            }
        }
        Err(e) => {
            let code = if e.is_timeout() {
                ValidationErrorCode::Timeout
            } else {
                ValidationErrorCode::HttpError
            };
            tracing::debug!(url, error = %e, %code, "probe failed");
            ValidationOutcome::failed(None, code)
        }
    }
}

/// Validates assets with bounded parallelism.
#[derive(Clone)]
pub struct Validator {
    probe: Arc<dyn AssetProbe>,
    max_concurrent: usize,
}

impl Validator {
    pub fn new(probe: Arc<dyn AssetProbe>, max_concurrent: usize) -> Self {
        Self {
            probe,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn probe(&self) -> Arc<dyn AssetProbe> {
        Arc::clone(&self.probe)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub async fn validate_one(&self, url: &str) -> ValidationOutcome {
        let probe = Arc::clone(&self.probe);
        let owned = url.to_string();
        match tokio::task::spawn_blocking(move || validate(probe.as_ref(), &owned)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(url, "probe task join: {}", e);
                ValidationOutcome::failed(None, ValidationErrorCode::HttpError)
            }
        }
    }

    /// Validates every asset (no short-circuit) and returns them in input
    /// order, each marked passed or failed.
    pub async fn validate_all(&self, mut assets: Vec<RankedAsset>) -> Vec<RankedAsset> {
        let mut queue = assets
            .iter()
            .enumerate()
            .map(|(i, a)| (i, a.url.clone()))
            .collect::<Vec<_>>()
            .into_iter();
        let mut outcomes: Vec<Option<ValidationOutcome>> = vec![None; assets.len()];
        let mut join_set = tokio::task::JoinSet::new();

        loop {
            while join_set.len() < self.max_concurrent {
                let Some((index, url)) = queue.next() else {
                    break;
                };
                let probe = Arc::clone(&self.probe);
                join_set.spawn_blocking(move || (index, validate(probe.as_ref(), &url)));
            }

            if join_set.is_empty() {
                break;
            }

            let Some(res) = join_set.join_next().await else {
                break;
            };
            match res {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::warn!("probe task join: {}", e),
            }
        }

        for (asset, outcome) in assets.iter_mut().zip(outcomes) {
            match outcome {
                Some(outcome) => outcome.apply(asset),
                None => asset.mark_failed(ValidationErrorCode::HttpError),
            }
        }
        assets
    }
}

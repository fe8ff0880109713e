use crate::asset::RankedAsset;
use crate::retry::NetworkError;

/// Fatal outcome of resolving a landing page.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("invalid landing URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// The page has no recognizable data-file links; its layout likely changed.
    #[error("no data-file links found on {landing_url}")]
    NoCandidates { landing_url: String },
    /// Every candidate failed validation. `rejected` holds the per-asset report.
    #[error("none of the {} candidates on {landing_url} passed validation", .rejected.len())]
    AllInvalid {
        landing_url: String,
        rejected: Vec<RankedAsset>,
    },
    #[error("fetching {landing_url} failed")]
    Network {
        landing_url: String,
        source: NetworkError,
    },
}

impl ResolutionError {
    /// Stable identifier for reports and logs.
    pub fn reason_code(&self) -> &'static str {
        match self {
            ResolutionError::InvalidUrl { .. } => "invalid_url",
            ResolutionError::NoCandidates { .. } => "no_candidates",
            ResolutionError::AllInvalid { .. } => "all_invalid",
            ResolutionError::Network { .. } => "network",
        }
    }

    /// True when a person has to look at the landing page.
    pub fn needs_manual_review(&self) -> bool {
        matches!(
            self,
            ResolutionError::NoCandidates { .. } | ResolutionError::AllInvalid { .. }
        )
    }
}

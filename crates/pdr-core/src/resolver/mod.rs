//! Landing-page resolution: cache, fetch, extract, rank, validate, store.
//!
//! A trusted cache hit short-circuits everything else. Otherwise the page is
//! fetched and every candidate is ranked and (optionally) validated. Only
//! usable assets are cached: those that passed validation, or the full ranked
//! list when validation is disabled. Network failures and empty results are
//! fatal and never touch the cache.

mod error;

pub use error::ResolutionError;

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

use crate::asset::{RankedAsset, Validation};
use crate::cache::ResolutionCache;
use crate::config::PdrConfig;
use crate::extract::{extract_page_metadata, CandidateExtractor, PageMetadata};
use crate::fetch::{PageFetcher, PageSource};
use crate::probe::{AssetProbe, CurlProbe};
use crate::rank::Ranker;
use crate::retry::NetworkError;
use crate::validate::Validator;

/// Per-call switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Probe candidates (and revalidate cache hits).
    pub validate: bool,
    /// Consult the cache before fetching. Results are stored either way.
    pub use_cache: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            validate: true,
            use_cache: true,
        }
    }
}

/// Full result of one resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub landing_url: String,
    /// Usable assets in rank order.
    pub assets: Vec<RankedAsset>,
    /// Candidates that failed validation, with their reason codes.
    pub rejected: Vec<RankedAsset>,
    pub from_cache: bool,
}

impl Resolution {
    pub fn top(&self) -> Option<&RankedAsset> {
        self.assets.first()
    }
}

pub struct Resolver {
    source: Arc<dyn PageSource>,
    cache: Arc<ResolutionCache>,
    extractor: CandidateExtractor,
    ranker: Ranker,
    validator: Validator,
}

impl Resolver {
    pub fn new(
        source: Arc<dyn PageSource>,
        probe: Arc<dyn AssetProbe>,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        let max_concurrent = crate::config::ValidationConfig::default().max_concurrent;
        Self {
            source,
            cache,
            extractor: CandidateExtractor::default(),
            ranker: Ranker::default(),
            validator: Validator::new(probe, max_concurrent),
        }
    }

    /// Wires libcurl fetcher and probe, ranking and cache location from config.
    pub fn from_config(cfg: &PdrConfig) -> Result<Self> {
        let cache_path = match &cfg.cache_path {
            Some(path) => path.clone(),
            None => ResolutionCache::default_path()?,
        };
        let source = Arc::new(PageFetcher::new(cfg.http.clone(), cfg.retry_policy()));
        let probe = Arc::new(CurlProbe::new(&cfg.http));
        let cache = Arc::new(ResolutionCache::new(cache_path));
        Ok(Self::new(source, probe, cache)
            .with_ranker(Ranker::new(cfg.ranking.clone())?)
            .with_extractor(CandidateExtractor::new(&cfg.ranking.extra_extensions))
            .with_max_concurrent(cfg.validation.max_concurrent))
    }

    pub fn with_extractor(mut self, extractor: CandidateExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_ranker(mut self, ranker: Ranker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.validator = Validator::new(self.validator.probe(), max_concurrent);
        self
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Usable assets for `landing_url`, best first.
    pub async fn resolve(
        &self,
        landing_url: &str,
        options: ResolveOptions,
    ) -> Result<Vec<RankedAsset>, ResolutionError> {
        self.resolve_report(landing_url, options)
            .await
            .map(|resolution| resolution.assets)
    }

    /// Like `resolve`, also reporting rejected candidates and cache use.
    pub async fn resolve_report(
        &self,
        landing_url: &str,
        options: ResolveOptions,
    ) -> Result<Resolution, ResolutionError> {
        let base = parse_landing_url(landing_url)?;

        if options.use_cache {
            let hit = if options.validate {
                self.cache.get_trusted(landing_url, &self.validator).await
            } else {
                self.cache.get(landing_url).await
            };
            if let Some(entry) = hit {
                tracing::info!(landing_url, assets = entry.assets.len(), "resolved from cache");
                return Ok(Resolution {
                    landing_url: landing_url.to_string(),
                    assets: entry.assets,
                    rejected: Vec::new(),
                    from_cache: true,
                });
            }
        }

        let html = self.fetch_page(landing_url).await?;
        let candidates = self.extractor.extract(&html, &base);
        if candidates.is_empty() {
            tracing::warn!(landing_url, "no data-file links on landing page");
            return Err(ResolutionError::NoCandidates {
                landing_url: landing_url.to_string(),
            });
        }
        let ranked = self.ranker.rank(&candidates);

        let (assets, rejected): (Vec<RankedAsset>, Vec<RankedAsset>) = if options.validate {
            self.validator
                .validate_all(ranked)
                .await
                .into_iter()
                .partition(|a| a.validated == Validation::Passed)
        } else {
            (ranked, Vec::new())
        };

        for asset in &rejected {
            tracing::info!(
                landing_url,
                url = %asset.url,
                error = ?asset.validation_error,
                "candidate rejected"
            );
        }
        if assets.is_empty() {
            tracing::warn!(landing_url, rejected = rejected.len(), "every candidate failed validation");
            return Err(ResolutionError::AllInvalid {
                landing_url: landing_url.to_string(),
                rejected,
            });
        }

        if let Err(e) = self.cache.put(landing_url, assets.clone()).await {
            tracing::warn!(landing_url, "failed to cache resolution: {:#}", e);
        }
        let resolution = Resolution {
            landing_url: landing_url.to_string(),
            assets,
            rejected,
            from_cache: false,
        };
        tracing::info!(
            landing_url,
            assets = resolution.assets.len(),
            rejected = resolution.rejected.len(),
            top = resolution.top().map(|a| a.url.as_str()).unwrap_or_default(),
            "resolved landing page"
        );
        Ok(resolution)
    }

    /// Drops one cached resolution, or all of them.
    pub async fn clear_cache(&self, landing_url: Option<&str>) -> Result<usize> {
        self.cache.invalidate(landing_url).await
    }

    /// Title and description of the landing page.
    pub async fn page_metadata(&self, landing_url: &str) -> Result<PageMetadata, ResolutionError> {
        parse_landing_url(landing_url)?;
        let html = self.fetch_page(landing_url).await?;
        Ok(extract_page_metadata(&html))
    }

    async fn fetch_page(&self, landing_url: &str) -> Result<String, ResolutionError> {
        let source = Arc::clone(&self.source);
        let url = landing_url.to_string();
        let fetched = tokio::task::spawn_blocking(move || source.fetch(&url))
            .await
            .unwrap_or_else(|e| Err(NetworkError::Transport(format!("fetch task: {}", e))));
        fetched.map_err(|source| {
            tracing::warn!(landing_url, error = %source, "landing page fetch failed");
            ResolutionError::Network {
                landing_url: landing_url.to_string(),
                source,
            }
        })
    }
}

fn parse_landing_url(landing_url: &str) -> Result<Url, ResolutionError> {
    let invalid = |reason: String| ResolutionError::InvalidUrl {
        url: landing_url.to_string(),
        reason,
    };
    let url = Url::parse(landing_url).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {}", other))),
    }
}

//! Refresh runs over a catalog and the report they produce.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::asset::{AssetFormat, ValidationErrorCode};
use crate::catalog::Dataset;
use crate::filter::filter_assets;
use crate::resolver::{ResolutionError, ResolveOptions, Resolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Landing page resolved to a usable asset.
    Resolved,
    /// Catalog pins a direct URL; nothing was resolved.
    Pinned,
    /// The landing page needs a human: no links, or none usable.
    ManualRequired,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub dataset_id: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<AssetFormat>,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ReportEntry {
    fn failed(dataset_id: &str, status: EntryStatus, notes: String) -> Self {
        Self {
            dataset_id: dataset_id.to_string(),
            status,
            url: None,
            format: None,
            from_cache: false,
            notes: Some(notes),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// True when any dataset ended as `error` or `manual_required`.
    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.status, EntryStatus::Error | EntryStatus::ManualRequired))
    }
}

/// Human-readable note for a failed resolution.
pub fn notes_for(err: &ResolutionError) -> String {
    match err {
        ResolutionError::InvalidUrl { reason, .. } => format!("invalid landing_url: {}", reason),
        ResolutionError::NoCandidates { .. } => {
            "no data-file links on the landing page; the layout likely changed".to_string()
        }
        ResolutionError::AllInvalid { rejected, .. } => {
            let mut codes: Vec<&str> = rejected
                .iter()
                .filter_map(|a| a.validation_error)
                .map(|c: ValidationErrorCode| c.as_str())
                .collect();
            codes.sort_unstable();
            codes.dedup();
            format!(
                "all {} candidates failed validation ({}); pin a direct_url or review the page",
                rejected.len(),
                codes.join(", ")
            )
        }
        ResolutionError::Network { source, .. } => {
            format!("landing page unreachable ({}): {}", source.reason(), source)
        }
    }
}

async fn refresh_one(resolver: &Resolver, dataset: &Dataset, options: ResolveOptions) -> ReportEntry {
    let id = dataset.id.as_str();
    if let Some(direct) = &dataset.direct_url {
        return ReportEntry {
            dataset_id: id.to_string(),
            status: EntryStatus::Pinned,
            url: Some(direct.clone()),
            format: None,
            from_cache: false,
            notes: None,
        };
    }
    let Some(landing_url) = dataset.landing_url.as_deref() else {
        return ReportEntry::failed(id, EntryStatus::Error, "no landing_url or direct_url".to_string());
    };

    let resolution = match resolver.resolve_report(landing_url, options).await {
        Ok(r) => r,
        Err(e) => {
            let status = if e.needs_manual_review() {
                EntryStatus::ManualRequired
            } else {
                EntryStatus::Error
            };
            tracing::warn!(dataset = id, reason = e.reason_code(), "{}", e);
            return ReportEntry::failed(id, status, notes_for(&e));
        }
    };

    let from_cache = resolution.from_cache;
    let assets = match dataset.filter.as_deref() {
        Some(needle) => filter_assets(resolution.assets, needle),
        None => resolution.assets,
    };
    match assets.first() {
        Some(top) => ReportEntry {
            dataset_id: id.to_string(),
            status: EntryStatus::Resolved,
            url: Some(top.url.clone()),
            format: Some(top.format),
            from_cache,
            notes: None,
        },
        None => ReportEntry::failed(
            id,
            EntryStatus::ManualRequired,
            format!(
                "no resolved asset matches filter '{}'",
                dataset.filter.as_deref().unwrap_or_default()
            ),
        ),
    }
}

/// Resolves every dataset with up to `jobs` in flight. Entries come back in
/// catalog order.
pub async fn refresh(
    resolver: Arc<Resolver>,
    datasets: &[Dataset],
    options: ResolveOptions,
    jobs: usize,
) -> RunReport {
    let jobs = jobs.max(1);
    let mut queue = datasets.iter().cloned().enumerate();
    let mut entries: Vec<Option<ReportEntry>> = vec![None; datasets.len()];
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < jobs {
            let Some((index, dataset)) = queue.next() else {
                break;
            };
            let resolver = Arc::clone(&resolver);
            join_set.spawn(async move { (index, refresh_one(&resolver, &dataset, options).await) });
        }

        if join_set.is_empty() {
            break;
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok((index, entry)) => entries[index] = Some(entry),
            Err(e) => tracing::warn!("refresh task join: {}", e),
        }
    }

    let entries = entries
        .into_iter()
        .zip(datasets)
        .map(|(entry, ds)| {
            entry.unwrap_or_else(|| {
                ReportEntry::failed(&ds.id, EntryStatus::Error, "refresh task failed".to_string())
            })
        })
        .collect();
    let report = RunReport {
        generated_at: Utc::now(),
        entries,
    };
    tracing::info!(
        resolved = report.count(EntryStatus::Resolved),
        pinned = report.count(EntryStatus::Pinned),
        manual = report.count(EntryStatus::ManualRequired),
        errors = report.count(EntryStatus::Error),
        "refresh finished"
    );
    report
}

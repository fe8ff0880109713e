//! `pdr refresh` – resolve every dataset in a catalog.

use anyhow::Result;
use pdr_core::catalog;
use pdr_core::report::{refresh, EntryStatus};
use pdr_core::{ResolveOptions, Resolver};
use std::path::Path;
use std::sync::Arc;

pub async fn run_refresh(
    resolver: Arc<Resolver>,
    catalog_path: &Path,
    options: ResolveOptions,
    jobs: usize,
    json: bool,
) -> Result<i32> {
    let datasets = catalog::load(catalog_path)?;
    if datasets.is_empty() {
        println!("Catalog has no datasets.");
        return Ok(0);
    }
    let report = refresh(resolver, &datasets, options, jobs).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{:<24} {:<16} {}", "DATASET", "STATUS", "URL / NOTES");
        for e in &report.entries {
            let status = match e.status {
                EntryStatus::Resolved if e.from_cache => "resolved*",
                EntryStatus::Resolved => "resolved",
                EntryStatus::Pinned => "pinned",
                EntryStatus::ManualRequired => "manual_required",
                EntryStatus::Error => "error",
            };
            let detail = e.url.as_deref().or(e.notes.as_deref()).unwrap_or("-");
            println!("{:<24} {:<16} {}", e.dataset_id, status, detail);
        }
        println!(
            "\n{} resolved, {} pinned, {} manual, {} errors (* = from cache)",
            report.count(EntryStatus::Resolved),
            report.count(EntryStatus::Pinned),
            report.count(EntryStatus::ManualRequired),
            report.count(EntryStatus::Error)
        );
    }

    Ok(if report.has_failures() { 2 } else { 0 })
}

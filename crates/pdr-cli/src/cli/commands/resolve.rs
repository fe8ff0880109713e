//! `pdr resolve` – rank and validate the data files on a landing page.

use anyhow::Result;
use pdr_core::filter::filter_assets;
use pdr_core::{RankedAsset, ResolutionError, ResolveOptions, Resolver};

pub async fn run_resolve(
    resolver: &Resolver,
    landing_url: &str,
    options: ResolveOptions,
    filter: Option<&str>,
    json: bool,
) -> Result<i32> {
    let mut resolution = match resolver.resolve_report(landing_url, options).await {
        Ok(r) => r,
        Err(e) => {
            if let ResolutionError::AllInvalid { rejected, .. } = &e {
                print_rejected(rejected);
            }
            let code = e.reason_code();
            return Err(anyhow::Error::new(e).context(format!("resolution failed ({})", code)));
        }
    };
    if let Some(needle) = filter {
        resolution.assets = filter_assets(resolution.assets, needle);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else if resolution.assets.is_empty() {
        println!("No assets match filter.");
    } else {
        if resolution.from_cache {
            println!("(from cache)");
        }
        print_assets(&resolution.assets);
        if !resolution.rejected.is_empty() {
            println!();
            print_rejected(&resolution.rejected);
        }
    }

    Ok(if resolution.assets.is_empty() { 1 } else { 0 })
}

fn print_assets(assets: &[RankedAsset]) {
    println!("{:<5} {:<6} {:<8} {:<6} {}", "RANK", "FORMAT", "VALID", "SCORE", "URL");
    for a in assets {
        println!(
            "{:<5} {:<6} {:<8} {:<6} {}",
            a.rank,
            a.format.as_str(),
            a.validated.as_str(),
            a.score,
            a.url
        );
        if !a.title.is_empty() {
            println!("{:<5} {}", "", a.title);
        }
    }
}

fn print_rejected(rejected: &[RankedAsset]) {
    eprintln!("Rejected candidates:");
    for a in rejected {
        let reason = a
            .validation_error
            .map(|c| c.as_str())
            .unwrap_or("unknown");
        eprintln!("  #{:<3} {:<16} {}", a.rank, reason, a.url);
    }
}

//! `pdr clear-cache` – drop cached resolutions.

use anyhow::Result;
use pdr_core::Resolver;

pub async fn run_clear_cache(resolver: &Resolver, landing_url: Option<&str>) -> Result<i32> {
    let removed = resolver.clear_cache(landing_url).await?;
    match landing_url {
        Some(url) if removed == 0 => println!("No cache entry for {}.", url),
        Some(url) => println!("Removed cache entry for {}.", url),
        None => println!(
            "Removed {} cache entr{} from {}.",
            removed,
            if removed == 1 { "y" } else { "ies" },
            resolver.cache().path().display()
        ),
    }
    Ok(0)
}

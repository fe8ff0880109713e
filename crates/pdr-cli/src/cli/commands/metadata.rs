//! `pdr metadata` – show a landing page's title and description.

use anyhow::{Context, Result};
use pdr_core::Resolver;

pub async fn run_metadata(resolver: &Resolver, landing_url: &str) -> Result<i32> {
    let meta = resolver
        .page_metadata(landing_url)
        .await
        .context("fetch page metadata")?;
    println!("Title:       {}", meta.title.as_deref().unwrap_or("-"));
    println!("Description: {}", meta.description.as_deref().unwrap_or("-"));
    Ok(0)
}

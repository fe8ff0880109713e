//! CLI for the pdr landing-page resolver.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pdr_core::config;
use pdr_core::{ResolveOptions, Resolver};
use std::path::PathBuf;
use std::sync::Arc;

use commands::{run_clear_cache, run_metadata, run_refresh, run_resolve};

/// Top-level CLI for pdr.
#[derive(Debug, Parser)]
#[command(name = "pdr")]
#[command(about = "pdr: resolve dataset landing pages to validated download URLs", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/pdr/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve a landing page into ranked data-file URLs.
    Resolve {
        /// Landing page URL.
        landing_url: String,
        /// Skip probing candidates (and revalidating cache hits).
        #[arg(long)]
        no_validate: bool,
        /// Ignore cached results (the fresh result is still cached).
        #[arg(long)]
        no_cache: bool,
        /// Only show assets whose format or title contains this keyword.
        #[arg(long, value_name = "KEYWORD")]
        filter: Option<String>,
        /// Print the full resolution as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Drop one cached resolution, or all of them.
    ClearCache {
        /// Landing page URL; omit to clear everything.
        landing_url: Option<String>,
    },

    /// Show a landing page's title and description.
    Metadata {
        /// Landing page URL.
        landing_url: String,
    },

    /// Resolve every dataset in a catalog file and report the outcome.
    Refresh {
        /// Path to the catalog TOML.
        catalog: PathBuf,
        /// Resolve up to N landing pages concurrently.
        #[arg(long, default_value = "1", value_name = "N")]
        jobs: usize,
        #[arg(long)]
        no_validate: bool,
        #[arg(long)]
        no_cache: bool,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn options(no_validate: bool, no_cache: bool) -> ResolveOptions {
    ResolveOptions {
        validate: !no_validate,
        use_cache: !no_cache,
    }
}

impl CliCommand {
    /// Parses arguments, runs the command and returns the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);
        let resolver = Arc::new(Resolver::from_config(&cfg)?);

        let code = match cli.command {
            CliCommand::Resolve {
                landing_url,
                no_validate,
                no_cache,
                filter,
                json,
            } => {
                run_resolve(
                    &resolver,
                    &landing_url,
                    options(no_validate, no_cache),
                    filter.as_deref(),
                    json,
                )
                .await?
            }
            CliCommand::ClearCache { landing_url } => {
                run_clear_cache(&resolver, landing_url.as_deref()).await?
            }
            CliCommand::Metadata { landing_url } => run_metadata(&resolver, &landing_url).await?,
            CliCommand::Refresh {
                catalog,
                jobs,
                no_validate,
                no_cache,
                json,
            } => {
                run_refresh(
                    resolver,
                    &catalog,
                    options(no_validate, no_cache),
                    jobs,
                    json,
                )
                .await?
            }
        };

        Ok(code)
    }
}

#[cfg(test)]
mod tests;

//! Subcommand handlers. Each prints one pretty JSON document to stdout.

use serde::Serialize;
use shelfscan_core::{AppConfig, SearchQuery};

use crate::wiring::{build_cache, build_engine};

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs one search and prints the full outcome, diagnostics included.
///
/// # Errors
///
/// Returns an error if the engine cannot be built or the query is invalid.
/// A search that found nothing is not an error.
pub(crate) async fn run_search(config: &AppConfig, query: &SearchQuery) -> anyhow::Result<()> {
    let engine = build_engine(config).await?;
    let outcome = engine.search(query).await?;
    tracing::info!(
        products = outcome.products.len(),
        origin = ?outcome.origin,
        stop = ?outcome.report.stop,
        "search finished"
    );
    print_json(&outcome)
}

/// Looks up one product page.
///
/// # Errors
///
/// Returns an error if the engine cannot be built or the URL is invalid.
pub(crate) async fn run_detail(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let engine = build_engine(config).await?;
    let lookup = engine.detail(url).await?;
    print_json(&lookup)
}

#[derive(Debug, Serialize)]
struct PurgeReport {
    cache_mode: String,
    purged: usize,
}

/// Removes expired entries from the configured cache.
///
/// # Errors
///
/// Returns an error if the cache cannot be opened or the purge fails.
pub(crate) async fn run_cache_purge(config: &AppConfig) -> anyhow::Result<()> {
    let cache = build_cache(config).await?;
    let purged = cache.purge_expired().await?;
    tracing::info!(purged, "expired cache entries removed");
    print_json(&PurgeReport {
        cache_mode: config.cache_mode.to_string(),
        purged,
    })
}

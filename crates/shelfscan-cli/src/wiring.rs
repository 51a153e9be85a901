//! Builds the engine's collaborators from configuration.

use std::sync::Arc;

use anyhow::Context;
use shelfscan_core::{AppConfig, CacheMode, CatalogProfile, DisabledCache, MemoryCache, SearchCache};
use shelfscan_scraper::{PageRenderer, SearchEngine};

/// Loads the catalog profile from `catalog_path`, or the built-in one.
pub(crate) fn load_profile(config: &AppConfig) -> anyhow::Result<CatalogProfile> {
    match &config.catalog_path {
        Some(path) => shelfscan_core::load_catalog(path)
            .with_context(|| format!("loading catalog profile {}", path.display())),
        None => Ok(CatalogProfile::default()),
    }
}

pub(crate) async fn build_cache(config: &AppConfig) -> anyhow::Result<Arc<dyn SearchCache>> {
    let cache: Arc<dyn SearchCache> = match config.cache_mode {
        CacheMode::Memory => Arc::new(MemoryCache::new(config.cache_expiry())),
        CacheMode::Sqlite => Arc::new(
            shelfscan_db::SqliteSearchCache::connect(
                &config.cache_database_url,
                config.cache_expiry(),
            )
            .await
            .with_context(|| format!("opening cache database {}", config.cache_database_url))?,
        ),
        CacheMode::Disabled => Arc::new(DisabledCache),
    };
    tracing::debug!(mode = %config.cache_mode, "cache ready");
    Ok(cache)
}

#[cfg(feature = "browser")]
pub(crate) fn build_renderer() -> Arc<dyn PageRenderer> {
    Arc::new(shelfscan_scraper::ChromiumRenderer::new())
}

#[cfg(not(feature = "browser"))]
pub(crate) fn build_renderer() -> Arc<dyn PageRenderer> {
    tracing::debug!("built without the `browser` feature; rendering fallback is unavailable");
    Arc::new(shelfscan_scraper::DisabledRenderer)
}

pub(crate) async fn build_engine(config: &AppConfig) -> anyhow::Result<SearchEngine> {
    let profile = load_profile(config)?;
    let cache = build_cache(config).await?;
    SearchEngine::from_config(config, &profile, build_renderer(), cache)
        .map_err(|e| anyhow::anyhow!("failed to build search engine: {e}"))
}

//! Search orchestration: cache lookup, paged fetching with a one-way switch
//! from the structured endpoint to rendering, and result assembly.
//!
//! A search walks pages `1..=page_budget` strictly in order. The active
//! method starts as structured; the first `Blocked` page moves it to
//! rendered for the rest of the search and the same page is retried there.
//! A `Blocked` page while rendering ends the search. An `Empty` page from
//! either method means the catalog has no more results.

mod assemble;
mod detail;

use std::sync::Arc;
use std::time::Duration;

use shelfscan_core::{
    AppConfig, CatalogProfile, FetchMethod, Fingerprint, ProductSummary, QueryError, ResolvedQuery,
    SearchCache, SearchQuery, UnknownPricePolicy,
};

use crate::client::{CatalogSite, StructuredClient};
use crate::disguise::Disguise;
use crate::error::ScraperError;
use crate::normalize::normalize_listing;
use crate::outcome::{BlockReason, FetchOutcome, FetchReport, ResultOrigin, SearchOutcome, StopReason};
use crate::render::{PageRenderer, RenderedClient};

use assemble::{finalize, retain_matching, Accumulator};

/// Search knobs that come from configuration rather than from the caller.
#[derive(Debug, Clone)]
pub struct SearchPolicy {
    pub default_page_budget: u32,
    pub cheapest_page_budget: u32,
    pub cheapest_markers: Vec<String>,
    pub unknown_price_policy: UnknownPricePolicy,
}

/// Acquisition method currently in use by one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveMethod {
    Structured,
    Rendered { since_page: u32 },
}

impl ActiveMethod {
    fn fetch_method(self) -> FetchMethod {
        match self {
            ActiveMethod::Structured => FetchMethod::Structured,
            ActiveMethod::Rendered { .. } => FetchMethod::Rendered,
        }
    }
}

pub struct SearchEngine {
    structured: StructuredClient,
    rendered: RenderedClient,
    cache: Arc<dyn SearchCache>,
    policy: SearchPolicy,
}

impl SearchEngine {
    #[must_use]
    pub fn new(
        structured: StructuredClient,
        rendered: RenderedClient,
        cache: Arc<dyn SearchCache>,
        policy: SearchPolicy,
    ) -> Self {
        Self {
            structured,
            rendered,
            cache,
            policy,
        }
    }

    /// Wires both clients from configuration and a catalog profile.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if the catalog base URL is invalid, the
    /// user-agent pool or pacing interval is rejected, or the HTTP client
    /// cannot be built.
    pub fn from_config(
        config: &AppConfig,
        catalog: &CatalogProfile,
        renderer: Arc<dyn PageRenderer>,
        cache: Arc<dyn SearchCache>,
    ) -> Result<Self, ScraperError> {
        let site = Arc::new(CatalogSite::from_profile(catalog)?);
        let disguise = Arc::new(Disguise::new(
            catalog.user_agents.clone(),
            site.base().as_str(),
            config.pace_min_ms,
            config.pace_max_ms,
        )?);
        let structured = StructuredClient::new(
            Arc::clone(&site),
            Arc::clone(&disguise),
            config.request_timeout_secs,
            config.max_retries,
            config.retry_backoff_base_ms,
        )?;
        let rendered = RenderedClient::new(
            renderer,
            site,
            disguise,
            config.render_slots,
            Duration::from_secs(config.render_timeout_secs),
        );
        let policy = SearchPolicy {
            default_page_budget: config.default_page_budget,
            cheapest_page_budget: config.cheapest_page_budget,
            cheapest_markers: catalog.cheapest_markers.clone(),
            unknown_price_policy: config.unknown_price_policy,
        };
        Ok(Self::new(structured, rendered, cache, policy))
    }

    /// Runs one search.
    ///
    /// Fetch failures never surface here: a search where every method was
    /// blocked returns no products and a report whose `stop` is
    /// [`StopReason::AllMethodsBlocked`].
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if the query is invalid. Nothing is fetched then.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchOutcome, QueryError> {
        let resolved = query.resolve(
            &self.policy.cheapest_markers,
            self.policy.default_page_budget,
            self.policy.cheapest_page_budget,
        )?;
        let fingerprint = Fingerprint::of(&resolved);
        let policy = self.policy.unknown_price_policy;

        if self.cache.is_enabled() {
            match self.cache.lookup(&fingerprint).await {
                Ok(Some(entry)) => {
                    tracing::info!(
                        text = %resolved.text,
                        fingerprint = %fingerprint,
                        cached = entry.results.len(),
                        "cache hit"
                    );
                    return Ok(SearchOutcome {
                        products: finalize(entry.results, &resolved, policy),
                        origin: ResultOrigin::Cache,
                        report: FetchReport::cache_hit(),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "cache lookup failed, fetching from network");
                }
            }
        }

        let (collected, report) = self.collect(&resolved).await;
        let matching = retain_matching(collected, &resolved, policy);

        if self.cache.is_enabled() && !matching.is_empty() {
            if let Err(e) = self.cache.store(&fingerprint, &matching).await {
                tracing::warn!(error = %e, "cache store failed");
            }
        }

        Ok(SearchOutcome {
            products: finalize(matching, &resolved, policy),
            origin: ResultOrigin::Network,
            report,
        })
    }

    /// Walks the page budget and returns every unique item found, in
    /// discovery order.
    async fn collect(&self, query: &ResolvedQuery) -> (Vec<ProductSummary>, FetchReport) {
        let policy = self.policy.unknown_price_policy;
        // A cached set must serve any max_results, so only stop early when
        // nothing will be stored and no cross-page ordering is needed.
        let early_stop = !self.cache.is_enabled() && !query.cheapest;
        let category = query.category.as_deref();

        let mut method = ActiveMethod::Structured;
        let mut acc = Accumulator::default();
        let mut pages_attempted = 0u32;
        let mut last_block: Option<BlockReason> = None;
        let mut stop = StopReason::BudgetExhausted;

        'pages: for page in 1..=query.page_budget {
            loop {
                pages_attempted += 1;
                let fetch_method = method.fetch_method();
                let outcome = match method {
                    ActiveMethod::Structured => {
                        self.structured.fetch(&query.text, page, category).await
                    }
                    ActiveMethod::Rendered { .. } => {
                        self.rendered.fetch(&query.text, page, category).await
                    }
                };

                match outcome {
                    FetchOutcome::Found(raw) => {
                        let base = self.structured.site().base();
                        let added = acc.extend(
                            raw.into_iter()
                                .filter_map(|item| normalize_listing(item, fetch_method, base)),
                        );
                        tracing::info!(
                            page,
                            method = %fetch_method,
                            added,
                            total = acc.len(),
                            "page fetched"
                        );
                        break;
                    }
                    FetchOutcome::Empty => {
                        tracing::info!(page, method = %fetch_method, "no more results");
                        stop = StopReason::EndOfResults;
                        break 'pages;
                    }
                    FetchOutcome::Blocked(reason) => {
                        last_block = Some(reason.clone());
                        if method == ActiveMethod::Structured {
                            tracing::warn!(
                                page,
                                %reason,
                                "structured endpoint unusable, switching to rendering"
                            );
                            method = ActiveMethod::Rendered { since_page: page };
                            continue;
                        }
                        tracing::warn!(page, %reason, "rendering blocked too, giving up");
                        stop = StopReason::AllMethodsBlocked;
                        break 'pages;
                    }
                }
            }

            if early_stop && acc.count_passing(query, policy) >= query.max_results {
                stop = StopReason::EnoughResults;
                break;
            }
        }

        let report = FetchReport {
            pages_attempted,
            final_method: method.fetch_method(),
            switched_at_page: match method {
                ActiveMethod::Structured => None,
                ActiveMethod::Rendered { since_page } => Some(since_page),
            },
            stop,
            last_block,
        };
        (acc.into_items(), report)
    }
}

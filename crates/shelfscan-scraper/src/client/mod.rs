//! HTTP client for the catalog's structured listing endpoint.

mod detail;
mod origin;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};

use crate::disguise::Disguise;
use crate::error::ScraperError;
use crate::normalize::RawListing;
use crate::outcome::{BlockReason, FetchOutcome};
use crate::retry::retry_with_backoff;
use crate::types::{ListItem, ListingEnvelope};

pub use origin::CatalogSite;

/// Body and final URL (after redirects) of one successful GET.
pub(crate) struct FetchedBody {
    pub(crate) final_url: Url,
    pub(crate) body: String,
}

/// HTTP client for the structured (`ajax=true`) listing endpoint and for
/// plain product pages.
///
/// Transient errors (connect/timeout, 429, 5xx) are retried with jittered
/// exponential backoff up to `max_retries` additional attempts. Every attempt
/// is paced and carries a fresh identity.
pub struct StructuredClient {
    pub(super) client: Client,
    pub(super) site: Arc<CatalogSite>,
    pub(super) disguise: Arc<Disguise>,
    /// Maximum number of retry attempts after the first failure.
    pub(super) max_retries: u32,
    /// Base delay in milliseconds: `backoff_base_ms * 2^(retry-1)`, ±25 %.
    pub(super) backoff_base_ms: u64,
}

impl StructuredClient {
    /// Creates a client with the given per-request timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        site: Arc<CatalogSite>,
        disguise: Arc<Disguise>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            site,
            disguise,
            max_retries,
            backoff_base_ms,
        })
    }

    #[must_use]
    pub fn site(&self) -> &CatalogSite {
        &self.site
    }

    /// Fetches one listing page.
    ///
    /// - `Found` carries the page's raw items (at least one).
    /// - `Empty` means the endpoint answered with an empty list.
    /// - `Blocked` covers challenge bodies, statuses that survived the retry
    ///   budget, transport failures, and bodies without a listing section.
    pub async fn fetch(
        &self,
        query_text: &str,
        page: u32,
        category: Option<&str>,
    ) -> FetchOutcome<Vec<RawListing>> {
        let url = match self.site.structured_listing_url(query_text, page, category) {
            Ok(url) => url,
            Err(e) => return FetchOutcome::Blocked(BlockReason::from(&e)),
        };

        let fetched = match self.get(&url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(page, url = %url, error = %e, "structured request failed");
                return FetchOutcome::Blocked(BlockReason::from(&e));
            }
        };

        let outcome = self.classify_listing(&fetched);
        if let FetchOutcome::Blocked(reason) = &outcome {
            tracing::warn!(page, url = %url, %reason, "structured endpoint blocked");
        }
        outcome
    }

    fn classify_listing(&self, fetched: &FetchedBody) -> FetchOutcome<Vec<RawListing>> {
        let values = serde_json::from_str::<ListingEnvelope>(&fetched.body)
            .ok()
            .and_then(ListingEnvelope::into_item_values);

        let Some(values) = values else {
            if self.site.is_challenge(&fetched.body, Some(&fetched.final_url)) {
                return FetchOutcome::Blocked(BlockReason::Challenge);
            }
            return FetchOutcome::Blocked(BlockReason::Malformed(
                "body has no mods.listItems section".to_owned(),
            ));
        };

        if values.is_empty() {
            return FetchOutcome::Empty;
        }

        let total = values.len();
        let items: Vec<RawListing> = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<ListItem>(value) {
                Ok(item) => Some(item.into_raw()),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping undecodable list item");
                    None
                }
            })
            .collect();

        if items.is_empty() {
            return FetchOutcome::Blocked(BlockReason::Malformed(format!(
                "none of {total} list items could be decoded"
            )));
        }
        FetchOutcome::Found(items)
    }

    /// One paced, disguised GET with retry. Non-2xx statuses become errors.
    pub(crate) async fn get(&self, url: &Url) -> Result<FetchedBody, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            self.disguise.pace().await;
            let identity = self.disguise.next_identity();

            let response = self
                .client
                .get(url.clone())
                .headers(identity.headers)
                .header(reqwest::header::USER_AGENT, identity.user_agent)
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ScraperError::RateLimited {
                    url: url.to_string(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let final_url = response.url().clone();
            let body = response.text().await?;
            Ok(FetchedBody { final_url, body })
        })
        .await
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;

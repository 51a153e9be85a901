//! Plain-HTTP product page fetch for `StructuredClient`.

use reqwest::Url;

use crate::error::ScraperError;
use crate::markup::extract_detail;
use crate::normalize::RawDetail;
use crate::outcome::{BlockReason, FetchOutcome};

use super::{FetchedBody, StructuredClient};

impl StructuredClient {
    /// Fetches a product page over plain HTTP.
    ///
    /// For a single resource `Empty` means the product does not exist: the
    /// page answered 404/410, or it has no product title and shows a
    /// not-found marker. Those are never retried. A page with no product title is reported as `Blocked` so the
    /// caller can try rendering it.
    pub async fn fetch_detail(&self, url: &Url) -> FetchOutcome<RawDetail> {
        match self.get(url).await {
            Ok(fetched) => self.classify_detail(&fetched),
            Err(ScraperError::UnexpectedStatus {
                status: 404 | 410, ..
            }) => {
                tracing::info!(url = %url, "product page does not exist");
                FetchOutcome::Empty
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "product page request failed");
                FetchOutcome::Blocked(BlockReason::from(&e))
            }
        }
    }

    fn classify_detail(&self, fetched: &FetchedBody) -> FetchOutcome<RawDetail> {
        let detail = extract_detail(&fetched.body);
        if self.site.is_product_title(detail.title.as_deref()) {
            return FetchOutcome::Found(detail);
        }

        // Markers only count once the page failed to yield a product title.
        if self.site.is_not_found(&fetched.body) {
            return FetchOutcome::Empty;
        }
        if self.site.is_challenge(&fetched.body, Some(&fetched.final_url)) {
            FetchOutcome::Blocked(BlockReason::Challenge)
        } else {
            FetchOutcome::Blocked(BlockReason::Malformed(
                "product page has no title".to_owned(),
            ))
        }
    }
}

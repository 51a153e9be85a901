use shelfscan_core::FetchMethod;

use crate::error::ScraperError;
use crate::normalize::normalize_detail;
use crate::outcome::{DetailLookup, FetchOutcome};

use super::SearchEngine;

impl SearchEngine {
    /// Looks up one product page: plain HTTP first, rendering if that is
    /// blocked. A page that does not exist is reported as
    /// [`DetailLookup::NotFound`] straight away, without trying rendering.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `url` is not an http(s) URL.
    pub async fn detail(&self, url: &str) -> Result<DetailLookup, ScraperError> {
        let url = self.structured.site().product_url(url)?;

        match self.structured.fetch_detail(&url).await {
            FetchOutcome::Found(raw) => {
                return Ok(DetailLookup::Found(normalize_detail(
                    raw,
                    url.as_str(),
                    FetchMethod::Structured,
                )));
            }
            FetchOutcome::Empty => return Ok(DetailLookup::NotFound),
            FetchOutcome::Blocked(reason) => {
                tracing::warn!(url = %url, %reason, "product page blocked, switching to rendering");
            }
        }

        Ok(match self.rendered.fetch_detail(&url).await {
            FetchOutcome::Found(raw) => {
                DetailLookup::Found(normalize_detail(raw, url.as_str(), FetchMethod::Rendered))
            }
            FetchOutcome::Empty => DetailLookup::NotFound,
            FetchOutcome::Blocked(reason) => DetailLookup::Unavailable {
                reason: reason.to_string(),
            },
        })
    }
}

//! Catalog addressing: listing URLs for both methods and body markers.

use reqwest::Url;
use shelfscan_core::CatalogProfile;

use crate::error::ScraperError;

/// URL and marker knowledge about one catalog, shared by both clients.
#[derive(Debug, Clone)]
pub struct CatalogSite {
    base: Url,
    search_path: String,
    challenge_markers: Vec<String>,
    not_found_markers: Vec<String>,
}

impl CatalogSite {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the profile's `base_url` does
    /// not parse or has no host.
    pub fn from_profile(profile: &CatalogProfile) -> Result<Self, ScraperError> {
        let parsed = Url::parse(profile.base_url.trim()).map_err(|e| ScraperError::InvalidUrl {
            url: profile.base_url.clone(),
            reason: e.to_string(),
        })?;
        if parsed.host_str().is_none() {
            return Err(ScraperError::InvalidUrl {
                url: profile.base_url.clone(),
                reason: "no host".to_owned(),
            });
        }
        let base = Url::parse(&parsed.origin().ascii_serialization()).map_err(|e| {
            ScraperError::InvalidUrl {
                url: profile.base_url.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            base,
            search_path: profile.search_path.clone(),
            challenge_markers: lowercase_all(&profile.challenge_markers),
            not_found_markers: lowercase_all(&profile.not_found_markers),
        })
    }

    /// Catalog origin with a trailing `/`, e.g. `https://www.daraz.pk/`.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Structured endpoint URL for one page.
    ///
    /// - search: `{search_path}?ajax=true&q=..&page=N&_keyori=ss`
    /// - category: `/{category}/?ajax=true&page=N&q=..`
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the path cannot be joined.
    pub fn structured_listing_url(
        &self,
        query_text: &str,
        page: u32,
        category: Option<&str>,
    ) -> Result<Url, ScraperError> {
        let mut url = self.listing_path(category)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ajax", "true");
            match category {
                None => {
                    pairs
                        .append_pair("q", query_text)
                        .append_pair("page", &page.to_string())
                        .append_pair("_keyori", "ss");
                }
                Some(_) => {
                    pairs
                        .append_pair("page", &page.to_string())
                        .append_pair("q", query_text);
                }
            }
        }
        Ok(url)
    }

    /// Human-facing listing URL for one page, loaded by the renderer.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the path cannot be joined.
    pub fn rendered_listing_url(
        &self,
        query_text: &str,
        page: u32,
        category: Option<&str>,
    ) -> Result<Url, ScraperError> {
        let mut url = self.listing_path(category)?;
        url.query_pairs_mut()
            .append_pair("q", query_text)
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    fn listing_path(&self, category: Option<&str>) -> Result<Url, ScraperError> {
        let path = match category {
            Some(slug) => format!("/{slug}/"),
            None => self.search_path.clone(),
        };
        self.base.join(&path).map_err(|e| ScraperError::InvalidUrl {
            url: format!("{}{path}", self.base),
            reason: e.to_string(),
        })
    }

    /// Parses a caller-supplied product URL. Relative URLs are resolved
    /// against the catalog origin.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] for unparseable or non-http(s) URLs.
    pub fn product_url(&self, url: &str) -> Result<Url, ScraperError> {
        let resolved = self.base.join(url.trim()).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(resolved.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidUrl {
                url: url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", resolved.scheme()),
            });
        }
        Ok(resolved)
    }

    /// `true` if the body or the final URL carries a bot-challenge marker.
    #[must_use]
    pub fn is_challenge(&self, body: &str, final_url: Option<&Url>) -> bool {
        let body = body.to_lowercase();
        let url = final_url.map(|u| u.as_str().to_lowercase());
        self.challenge_markers
            .iter()
            .any(|m| body.contains(m) || url.as_deref().is_some_and(|u| u.contains(m)))
    }

    /// `true` if the body says the product does not exist.
    #[must_use]
    pub fn is_not_found(&self, body: &str) -> bool {
        let body = body.to_lowercase();
        self.not_found_markers.iter().any(|m| body.contains(m))
    }

    /// `true` for an extracted product-page title that is not itself a
    /// not-found message.
    #[must_use]
    pub fn is_product_title(&self, title: Option<&str>) -> bool {
        title.is_some_and(|t| !self.is_not_found(t))
    }
}

fn lowercase_all(markers: &[String]) -> Vec<String> {
    markers
        .iter()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .collect()
}

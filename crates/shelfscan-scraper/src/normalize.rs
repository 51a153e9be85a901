//! Normalization from raw listing/detail shapes to the core product records.
//!
//! Both acquisition methods reduce their input to a [`RawListing`] (or
//! [`RawDetail`]) of optional text fields first; the text parsing itself is in
//! [`crate::parse`]. This module decides what is required, resolves URLs
//! against the catalog origin, and stamps provenance.

use reqwest::Url;
use shelfscan_core::{FetchMethod, ProductDetail, ProductSummary, StockStatus};

use crate::parse::{clean_text, parse_price, parse_rating, parse_stock, truncate_chars};

/// Names longer than this are cut; some listings stuff keywords into titles.
pub const MAX_NAME_CHARS: usize = 200;

/// One search-result item as extracted, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    pub name: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
    /// Absolute, protocol-relative (`//host/...`) or path-relative.
    pub url: Option<String>,
    pub stock: Option<String>,
}

/// A product page as extracted, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDetail {
    pub title: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub seller: Option<String>,
    pub specifications: Vec<String>,
}

/// Resolves `href` against `base`.
///
/// - `https://...` and `http://...` are kept as is.
/// - `//host/path` takes the base scheme.
/// - `/path` and `path` are joined onto the base origin.
///
/// Returns `None` for non-web schemes (`javascript:`, `mailto:`) or anything
/// that does not parse.
#[must_use]
pub fn resolve_url(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Maps a raw listing into a [`ProductSummary`] tagged with `method`.
///
/// Returns `None` when the item has no usable name or URL. Missing or
/// unparseable price and stock fields become `None` and
/// [`StockStatus::Unknown`].
#[must_use]
pub fn normalize_listing(raw: RawListing, method: FetchMethod, base: &Url) -> Option<ProductSummary> {
    let name = raw
        .name
        .as_deref()
        .map(clean_text)
        .filter(|n| !n.is_empty())
        .map(|n| truncate_chars(&n, MAX_NAME_CHARS));
    let url = raw.url.as_deref().and_then(|u| resolve_url(u, base));

    let (Some(name), Some(url)) = (name, url) else {
        tracing::debug!(?raw, %method, "dropping listing without name or url");
        return None;
    };

    Some(ProductSummary {
        name,
        price: raw.price.as_deref().and_then(parse_price),
        original_price: raw.original_price.as_deref().and_then(parse_price),
        in_stock: raw
            .stock
            .as_deref()
            .map_or(StockStatus::Unknown, parse_stock),
        url,
        method,
    })
}

/// Maps a raw product page into a [`ProductDetail`].
///
/// `url` is the page that was fetched. A page without a title still yields a
/// record; the title is then empty.
#[must_use]
pub fn normalize_detail(raw: RawDetail, url: &str, method: FetchMethod) -> ProductDetail {
    ProductDetail {
        url: url.to_owned(),
        title: raw.title.as_deref().map(clean_text).unwrap_or_default(),
        price: raw.price.as_deref().and_then(parse_price),
        rating: raw.rating.as_deref().and_then(parse_rating),
        seller: raw
            .seller
            .as_deref()
            .map(clean_text)
            .filter(|s| !s.is_empty()),
        specifications: raw
            .specifications
            .iter()
            .map(|s| clean_text(s))
            .filter(|s| !s.is_empty())
            .collect(),
        method,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

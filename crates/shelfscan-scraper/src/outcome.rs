//! Tagged outcomes passed between the clients and the search engine, and the
//! diagnostics returned to callers.

use serde::Serialize;
use shelfscan_core::{FetchMethod, ProductDetail, ProductSummary};

use crate::error::ScraperError;

/// Result of one page attempt by one acquisition method.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// Well-formed response with at least one item.
    Found(T),
    /// Well-formed response with no items: there are no more pages.
    Empty,
    /// The method cannot be used for this search any more.
    Blocked(BlockReason),
}

/// Why a method was given up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BlockReason {
    /// A bot-detection or captcha page was served instead of data.
    Challenge,
    /// A non-success status that retrying did not clear.
    Status(u16),
    /// The body did not have the expected shape.
    Malformed(String),
    /// Transient failures outlasted the retry budget.
    RetriesExhausted(String),
    /// The attempt did not finish in time.
    Timeout,
    /// No rendering engine could be used.
    RendererUnavailable(String),
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::Challenge => write!(f, "bot challenge served"),
            BlockReason::Status(status) => write!(f, "HTTP status {status}"),
            BlockReason::Malformed(reason) => write!(f, "malformed response: {reason}"),
            BlockReason::RetriesExhausted(reason) => write!(f, "retries exhausted: {reason}"),
            BlockReason::Timeout => write!(f, "timed out"),
            BlockReason::RendererUnavailable(reason) => {
                write!(f, "renderer unavailable: {reason}")
            }
        }
    }
}

impl From<&ScraperError> for BlockReason {
    fn from(err: &ScraperError) -> Self {
        match err {
            ScraperError::Http(e) if e.is_timeout() => BlockReason::Timeout,
            ScraperError::Http(e) => BlockReason::RetriesExhausted(e.to_string()),
            ScraperError::RateLimited { .. } => BlockReason::Status(429),
            ScraperError::UnexpectedStatus { status, .. } => BlockReason::Status(*status),
            ScraperError::Deserialize { source, .. } => BlockReason::Malformed(source.to_string()),
            ScraperError::InvalidUrl { reason, .. } => BlockReason::Malformed(reason.clone()),
            ScraperError::RendererUnavailable(reason) | ScraperError::InvalidDisguise(reason) => {
                BlockReason::RendererUnavailable(reason.clone())
            }
            ScraperError::Render { reason, .. } => BlockReason::RetriesExhausted(reason.clone()),
        }
    }
}

/// Outcome of a detail lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetailLookup {
    Found(ProductDetail),
    /// The product page does not exist (delisted or wrong URL).
    NotFound,
    /// Every method was blocked or failed; the product may still exist.
    Unavailable { reason: String },
}

/// Where a search's products came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    Cache,
    Network,
}

/// Why the page loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A method reported an empty page.
    EndOfResults,
    /// Every page in the budget was fetched.
    BudgetExhausted,
    /// Enough filter-passing items were collected to answer without caching.
    EnoughResults,
    /// The rendering fallback was blocked as well.
    AllMethodsBlocked,
    /// Served from the cache; no page was fetched.
    CacheHit,
}

/// How a network search went. Returned alongside the products so callers can
/// tell "no matches" from "could not fetch".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub pages_attempted: u32,
    /// Method in use when the loop stopped.
    pub final_method: FetchMethod,
    /// Page on which the search switched to rendering, if it did.
    pub switched_at_page: Option<u32>,
    pub stop: StopReason,
    /// Last block observed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_block: Option<BlockReason>,
}

impl FetchReport {
    #[must_use]
    pub fn cache_hit() -> Self {
        Self {
            pages_attempted: 0,
            final_method: FetchMethod::Structured,
            switched_at_page: None,
            stop: StopReason::CacheHit,
            last_block: None,
        }
    }
}

/// Ranked, filtered, truncated products plus diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub products: Vec<ProductSummary>,
    pub origin: ResultOrigin,
    pub report: FetchReport,
}

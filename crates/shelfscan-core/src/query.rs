//! Search input and its resolution into an executable plan.
//!
//! A [`SearchQuery`] is what callers build. Before anything touches the
//! network it is validated and resolved into a [`ResolvedQuery`]: cheapest
//! intent is detected from the text, page budgets are filled in from
//! configuration, and cheapest mode overrides both the budget and the result
//! count.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_PAGE_BUDGET: u32 = 5;
pub const CHEAPEST_PAGE_BUDGET: u32 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("search text must not be empty")]
    EmptyText,

    #[error("max_price must be positive, got {0}")]
    NonPositiveMaxPrice(Decimal),

    #[error("max_results must be at least 1")]
    ZeroMaxResults,

    #[error("page_budget must be at least 1")]
    ZeroPageBudget,

    #[error("invalid category slug \"{0}\": use letters, digits, '-' or '_'")]
    InvalidCategory(String),
}

/// Caller-facing search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub max_price: Option<Decimal>,
    pub max_results: usize,
    /// `None` uses the configured default budget.
    pub page_budget: Option<u32>,
    pub category: Option<String>,
    /// Explicit cheapest request. Also switched on when the text carries a
    /// cheapest-intent marker.
    pub cheapest: bool,
}

impl SearchQuery {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_price: None,
            max_results: DEFAULT_MAX_RESULTS,
            page_budget: None,
            category: None,
            cheapest: false,
        }
    }

    #[must_use]
    pub fn with_max_price(mut self, max_price: Decimal) -> Self {
        self.max_price = Some(max_price);
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn with_page_budget(mut self, page_budget: u32) -> Self {
        self.page_budget = Some(page_budget);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn cheapest(mut self) -> Self {
        self.cheapest = true;
        self
    }

    /// Validates the query and applies cheapest-mode and budget defaults.
    ///
    /// `markers` are the cheapest-intent phrases; a marker matches when its
    /// words appear consecutively as whole words in the text, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the text is blank, a numeric bound is not
    /// positive, or the category is not a plain slug.
    pub fn resolve(
        &self,
        markers: &[String],
        default_page_budget: u32,
        cheapest_page_budget: u32,
    ) -> Result<ResolvedQuery, QueryError> {
        let text = self.text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(QueryError::EmptyText);
        }

        if let Some(max_price) = self.max_price {
            if max_price <= Decimal::ZERO {
                return Err(QueryError::NonPositiveMaxPrice(max_price));
            }
        }

        if self.max_results == 0 {
            return Err(QueryError::ZeroMaxResults);
        }

        if self.page_budget == Some(0) {
            return Err(QueryError::ZeroPageBudget);
        }

        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(slug) if is_slug(slug) => Some(slug.to_lowercase()),
            Some(slug) => return Err(QueryError::InvalidCategory(slug.to_owned())),
        };

        let cheapest = self.cheapest || has_cheapest_intent(&text, markers);
        let (page_budget, max_results) = if cheapest {
            (cheapest_page_budget.max(1), 1)
        } else {
            (
                self.page_budget.unwrap_or(default_page_budget).max(1),
                self.max_results,
            )
        };

        Ok(ResolvedQuery {
            text,
            max_price: self.max_price,
            max_results,
            page_budget,
            category,
            cheapest,
        })
    }
}

/// A validated query with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// Trimmed text with internal whitespace collapsed.
    pub text: String,
    pub max_price: Option<Decimal>,
    /// Always 1 in cheapest mode.
    pub max_results: usize,
    pub page_budget: u32,
    /// Lowercased category slug.
    pub category: Option<String>,
    pub cheapest: bool,
}

fn is_slug(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Returns `true` when any marker phrase occurs in `text` as whole words.
#[must_use]
pub fn has_cheapest_intent(text: &str, markers: &[String]) -> bool {
    let text_words = words(text);
    markers.iter().any(|marker| {
        let marker_words = words(marker);
        !marker_words.is_empty()
            && text_words
                .windows(marker_words.len())
                .any(|window| window == marker_words.as_slice())
    })
}

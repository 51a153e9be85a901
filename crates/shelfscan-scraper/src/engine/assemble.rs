//! Pure result assembly: deduplication, price filter, cheapest ordering and
//! truncation. Runs identically on cached and freshly fetched sets.

use std::cmp::Ordering;
use std::collections::HashSet;

use shelfscan_core::{ProductSummary, ResolvedQuery, UnknownPricePolicy};

/// Items in discovery order with duplicate URLs dropped (first one wins).
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    seen: HashSet<String>,
    items: Vec<ProductSummary>,
}

impl Accumulator {
    /// Appends unseen items and returns how many were new.
    pub(crate) fn extend(&mut self, products: impl IntoIterator<Item = ProductSummary>) -> usize {
        let before = self.items.len();
        for product in products {
            if self.seen.insert(product.url.clone()) {
                self.items.push(product);
            }
        }
        self.items.len() - before
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn count_passing(&self, query: &ResolvedQuery, policy: UnknownPricePolicy) -> usize {
        self.items
            .iter()
            .filter(|p| passes_price_filter(p, query, policy))
            .count()
    }

    pub(crate) fn into_items(self) -> Vec<ProductSummary> {
        self.items
    }
}

/// `max_price` applies outside cheapest mode only. Known prices above the
/// bound fail; unknown prices follow `policy`.
pub(crate) fn passes_price_filter(
    product: &ProductSummary,
    query: &ResolvedQuery,
    policy: UnknownPricePolicy,
) -> bool {
    if query.cheapest {
        return true;
    }
    let Some(max_price) = query.max_price else {
        return true;
    };
    match product.price {
        Some(price) => price <= max_price,
        None => policy == UnknownPricePolicy::Keep,
    }
}

/// Ascending by price; unknown prices after every known one. Stable, so
/// equal prices keep discovery order.
fn cheapest_first(a: &ProductSummary, b: &ProductSummary) -> Ordering {
    match (a.price, b.price) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Drops items failing the price filter and any repeated URL.
pub(crate) fn retain_matching(
    products: Vec<ProductSummary>,
    query: &ResolvedQuery,
    policy: UnknownPricePolicy,
) -> Vec<ProductSummary> {
    let mut acc = Accumulator::default();
    acc.extend(
        products
            .into_iter()
            .filter(|p| passes_price_filter(p, query, policy)),
    );
    acc.into_items()
}

/// Filter, order and truncate a deduplicated set into the caller's answer.
pub(crate) fn finalize(
    products: Vec<ProductSummary>,
    query: &ResolvedQuery,
    policy: UnknownPricePolicy,
) -> Vec<ProductSummary> {
    let mut products = retain_matching(products, query, policy);
    if query.cheapest {
        products.sort_by(cheapest_first);
    }
    products.truncate(query.max_results);
    products
}

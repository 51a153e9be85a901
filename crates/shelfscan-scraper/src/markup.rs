//! Extraction from rendered listing pages and product pages.
//!
//! Selector lists are tried in order and the first one that matches wins, so
//! minor markup changes degrade to a coarser selector instead of to nothing.
//! `scraper::Html` is not `Send`; these functions are synchronous and must be
//! called without holding the document across an `.await`.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::normalize::{RawDetail, RawListing};

/// Marker the listing page shows once results have materialised.
pub const LISTING_READY_SELECTOR: &str = r#"[data-qa-locator="product-item"]"#;

/// Marker a product page shows once its main block has rendered.
pub const DETAIL_READY_SELECTOR: &str = "h1";

/// Items taken from one rendered listing page.
pub const MAX_ITEMS_PER_PAGE: usize = 40;

/// Specification lines kept from one product page.
pub const MAX_SPECIFICATIONS: usize = 10;

fn compile(list: &[&str]) -> Vec<Selector> {
    list.iter().filter_map(|s| Selector::parse(s).ok()).collect()
}

static ITEM_CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile(&[
        LISTING_READY_SELECTOR,
        ".gridItem",
        ".product-item",
        r#"[class*="product"]"#,
    ])
});
static ITEM_NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(&["[title]", "a"]));
static ITEM_LINK: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(&["a[href]"]));
static PRICE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(&[r#"[class*="price"]"#, ".currency"]));
static ORIGINAL_PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile(&[
        "del",
        r#"[class*="origPrice"]"#,
        r#"[class*="original-price"]"#,
    ])
});
static STOCK: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(&[r#"[class*="stock"]"#]));

static TITLE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(&["h1", r#"[class*="title"]"#]));
static RATING: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(&[r#"[class*="rating"]"#, r#"[class*="star"]"#]));
static SELLER: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(&[r#"[class*="seller"]"#, r#"[class*="shop"]"#]));
static SPECIFICATIONS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(&[r#"[class*="spec"]"#, ".key-features li"]));

fn text_of(el: ElementRef<'_>) -> Option<String> {
    let text = el.text().collect::<Vec<_>>().join(" ");
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Text of the first element matched by the first selector that yields any.
fn first_text_in(scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .find_map(|sel| scope.select(sel).find_map(text_of))
}

fn item_name(item: ElementRef<'_>) -> Option<String> {
    ITEM_NAME.iter().find_map(|sel| {
        item.select(sel).find_map(|el| {
            el.value()
                .attr("title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .or_else(|| text_of(el))
        })
    })
}

fn item_link(item: ElementRef<'_>) -> Option<String> {
    if item.value().name() == "a" {
        if let Some(href) = item.value().attr("href") {
            return Some(href.to_owned());
        }
    }
    ITEM_LINK
        .iter()
        .find_map(|sel| item.select(sel).find_map(|el| el.value().attr("href")))
        .map(str::to_owned)
}

fn extract_item(item: ElementRef<'_>) -> RawListing {
    RawListing {
        name: item_name(item),
        price: first_text_in(item, &PRICE),
        original_price: first_text_in(item, &ORIGINAL_PRICE),
        url: item_link(item),
        stock: first_text_in(item, &STOCK),
    }
}

/// Extracts up to [`MAX_ITEMS_PER_PAGE`] listings from a rendered search page.
///
/// A match counts as an item only if it carries a link and is not nested in
/// another match of the same selector; the cap applies after that filter. An
/// empty vector means no container selector produced an item.
#[must_use]
pub fn extract_listings(html: &str) -> Vec<RawListing> {
    let document = Html::parse_document(html);

    for selector in ITEM_CONTAINERS.iter() {
        let matched: Vec<ElementRef<'_>> = document.select(selector).collect();
        let ids: HashSet<_> = matched.iter().map(|el| el.id()).collect();

        let items: Vec<RawListing> = matched
            .into_iter()
            .filter(|el| !el.ancestors().any(|node| ids.contains(&node.id())))
            .map(extract_item)
            .filter(|item| item.url.is_some())
            .take(MAX_ITEMS_PER_PAGE)
            .collect();
        if !items.is_empty() {
            tracing::debug!(count = items.len(), "listing containers matched");
            return items;
        }
    }

    Vec::new()
}

/// Extracts the fields of a product page.
#[must_use]
pub fn extract_detail(html: &str) -> RawDetail {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let specifications = SPECIFICATIONS
        .iter()
        .map(|sel| {
            root.select(sel)
                .filter_map(text_of)
                .take(MAX_SPECIFICATIONS)
                .collect::<Vec<_>>()
        })
        .find(|specs| !specs.is_empty())
        .unwrap_or_default();

    RawDetail {
        title: first_text_in(root, &TITLE),
        price: first_text_in(root, &PRICE),
        rating: first_text_in(root, &RATING),
        seller: first_text_in(root, &SELLER),
        specifications,
    }
}

//! Shared fixtures for the engine integration tests: a configuration with
//! pacing and backoff zeroed, a catalog profile pointed at a `wiremock`
//! server, listing JSON builders, and a scripted in-process renderer.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use shelfscan_core::{AppConfig, CacheMode, CatalogProfile, SearchCache, UnknownPricePolicy};
use shelfscan_scraper::{PageRenderer, ScraperError, SearchEngine};

pub fn test_config() -> AppConfig {
    AppConfig {
        log_level: "debug".to_owned(),
        catalog_path: None,
        request_timeout_secs: 5,
        max_retries: 0,
        retry_backoff_base_ms: 0,
        pace_min_ms: 0,
        pace_max_ms: 0,
        render_timeout_secs: 5,
        render_slots: 1,
        default_page_budget: 5,
        cheapest_page_budget: 15,
        cache_mode: CacheMode::Memory,
        cache_database_url: "sqlite::memory:".to_owned(),
        cache_expiry_secs: 10_800,
        unknown_price_policy: UnknownPricePolicy::Keep,
    }
}

pub fn test_catalog(base_url: &str) -> CatalogProfile {
    CatalogProfile {
        name: "test".to_owned(),
        base_url: base_url.to_owned(),
        ..CatalogProfile::default()
    }
}

pub fn engine(
    base_url: &str,
    config: &AppConfig,
    renderer: Arc<dyn PageRenderer>,
    cache: Arc<dyn SearchCache>,
) -> SearchEngine {
    SearchEngine::from_config(config, &test_catalog(base_url), renderer, cache)
        .expect("failed to build test SearchEngine")
}

/// One structured listing item; `price` of `None` omits every price field.
pub fn item_json(id: u32, price: Option<u32>) -> Value {
    let mut item = json!({
        "name": format!("Structured Item {id}"),
        "itemUrl": format!("/products/item-i{id}.html"),
        "inStock": true,
    });
    if let Some(price) = price {
        item["priceShow"] = json!(format!("Rs. {price}"));
    }
    item
}

pub fn listing_json(items: Vec<Value>) -> Value {
    json!({ "mods": { "listItems": items } })
}

pub fn empty_listing_json() -> Value {
    listing_json(Vec::new())
}

pub fn challenge_json() -> Value {
    json!({
        "rgv587_flag": "sm",
        "url": "/punish?x5secdata=abc123"
    })
}

/// Renderer that serves scripted markup per `page` query value and records
/// every URL it was asked to load.
#[derive(Default)]
pub struct ScriptedRenderer {
    pages: HashMap<u32, String>,
    /// Served for URLs without a `page` parameter (product pages).
    fallback: Option<String>,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedRenderer {
    /// Pages `1..=pages` each get `per_page` products priced by `price_of`.
    pub fn with_listings(pages: u32, per_page: u32, price_of: impl Fn(u32, u32) -> u32) -> Self {
        let pages = (1..=pages)
            .map(|page| {
                let items: String = (1..=per_page)
                    .map(|n| {
                        format!(
                            r#"<div data-qa-locator="product-item">
  <a href="/products/rendered-{page}-{n}.html" title="Rendered {page}-{n}">x</a>
  <span class="price">Rs. {}</span>
</div>"#,
                            price_of(page, n)
                        )
                    })
                    .collect();
                (page, format!("<html><body>{items}</body></html>"))
            })
            .collect();
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn with_page_markup(markup: &str) -> Self {
        Self {
            fallback: Some(markup.to_owned()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rendered_pages(&self) -> Vec<u32> {
        self.calls()
            .iter()
            .filter_map(|u| {
                u.query_pairs()
                    .find(|(k, _)| k == "page")
                    .and_then(|(_, v)| v.parse().ok())
            })
            .collect()
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn render(
        &self,
        url: &Url,
        _user_agent: &str,
        _ready_selector: &str,
    ) -> Result<String, ScraperError> {
        self.calls.lock().unwrap().push(url.clone());
        let page: Option<u32> = url
            .query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok());
        let markup = match page {
            Some(page) => self.pages.get(&page).cloned(),
            None => self.fallback.clone(),
        };
        Ok(markup.unwrap_or_else(|| "<html><body><p>No results</p></body></html>".to_owned()))
    }
}

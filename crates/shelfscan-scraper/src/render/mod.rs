//! Rendering fallback: full page loads through a headless browser.
//!
//! The engine itself sits behind [`PageRenderer`] so the search engine never
//! depends on a particular browser. [`RenderedClient`] adds the same identity
//! and pacing discipline as the structured client, bounds every attempt with
//! a timeout, and limits concurrent page loads with a semaphore.

#[cfg(feature = "browser")]
mod chromium;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::Semaphore;

use crate::client::CatalogSite;
use crate::disguise::Disguise;
use crate::error::ScraperError;
use crate::markup::{extract_detail, extract_listings, DETAIL_READY_SELECTOR, LISTING_READY_SELECTOR};
use crate::normalize::{RawDetail, RawListing};
use crate::outcome::{BlockReason, FetchOutcome};

#[cfg(feature = "browser")]
pub use chromium::ChromiumRenderer;

/// Loads a page in a rendering engine and returns its final markup.
///
/// Implementations wait for `ready_selector` to appear (best effort) before
/// reading the markup. They must release whatever tab or context they opened
/// even when the returned future is dropped mid-flight.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(
        &self,
        url: &Url,
        user_agent: &str,
        ready_selector: &str,
    ) -> Result<String, ScraperError>;
}

/// Renderer for builds or deployments without a browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRenderer;

#[async_trait]
impl PageRenderer for DisabledRenderer {
    async fn render(
        &self,
        _url: &Url,
        _user_agent: &str,
        _ready_selector: &str,
    ) -> Result<String, ScraperError> {
        Err(ScraperError::RendererUnavailable(
            "no rendering engine configured".to_owned(),
        ))
    }
}

/// Listing and product-page client backed by a [`PageRenderer`].
pub struct RenderedClient {
    renderer: Arc<dyn PageRenderer>,
    site: Arc<CatalogSite>,
    disguise: Arc<Disguise>,
    slots: Arc<Semaphore>,
    timeout: Duration,
}

impl RenderedClient {
    /// `slots` is the number of page loads allowed at once across every
    /// search sharing this client; it is raised to 1 if zero.
    #[must_use]
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        site: Arc<CatalogSite>,
        disguise: Arc<Disguise>,
        slots: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            renderer,
            site,
            disguise,
            slots: Arc::new(Semaphore::new(slots.max(1))),
            timeout,
        }
    }

    /// Renders one listing page and extracts its items.
    ///
    /// A page with no item containers is `Empty` unless it carries a
    /// challenge marker.
    pub async fn fetch(
        &self,
        query_text: &str,
        page: u32,
        category: Option<&str>,
    ) -> FetchOutcome<Vec<RawListing>> {
        let url = match self.site.rendered_listing_url(query_text, page, category) {
            Ok(url) => url,
            Err(e) => return FetchOutcome::Blocked(BlockReason::from(&e)),
        };

        let html = match self.render(&url, LISTING_READY_SELECTOR).await {
            Ok(html) => html,
            Err(reason) => {
                tracing::warn!(page, url = %url, %reason, "rendered listing failed");
                return FetchOutcome::Blocked(reason);
            }
        };

        let items = extract_listings(&html);
        if !items.is_empty() {
            return FetchOutcome::Found(items);
        }
        if self.site.is_challenge(&html, None) {
            tracing::warn!(page, url = %url, "rendered listing served a challenge");
            return FetchOutcome::Blocked(BlockReason::Challenge);
        }
        FetchOutcome::Empty
    }

    /// Renders a product page. `Empty` means the product does not exist.
    pub async fn fetch_detail(&self, url: &Url) -> FetchOutcome<RawDetail> {
        let html = match self.render(url, DETAIL_READY_SELECTOR).await {
            Ok(html) => html,
            Err(reason) => {
                tracing::warn!(url = %url, %reason, "rendered product page failed");
                return FetchOutcome::Blocked(reason);
            }
        };

        let detail = extract_detail(&html);
        if self.site.is_product_title(detail.title.as_deref()) {
            return FetchOutcome::Found(detail);
        }
        if self.site.is_not_found(&html) {
            return FetchOutcome::Empty;
        }
        if self.site.is_challenge(&html, None) {
            FetchOutcome::Blocked(BlockReason::Challenge)
        } else {
            FetchOutcome::Blocked(BlockReason::Malformed(
                "rendered product page has no title".to_owned(),
            ))
        }
    }

    /// Checks out a render slot for the duration of the load, paces, and
    /// bounds the load with the configured timeout. The slot is returned when
    /// the permit drops, whichever way this returns.
    async fn render(&self, url: &Url, ready_selector: &str) -> Result<String, BlockReason> {
        let _permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| BlockReason::RendererUnavailable("render slots closed".to_owned()))?;
        // Pace while holding the slot so a queued load still gets its gap.
        self.disguise.pace().await;

        let identity = self.disguise.next_identity();
        tracing::info!(url = %url, "rendering page");
        match tokio::time::timeout(
            self.timeout,
            self.renderer
                .render(url, &identity.user_agent, ready_selector),
        )
        .await
        {
            Err(_) => Err(BlockReason::Timeout),
            Ok(Err(e)) => Err(BlockReason::from(&e)),
            Ok(Ok(html)) => Ok(html),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use shelfscan_core::CatalogProfile;

    use super::*;

    struct SlowRenderer {
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl PageRenderer for SlowRenderer {
        async fn render(
            &self,
            _url: &Url,
            _user_agent: &str,
            _ready_selector: &str,
        ) -> Result<String, ScraperError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(r#"<div class="gridItem"><a href="/p/1.html" title="One">One</a></div>"#.to_owned())
        }
    }

    fn paced_client(
        renderer: Arc<dyn PageRenderer>,
        slots: usize,
        timeout: Duration,
        pace_ms: u64,
    ) -> RenderedClient {
        let profile = CatalogProfile::default();
        let site = Arc::new(CatalogSite::from_profile(&profile).unwrap());
        let disguise = Arc::new(
            Disguise::new(
                profile.user_agents.clone(),
                "https://www.daraz.pk/",
                pace_ms,
                pace_ms,
            )
            .unwrap(),
        );
        RenderedClient::new(renderer, site, disguise, slots, timeout)
    }

    fn client(renderer: Arc<dyn PageRenderer>, slots: usize, timeout: Duration) -> RenderedClient {
        paced_client(renderer, slots, timeout, 0)
    }

    struct FixedPage(&'static str);

    #[async_trait]
    impl PageRenderer for FixedPage {
        async fn render(&self, _: &Url, _: &str, _: &str) -> Result<String, ScraperError> {
            Ok(self.0.to_owned())
        }
    }

    #[tokio::test]
    async fn disabled_renderer_reports_unavailable() {
        let client = client(Arc::new(DisabledRenderer), 1, Duration::from_secs(1));
        let outcome = client.fetch("mouse", 1, None).await;
        assert!(matches!(
            outcome,
            FetchOutcome::Blocked(BlockReason::RendererUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn slow_render_times_out_and_releases_slot() {
        let renderer = Arc::new(SlowRenderer {
            delay: Duration::from_millis(500),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let client = client(renderer, 1, Duration::from_millis(20));

        let first = client.fetch("mouse", 1, None).await;
        assert!(matches!(first, FetchOutcome::Blocked(BlockReason::Timeout)));

        // The slot must be free again; a second timeout proves it was acquired.
        let second = client.fetch("mouse", 2, None).await;
        assert!(matches!(second, FetchOutcome::Blocked(BlockReason::Timeout)));
    }

    #[tokio::test]
    async fn slots_bound_concurrent_renders() {
        let renderer = Arc::new(SlowRenderer {
            delay: Duration::from_millis(30),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let client = Arc::new(client(
            Arc::clone(&renderer) as Arc<dyn PageRenderer>,
            2,
            Duration::from_secs(5),
        ));

        let handles: Vec<_> = (1..=6)
            .map(|page| {
                let client = Arc::clone(&client);
                tokio::spawn(async move { client.fetch("mouse", page, None).await })
            })
            .collect();
        for handle in handles {
            assert!(matches!(handle.await.unwrap(), FetchOutcome::Found(_)));
        }
        assert!(renderer.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn page_without_items_or_challenge_is_empty() {
        struct Blank;
        #[async_trait]
        impl PageRenderer for Blank {
            async fn render(&self, _: &Url, _: &str, _: &str) -> Result<String, ScraperError> {
                Ok("<html><body>No results</body></html>".to_owned())
            }
        }
        let client = client(Arc::new(Blank), 1, Duration::from_secs(1));
        assert!(matches!(
            client.fetch("zzzz", 1, None).await,
            FetchOutcome::Empty
        ));
    }

    #[tokio::test]
    async fn queued_render_still_waits_its_pace() {
        struct StampingRenderer {
            starts: std::sync::Mutex<Vec<tokio::time::Instant>>,
        }
        #[async_trait]
        impl PageRenderer for StampingRenderer {
            async fn render(&self, _: &Url, _: &str, _: &str) -> Result<String, ScraperError> {
                self.starts.lock().unwrap().push(tokio::time::Instant::now());
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(r#"<div class="gridItem"><a href="/p/1.html">One</a></div>"#.to_owned())
            }
        }

        let renderer = Arc::new(StampingRenderer {
            starts: std::sync::Mutex::new(Vec::new()),
        });
        let client = Arc::new(paced_client(
            Arc::clone(&renderer) as Arc<dyn PageRenderer>,
            1,
            Duration::from_secs(5),
            50,
        ));

        let first = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.fetch("mouse", 1, None).await }
        });
        let second = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.fetch("mouse", 2, None).await }
        });
        first.await.unwrap();
        second.await.unwrap();

        let starts = renderer.starts.lock().unwrap().clone();
        assert_eq!(starts.len(), 2);
        let gap = starts[1].duration_since(starts[0]);
        // One full load (30 ms) plus the second load's own pace (50 ms).
        assert!(gap >= Duration::from_millis(80), "gap was {gap:?}");
    }

    #[tokio::test]
    async fn titled_product_page_with_marker_text_is_found() {
        let client = client(
            Arc::new(FixedPage(
                r#"<html><body>
                  <h1>Anker PowerCore 10000</h1>
                  <p class="variant-note">Black: this product is not available</p>
                  <script>var i18n = {"404": "Page Not Found"};</script>
                </body></html>"#,
            )),
            1,
            Duration::from_secs(1),
        );
        let url = Url::parse("https://www.daraz.pk/products/anker-i1.html").unwrap();
        let FetchOutcome::Found(detail) = client.fetch_detail(&url).await else {
            panic!("expected Found");
        };
        assert_eq!(detail.title.as_deref(), Some("Anker PowerCore 10000"));
    }

    #[tokio::test]
    async fn untitled_product_page_with_marker_is_empty() {
        let client = client(
            Arc::new(FixedPage(
                "<html><body><p>This product is no longer available</p></body></html>",
            )),
            1,
            Duration::from_secs(1),
        );
        let url = Url::parse("https://www.daraz.pk/products/gone-i2.html").unwrap();
        assert!(matches!(client.fetch_detail(&url).await, FetchOutcome::Empty));
    }
}

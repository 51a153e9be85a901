//! Headless Chromium renderer (`browser` feature).
//!
//! One browser process is launched on first use and shared; each render
//! opens its own tab, and [`TabGuard`] closes that tab on every exit path,
//! including a dropped future after a timeout.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use reqwest::Url;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::error::ScraperError;

use super::PageRenderer;

/// How long to poll for the ready selector before reading whatever rendered.
const READY_WAIT: Duration = Duration::from_secs(10);
const READY_POLL: Duration = Duration::from_millis(250);

const LAUNCH_ARGS: [&str; 5] = [
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-extensions",
    "--window-size=1366,900",
];

struct LaunchedBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for LaunchedBrowser {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// [`PageRenderer`] driving a lazily launched headless Chromium.
#[derive(Default)]
pub struct ChromiumRenderer {
    launched: OnceCell<LaunchedBrowser>,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn browser(&self) -> Result<&Browser, ScraperError> {
        let launched = self
            .launched
            .get_or_try_init(|| async {
                let config = BrowserConfig::builder()
                    .no_sandbox()
                    .args(LAUNCH_ARGS)
                    .build()
                    .map_err(ScraperError::RendererUnavailable)?;
                let (browser, mut handler) = Browser::launch(config)
                    .await
                    .map_err(|e| ScraperError::RendererUnavailable(e.to_string()))?;
                let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
                tracing::info!("headless browser launched");
                Ok::<_, ScraperError>(LaunchedBrowser { browser, handler })
            })
            .await?;
        Ok(&launched.browser)
    }
}

/// Closes the wrapped tab when dropped unless it was closed explicitly.
struct TabGuard(Option<Page>);

impl TabGuard {
    fn page(&self) -> Option<&Page> {
        self.0.as_ref()
    }

    async fn close(mut self) {
        if let Some(page) = self.0.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "closing tab failed");
            }
        }
    }
}

impl Drop for TabGuard {
    fn drop(&mut self) {
        if let Some(page) = self.0.take() {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    let _ = page.close().await;
                });
            }
        }
    }
}

fn render_error(url: &Url, e: &impl std::fmt::Display) -> ScraperError {
    ScraperError::Render {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(
        &self,
        url: &Url,
        user_agent: &str,
        ready_selector: &str,
    ) -> Result<String, ScraperError> {
        let browser = self.browser().await?;
        let guard = TabGuard(Some(
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| render_error(url, &e))?,
        ));
        let Some(page) = guard.page() else {
            return Err(render_error(url, &"tab closed before use"));
        };

        page.set_user_agent(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(|e| render_error(url, &e))?;
        page.goto(url.as_str())
            .await
            .map_err(|e| render_error(url, &e))?;

        let deadline = tokio::time::Instant::now() + READY_WAIT;
        while page.find_element(ready_selector).await.is_err() {
            if tokio::time::Instant::now() >= deadline {
                tracing::debug!(url = %url, ready_selector, "ready selector never appeared");
                break;
            }
            tokio::time::sleep(READY_POLL).await;
        }

        let html = page.content().await.map_err(|e| render_error(url, &e))?;
        guard.close().await;
        Ok(html)
    }
}

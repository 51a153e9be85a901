//! Per-request identity and inter-request pacing.
//!
//! Every outbound request, structured or rendered, draws a fresh
//! [`Identity`] and waits one [`Disguise::pace`] interval first. Nothing is
//! remembered between calls apart from the pool itself.

use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, REFERER};
use shelfscan_core::catalog::MIN_USER_AGENTS;

use crate::error::ScraperError;

/// The identity presented on one request.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_agent: String,
    /// Browser-like headers other than `User-Agent`.
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub struct Disguise {
    user_agents: Vec<String>,
    referer: HeaderValue,
    pace_min_ms: u64,
    pace_max_ms: u64,
}

impl Disguise {
    /// Builds a disguise from a user-agent pool, the referrer sent with every
    /// request, and the pacing interval in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidDisguise`] when the pool has fewer than
    /// [`MIN_USER_AGENTS`] entries, the referrer is not a valid header value,
    /// or `pace_min_ms > pace_max_ms`.
    pub fn new(
        user_agents: Vec<String>,
        referer: &str,
        pace_min_ms: u64,
        pace_max_ms: u64,
    ) -> Result<Self, ScraperError> {
        if user_agents.len() < MIN_USER_AGENTS {
            return Err(ScraperError::InvalidDisguise(format!(
                "user-agent pool has {} entries, need at least {MIN_USER_AGENTS}",
                user_agents.len()
            )));
        }
        if pace_min_ms > pace_max_ms {
            return Err(ScraperError::InvalidDisguise(format!(
                "pace interval {pace_min_ms}..{pace_max_ms} ms is inverted"
            )));
        }
        let referer = HeaderValue::from_str(referer)
            .map_err(|e| ScraperError::InvalidDisguise(format!("referer \"{referer}\": {e}")))?;

        Ok(Self {
            user_agents,
            referer,
            pace_min_ms,
            pace_max_ms,
        })
    }

    /// Picks a user agent uniformly from the pool and pairs it with the
    /// standard header set.
    #[must_use]
    pub fn next_identity(&self) -> Identity {
        let user_agent = self
            .user_agents
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_default();

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, text/html;q=0.9, */*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(REFERER, self.referer.clone());

        Identity {
            user_agent,
            headers,
        }
    }

    /// Uniformly random wait within the pacing interval.
    #[must_use]
    pub fn pace_delay(&self) -> Duration {
        if self.pace_min_ms == self.pace_max_ms {
            return Duration::from_millis(self.pace_min_ms);
        }
        Duration::from_millis(
            rand::rng().random_range(self.pace_min_ms..=self.pace_max_ms),
        )
    }

    /// Sleeps for one pacing interval. Call immediately before a request
    /// that actually goes to the network.
    pub async fn pace(&self) {
        let delay = self.pace_delay();
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis(), "pacing before request");
            tokio::time::sleep(delay).await;
        }
    }
}

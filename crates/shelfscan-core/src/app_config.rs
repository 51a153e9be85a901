use std::path::PathBuf;

/// Which freshness-cache backend the search engine runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Process-local map; lost on restart.
    Memory,
    /// SQLite-backed store that survives restarts.
    Sqlite,
    /// Every search goes to the network.
    Disabled,
}

impl std::fmt::Display for CacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheMode::Memory => write!(f, "memory"),
            CacheMode::Sqlite => write!(f, "sqlite"),
            CacheMode::Disabled => write!(f, "disabled"),
        }
    }
}

/// How the `max_price` filter treats items whose price is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPricePolicy {
    /// Unknown prices pass the filter.
    #[default]
    Keep,
    /// Unknown prices are dropped whenever a `max_price` is set.
    Exclude,
}

impl std::fmt::Display for UnknownPricePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnknownPricePolicy::Keep => write!(f, "keep"),
            UnknownPricePolicy::Exclude => write!(f, "exclude"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// YAML catalog profile; the built-in profile is used when `None`.
    pub catalog_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub pace_min_ms: u64,
    pub pace_max_ms: u64,
    pub render_timeout_secs: u64,
    pub render_slots: usize,
    pub default_page_budget: u32,
    pub cheapest_page_budget: u32,
    pub cache_mode: CacheMode,
    pub cache_database_url: String,
    pub cache_expiry_secs: u64,
    pub unknown_price_policy: UnknownPricePolicy,
}

impl AppConfig {
    /// Freshness window as a `chrono` duration, saturating at `i64::MAX` seconds.
    #[must_use]
    pub fn cache_expiry(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(i64::try_from(self.cache_expiry_secs).unwrap_or(i64::MAX))
            .unwrap_or(chrono::Duration::MAX)
    }
}

pub mod app_config;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod products;
pub mod query;

use thiserror::Error;

pub use app_config::{AppConfig, CacheMode, UnknownPricePolicy};
pub use cache::{CacheEntry, CacheError, DisabledCache, Fingerprint, MemoryCache, SearchCache};
pub use catalog::{load_catalog, CatalogProfile};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{FetchMethod, ProductDetail, ProductSummary, StockStatus};
pub use query::{QueryError, ResolvedQuery, SearchQuery};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog profile at {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog profile: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog profile validation failed: {0}")]
    Validation(String),
}

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Minimum size of the user-agent pool; a smaller pool makes every request
/// look like the same client.
pub const MIN_USER_AGENTS: usize = 5;

const DEFAULT_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Everything the scraper needs to know about the one catalog it talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProfile {
    pub name: String,
    /// Scheme + host of the catalog, e.g. `"https://www.daraz.pk"`.
    pub base_url: String,
    /// Path of the search listing, used when no category is given.
    #[serde(default = "default_search_path")]
    pub search_path: String,
    pub user_agents: Vec<String>,
    #[serde(default = "default_cheapest_markers")]
    pub cheapest_markers: Vec<String>,
    /// Case-insensitive substrings that identify a bot challenge in a body.
    #[serde(default = "default_challenge_markers")]
    pub challenge_markers: Vec<String>,
    /// Case-insensitive substrings that identify a delisted product page.
    #[serde(default = "default_not_found_markers")]
    pub not_found_markers: Vec<String>,
}

impl Default for CatalogProfile {
    fn default() -> Self {
        Self {
            name: "daraz".to_string(),
            base_url: "https://www.daraz.pk".to_string(),
            search_path: default_search_path(),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| (*s).to_string()).collect(),
            cheapest_markers: default_cheapest_markers(),
            challenge_markers: default_challenge_markers(),
            not_found_markers: default_not_found_markers(),
        }
    }
}

fn default_search_path() -> String {
    "/catalog/".to_string()
}

fn default_cheapest_markers() -> Vec<String> {
    vec![
        "cheapest".to_string(),
        "cheap".to_string(),
        "lowest price".to_string(),
    ]
}

fn default_challenge_markers() -> Vec<String> {
    vec![
        "captcha".to_string(),
        "rgv587_flag".to_string(),
        "x5secdata".to_string(),
        "/punish".to_string(),
    ]
}

fn default_not_found_markers() -> Vec<String> {
    vec![
        "page not found".to_string(),
        "product is no longer available".to_string(),
        "this product is not available".to_string(),
    ]
}

/// Load and validate a catalog profile from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogProfile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_catalog(&content)
}

/// Parse and validate a catalog profile from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text is not a valid profile.
pub fn parse_catalog(content: &str) -> Result<CatalogProfile, ConfigError> {
    let profile: CatalogProfile = serde_yaml::from_str(content)?;
    validate_catalog(&profile)?;
    Ok(profile)
}

fn validate_catalog(profile: &CatalogProfile) -> Result<(), ConfigError> {
    if profile.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "catalog name must be non-empty".to_string(),
        ));
    }

    let base = profile.base_url.trim();
    let has_host = base
        .strip_prefix("https://")
        .or_else(|| base.strip_prefix("http://"))
        .is_some_and(|rest| !rest.trim_matches('/').is_empty());
    if !has_host {
        return Err(ConfigError::Validation(format!(
            "catalog '{}' has invalid base_url '{}'; expected an absolute http(s) URL",
            profile.name, profile.base_url
        )));
    }

    if !profile.search_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "catalog '{}' search_path must start with '/'",
            profile.name
        )));
    }

    let mut seen = HashSet::new();
    for ua in &profile.user_agents {
        if ua.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user agent entries must be non-empty".to_string(),
            ));
        }
        seen.insert(ua.trim());
    }
    if seen.len() < MIN_USER_AGENTS {
        return Err(ConfigError::Validation(format!(
            "catalog '{}' needs at least {MIN_USER_AGENTS} distinct user agents, found {}",
            profile.name,
            seen.len()
        )));
    }

    Ok(())
}

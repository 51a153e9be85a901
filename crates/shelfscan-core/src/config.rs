use crate::app_config::{AppConfig, CacheMode, UnknownPricePolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let value = parse_u32(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let log_level = or_default("SHELFSCAN_LOG_LEVEL", "info");
    let catalog_path = lookup("SHELFSCAN_CATALOG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let request_timeout_secs = parse_u64("SHELFSCAN_REQUEST_TIMEOUT_SECS", "15")?;
    let max_retries = parse_u32("SHELFSCAN_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("SHELFSCAN_RETRY_BACKOFF_BASE_MS", "500")?;

    let pace_min_ms = parse_u64("SHELFSCAN_PACE_MIN_MS", "800")?;
    let pace_max_ms = parse_u64("SHELFSCAN_PACE_MAX_MS", "2500")?;
    if pace_min_ms > pace_max_ms {
        return Err(invalid(
            "SHELFSCAN_PACE_MIN_MS",
            format!("{pace_min_ms} exceeds SHELFSCAN_PACE_MAX_MS ({pace_max_ms})"),
        ));
    }

    let render_timeout_secs = parse_u64("SHELFSCAN_RENDER_TIMEOUT_SECS", "30")?;
    let render_slots = usize::try_from(parse_positive_u32("SHELFSCAN_RENDER_SLOTS", "1")?)
        .map_err(|e| invalid("SHELFSCAN_RENDER_SLOTS", e.to_string()))?;

    let default_page_budget = parse_positive_u32("SHELFSCAN_DEFAULT_PAGE_BUDGET", "5")?;
    let cheapest_page_budget = parse_positive_u32("SHELFSCAN_CHEAPEST_PAGE_BUDGET", "15")?;

    let cache_mode = parse_cache_mode(&or_default("SHELFSCAN_CACHE_MODE", "sqlite"))
        .map_err(|reason| invalid("SHELFSCAN_CACHE_MODE", reason))?;
    let cache_database_url = or_default(
        "SHELFSCAN_CACHE_DATABASE_URL",
        "sqlite://shelfscan-cache.db?mode=rwc",
    );
    let cache_expiry_secs = parse_u64("SHELFSCAN_CACHE_EXPIRY_SECS", "10800")?;

    let unknown_price_policy =
        parse_unknown_price_policy(&or_default("SHELFSCAN_UNKNOWN_PRICE_POLICY", "keep"))
            .map_err(|reason| invalid("SHELFSCAN_UNKNOWN_PRICE_POLICY", reason))?;

    Ok(AppConfig {
        log_level,
        catalog_path,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        pace_min_ms,
        pace_max_ms,
        render_timeout_secs,
        render_slots,
        default_page_budget,
        cheapest_page_budget,
        cache_mode,
        cache_database_url,
        cache_expiry_secs,
        unknown_price_policy,
    })
}

fn parse_cache_mode(s: &str) -> Result<CacheMode, String> {
    match s.trim().to_lowercase().as_str() {
        "memory" => Ok(CacheMode::Memory),
        "sqlite" => Ok(CacheMode::Sqlite),
        "disabled" | "off" | "none" => Ok(CacheMode::Disabled),
        other => Err(format!(
            "unknown cache mode '{other}'; expected memory, sqlite or disabled"
        )),
    }
}

fn parse_unknown_price_policy(s: &str) -> Result<UnknownPricePolicy, String> {
    match s.trim().to_lowercase().as_str() {
        "keep" => Ok(UnknownPricePolicy::Keep),
        "exclude" => Ok(UnknownPricePolicy::Exclude),
        other => Err(format!(
            "unknown price policy '{other}'; expected keep or exclude"
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

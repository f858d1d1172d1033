use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_LISTING_URL: &str = "https://www.ratemyprofessors.com/search/professors/1262?q=*";
pub const DEFAULT_UNIVERSITY: &str = "University of South Florida";
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
);

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
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let non_zero = |var: &str, value: u32| -> Result<u32, ConfigError> {
        if value == 0 {
            Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            })
        } else {
            Ok(value)
        }
    };

    let listing_url = or_default("PROFDB_LISTING_URL", DEFAULT_LISTING_URL);
    if !(listing_url.starts_with("http://") || listing_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "PROFDB_LISTING_URL".to_string(),
            reason: format!("\"{listing_url}\" is not an http(s) URL"),
        });
    }

    let university = or_default("PROFDB_UNIVERSITY", DEFAULT_UNIVERSITY);
    let webdriver_url = or_default("PROFDB_WEBDRIVER_URL", "http://localhost:9515");
    let user_agent = or_default("PROFDB_USER_AGENT", DEFAULT_USER_AGENT);
    let log_level = or_default("PROFDB_LOG_LEVEL", "info");
    let selectors_path = lookup("PROFDB_SELECTORS_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let request_timeout_secs = parse_u64("PROFDB_REQUEST_TIMEOUT_SECS", "30")?;
    let page_load_timeout_secs = parse_u64("PROFDB_PAGE_LOAD_TIMEOUT_SECS", "30")?;
    let retry_max_attempts = non_zero(
        "PROFDB_RETRY_MAX_ATTEMPTS",
        parse_u32("PROFDB_RETRY_MAX_ATTEMPTS", "3")?,
    )?;
    let retry_base_delay_ms = parse_u64("PROFDB_RETRY_BASE_DELAY_MS", "1000")?;
    let missing_element_wait_ms = parse_u64("PROFDB_MISSING_ELEMENT_WAIT_MS", "2000")?;
    let breaker_threshold = non_zero(
        "PROFDB_BREAKER_THRESHOLD",
        parse_u32("PROFDB_BREAKER_THRESHOLD", "3")?,
    )?;
    let listing_max_clicks = parse_u32("PROFDB_LISTING_MAX_CLICKS", "2000")?;
    let review_max_clicks = parse_u32("PROFDB_REVIEW_MAX_CLICKS", "100")?;

    Ok(AppConfig {
        listing_url,
        university,
        webdriver_url,
        user_agent,
        log_level,
        selectors_path,
        request_timeout_secs,
        page_load_timeout_secs,
        retry_max_attempts,
        retry_base_delay_ms,
        missing_element_wait_ms,
        breaker_threshold,
        listing_max_clicks,
        review_max_clicks,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

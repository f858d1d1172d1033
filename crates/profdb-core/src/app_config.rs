use std::path::PathBuf;

/// Process-wide settings read from the environment at start-up.
///
/// CLI flags (output paths, delay, headless, caps) live on the binary side;
/// this struct covers everything that is deployment configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listing_url: String,
    pub university: String,
    pub webdriver_url: String,
    pub user_agent: String,
    pub log_level: String,
    pub selectors_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub page_load_timeout_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub missing_element_wait_ms: u64,
    pub breaker_threshold: u32,
    pub listing_max_clicks: u32,
    pub review_max_clicks: u32,
}

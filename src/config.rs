use crate::pixometer_api::DEFAULT_BASE_URL;
use std::env;
use std::time::Duration;

pub const DEFAULT_SCAN_MINUTES: u64 = 59;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Settings for talking to Pixometer, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct PixometerConfig {
    pub username: String,
    pub password: String,
    pub base_url: String,
    /// Minimum time between two reading fetches.
    pub scan_interval: Duration,
    pub page_size: u32,
}

impl PixometerConfig {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            scan_interval: Duration::from_secs(DEFAULT_SCAN_MINUTES * 60),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let username = env::var("PIXOMETER_USERNAME").unwrap_or_default();
        let password = env::var("PIXOMETER_PASSWORD").unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            anyhow::bail!("PIXOMETER_USERNAME and PIXOMETER_PASSWORD are required");
        }

        let mut config = Self::new(&username, &password);
        if let Ok(base_url) = env::var("PIXOMETER_URL") {
            if !base_url.is_empty() {
                config.base_url = base_url;
            }
        }
        let scan_minutes = parse_or(env::var("PIXOMETER_SCAN_MINUTES").ok(), DEFAULT_SCAN_MINUTES);
        config.scan_interval = scan_interval_from_minutes(scan_minutes);
        config.page_size = parse_or(env::var("PIXOMETER_PAGE_SIZE").ok(), DEFAULT_PAGE_SIZE);

        Ok(config)
    }
}

/// Absurdly large minute counts saturate instead of overflowing
fn scan_interval_from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Parses an optional string, falling back to `default` when absent or invalid
fn parse_or<T: std::str::FromStr>(val: Option<String>, default: T) -> T {
    val.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

use log::{debug, warn};
use std::env;
use std::time::Duration;

pub const API_URL_VAR: &str = "API_URL";
pub const STALE_TIME_VAR: &str = "STALE_TIME_SECS";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);
const STATUS_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Settings shared by the gallery crates.
///
/// Only the store address and the cache staleness come from the
/// environment; the timer cadences are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryConfig {
    pub api_url: String,
    pub autosave_interval: Duration,
    pub status_refresh_interval: Duration,
    pub stale_time: Duration,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            autosave_interval: AUTOSAVE_INTERVAL,
            status_refresh_interval: STATUS_REFRESH_INTERVAL,
            stale_time: Duration::ZERO,
        }
    }
}

impl GalleryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_VAR) {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                warn!("{API_URL_VAR} is empty, using {DEFAULT_API_URL}");
            } else {
                config.api_url = url.to_string();
            }
        }

        if let Some(raw) = lookup(STALE_TIME_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.stale_time = Duration::from_secs(secs),
                Err(e) => warn!("Ignoring invalid {STALE_TIME_VAR}={raw:?}: {e}"),
            }
        }

        config
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

pub fn build_http_client(config: &GalleryConfig) -> reqwest::Result<reqwest::Client> {
    debug!("Building HTTP client for {}", config.api_url);
    reqwest::Client::builder()
        .user_agent(concat!("docgallery/", env!("CARGO_PKG_VERSION")))
        .build()
}

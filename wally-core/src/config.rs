//! Runtime configuration.
//!
//! Built once at startup and passed by reference into the pipeline;
//! there is no ambient global state.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_BASE_URL: &str = "https://apod.nasa.gov/apod/";
const DEFAULT_PAGE_URL: &str = "https://apod.nasa.gov/apod/astropix.html";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL that relative image hrefs are resolved against.
    pub base_url: Url,
    /// The daily page the fetcher scrapes.
    pub page_url: Url,
    /// Managed directory for downloaded images, sidecars, and marker files.
    pub download_dir: PathBuf,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
    /// When false, everything runs except the OS wallpaper call.
    pub set_wallpaper: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            page_url: Url::parse(DEFAULT_PAGE_URL).expect("default page URL is valid"),
            download_dir: default_download_dir(),
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (compatible; Wally/1.0)".to_string(),
            set_wallpaper: true,
        }
    }
}

impl Config {
    /// Build a config from defaults plus environment overrides.
    ///
    /// Environment variables:
    /// - `WALLY_BASE_URL`: base URL for relative image links
    /// - `WALLY_PAGE_URL`: the daily page to scrape
    /// - `WALLY_DOWNLOAD_DIR`: managed asset directory
    /// - `WALLY_DISABLE_WALLPAPER`: "true" to skip the OS wallpaper call
    /// - `WALLY_HTTP_TIMEOUT_SECS`: per-request timeout in seconds
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(v) = env::var("WALLY_BASE_URL") {
            config.base_url = Url::parse(&v).map_err(|e| ConfigError::InvalidUrl {
                key: "WALLY_BASE_URL",
                source: e,
            })?;
        }
        if let Ok(v) = env::var("WALLY_PAGE_URL") {
            config.page_url = Url::parse(&v).map_err(|e| ConfigError::InvalidUrl {
                key: "WALLY_PAGE_URL",
                source: e,
            })?;
        }
        if let Ok(v) = env::var("WALLY_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("WALLY_DISABLE_WALLPAPER") {
            config.set_wallpaper = !(v == "true" || v == "1");
        }
        if let Ok(v) = env::var("WALLY_HTTP_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                config.timeout = Duration::from_secs(secs);
            }
        }

        Ok(config)
    }
}

/// Default managed directory: wall-y under the user's Pictures folder.
fn default_download_dir() -> PathBuf {
    dirs::picture_dir()
        .map(|p| p.join("wall-y"))
        .unwrap_or_else(|| PathBuf::from("wall-y"))
}

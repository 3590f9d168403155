pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod gate;
pub mod http;
pub mod image;
pub mod marker;
pub mod metadata;
pub mod pipeline;
pub mod schedule;
pub mod types;
pub mod wallpaper;

pub use config::Config;
pub use error::{
    ApplyError, ConfigError, DownloadError, FetchError, MarkerError, MetadataError, UpdateError,
    ValidationError,
};
pub use fetch::fetch_latest;
pub use gate::{assess, Freshness, StaleReason};
pub use http::{HttpClient, MockClient, MockResponse, WebClient, WebClientBuilder};
pub use image::{MIN_HEIGHT, MIN_WIDTH};
pub use marker::MarkerStore;
pub use metadata::AssetMetadata;
pub use pipeline::{RunOutcome, RunReport, UpdatePipeline};
pub use types::{FreshnessMarker, ImageRecord};
pub use wallpaper::{DesktopBackend, MockBackend, WallpaperBackend};

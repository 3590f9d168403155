use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("No image link found on page")]
    NoImageLink,
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Image download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Image could not be decoded: {0}")]
    Undecodable(#[from] image::ImageError),

    #[error("Image too small: {width}x{height} (below the 800x600 minimum)")]
    TooSmall { width: u32, height: u32 },
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Wallpaper path is not valid UTF-8: {0}")]
    BadPath(PathBuf),

    #[error("Failed to set wallpaper: {0}")]
    Backend(String),
}

/// Errors from metadata embedding and sidecar handling. Never fatal to a run;
/// the pipeline logs these and carries on.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JPEG container error: {0}")]
    Jpeg(#[from] img_parts::Error),

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("PNG encoding error: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("PNG decoding error: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("Unsupported image format: {0:?}")]
    UnsupportedFormat(String),
}

#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("Failed to write freshness marker: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL in {key}: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Umbrella error for one pipeline run. Any variant aborts the run and leaves
/// the freshness marker untouched.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Marker(#[from] MarkerError),
}

impl UpdateError {
    /// Terminal state name for run reports.
    pub fn terminal_state(&self) -> &'static str {
        match self {
            UpdateError::Fetch(_) => "fetch_failed",
            UpdateError::Download(_) => "download_failed",
            UpdateError::Validation(_) => "validation_failed",
            UpdateError::Apply(_) => "apply_failed",
            UpdateError::Marker(_) => "marker_failed",
        }
    }
}

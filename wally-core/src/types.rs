use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day's image as advertised by the source page.
///
/// Produced fresh on every fetch and discarded after the pipeline consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Absolute URL of the full-size image.
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub publish_date: NaiveDate,
    /// The page the record was extracted from.
    pub source_page: String,
}

impl ImageRecord {
    /// Filename the asset is stored under, derived from the URL's basename.
    pub fn filename(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }
}

/// Persisted record of the last successfully applied image.
///
/// Read before each freshness check, overwritten only after a fully
/// successful apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessMarker {
    pub last_image_url: String,
    pub last_update: NaiveDate,
}

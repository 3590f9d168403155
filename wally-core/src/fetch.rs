//! Fetching the daily page and turning it into an [`ImageRecord`].

use chrono::Local;

use crate::config::Config;
use crate::error::FetchError;
use crate::extract::extract_image_record;
use crate::http::HttpClient;
use crate::types::ImageRecord;

/// Fetch the source page and extract the latest image record.
///
/// One timeout-bounded attempt; no retries. The record is stamped with the
/// local calendar date, which is also the date used in sidecar filenames.
pub async fn fetch_latest<C: HttpClient>(
    client: &C,
    config: &Config,
) -> Result<ImageRecord, FetchError> {
    let html = client.fetch_html(config.page_url.as_str()).await?;
    let publish_date = Local::now().date_naive();
    extract_image_record(&html, config.page_url.as_str(), &config.base_url, publish_date)
}

//! The freshness gate: should a fetched record trigger a refresh?
//!
//! A pure decision over the latest record, the persisted marker, and the
//! OS-reported current wallpaper. No side effects, so it is safe to call
//! on every timer tick.

use std::path::Path;

use crate::types::{FreshnessMarker, ImageRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The current wallpaper already matches the latest record.
    Fresh,
    Stale(StaleReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// No marker exists; nothing has ever been applied.
    NoMarker,
    /// The source advertises a different image than the last applied one.
    UrlChanged,
    /// The desktop shows a wallpaper we did not put there.
    WallpaperChanged,
}

impl StaleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaleReason::NoMarker => "no_marker",
            StaleReason::UrlChanged => "url_changed",
            StaleReason::WallpaperChanged => "wallpaper_changed",
        }
    }
}

/// Decide whether `record` warrants a refresh.
///
/// Rules are evaluated in order, short-circuiting on the first stale
/// verdict: no marker; marker URL differs; the current wallpaper's filename
/// differs from the record's derived filename and the wallpaper does not
/// live in the managed directory.
pub fn assess(
    record: &ImageRecord,
    marker: Option<&FreshnessMarker>,
    current_wallpaper: Option<&Path>,
    asset_dir: &Path,
) -> Freshness {
    let Some(marker) = marker else {
        return Freshness::Stale(StaleReason::NoMarker);
    };

    if marker.last_image_url != record.url {
        return Freshness::Stale(StaleReason::UrlChanged);
    }

    if let Some(current) = current_wallpaper {
        let same_name = current
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n == record.filename())
            .unwrap_or(false);
        let managed = current.parent().map(|d| d == asset_dir).unwrap_or(false);
        if !same_name && !managed {
            return Freshness::Stale(StaleReason::WallpaperChanged);
        }
    }

    Freshness::Fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn record() -> ImageRecord {
        ImageRecord {
            url: "https://apod.example/apod/image/2608/veil_big.jpg".to_string(),
            title: Some("The Veil Nebula".to_string()),
            description: None,
            publish_date: NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
            source_page: "https://apod.example/apod/astropix.html".to_string(),
        }
    }

    fn marker_for(url: &str) -> FreshnessMarker {
        FreshnessMarker {
            last_image_url: url.to_string(),
            last_update: NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
        }
    }

    fn asset_dir() -> PathBuf {
        PathBuf::from("/home/user/Pictures/wall-y")
    }

    #[test]
    fn no_marker_is_stale() {
        let verdict = assess(&record(), None, None, &asset_dir());
        assert_eq!(verdict, Freshness::Stale(StaleReason::NoMarker));
    }

    #[test]
    fn changed_url_is_stale() {
        let marker = marker_for("https://apod.example/apod/image/2608/old.jpg");
        let verdict = assess(&record(), Some(&marker), None, &asset_dir());
        assert_eq!(verdict, Freshness::Stale(StaleReason::UrlChanged));
    }

    #[test]
    fn matching_marker_and_wallpaper_is_fresh() {
        let marker = marker_for(&record().url);
        let current = asset_dir().join("veil_big.jpg");
        let verdict = assess(&record(), Some(&marker), Some(&current), &asset_dir());
        assert_eq!(verdict, Freshness::Fresh);
    }

    #[test]
    fn foreign_wallpaper_is_stale() {
        let marker = marker_for(&record().url);
        let current = PathBuf::from("/home/user/Pictures/vacation/beach.jpg");
        let verdict = assess(&record(), Some(&marker), Some(&current), &asset_dir());
        assert_eq!(verdict, Freshness::Stale(StaleReason::WallpaperChanged));
    }

    #[test]
    fn other_managed_asset_as_wallpaper_is_fresh() {
        // A different file from our own directory does not count as a
        // manual change.
        let marker = marker_for(&record().url);
        let current = asset_dir().join("older_asset.jpg");
        let verdict = assess(&record(), Some(&marker), Some(&current), &asset_dir());
        assert_eq!(verdict, Freshness::Fresh);
    }

    #[test]
    fn unknown_wallpaper_path_is_fresh_when_marker_matches() {
        let marker = marker_for(&record().url);
        let verdict = assess(&record(), Some(&marker), None, &asset_dir());
        assert_eq!(verdict, Freshness::Fresh);
    }

    #[test]
    fn decision_is_idempotent() {
        let marker = marker_for("https://apod.example/apod/image/2608/old.jpg");
        let current = asset_dir().join("old.jpg");
        let first = assess(&record(), Some(&marker), Some(&current), &asset_dir());
        let second = assess(&record(), Some(&marker), Some(&current), &asset_dir());
        assert_eq!(first, second);
    }
}

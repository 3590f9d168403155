//! Persistence for the freshness marker.
//!
//! Two flat files in the managed directory: `last_image.txt` holds the raw
//! URL of the last applied image, `last_update.txt` the ISO date of the last
//! successful run. Writes go through a temp file and an atomic rename so a
//! crash never leaves a truncated marker.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::MarkerError;
use crate::types::FreshnessMarker;

pub const LAST_IMAGE_FILE: &str = "last_image.txt";
pub const LAST_UPDATE_FILE: &str = "last_update.txt";

pub struct MarkerStore {
    dir: PathBuf,
}

impl MarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read the persisted marker. A missing or unparseable marker reads as
    /// `None`, which the freshness gate treats as stale.
    pub fn load(&self) -> Option<FreshnessMarker> {
        let url = fs::read_to_string(self.dir.join(LAST_IMAGE_FILE)).ok()?;
        let date = fs::read_to_string(self.dir.join(LAST_UPDATE_FILE)).ok()?;
        let last_update = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;

        Some(FreshnessMarker {
            last_image_url: url.trim().to_string(),
            last_update,
        })
    }

    /// Overwrite the marker. Called only after a fully successful apply.
    pub fn save(&self, marker: &FreshnessMarker) -> Result<(), MarkerError> {
        fs::create_dir_all(&self.dir)?;
        self.write_atomic(LAST_IMAGE_FILE, marker.last_image_url.as_bytes())?;
        self.write_atomic(
            LAST_UPDATE_FILE,
            marker.last_update.format("%Y-%m-%d").to_string().as_bytes(),
        )?;
        Ok(())
    }

    fn write_atomic(&self, name: &str, data: &[u8]) -> Result<(), MarkerError> {
        let mut tmp = tempfile::Builder::new()
            .prefix(name)
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(data)?;
        tmp.persist(self.dir.join(name)).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> FreshnessMarker {
        FreshnessMarker {
            last_image_url: "https://apod.example/apod/image/2608/veil_big.jpg".to_string(),
            last_update: NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkerStore::new(dir.path());

        store.save(&marker()).unwrap();
        assert_eq!(store.load(), Some(marker()));

        let raw = fs::read_to_string(dir.path().join(LAST_UPDATE_FILE)).unwrap();
        assert_eq!(raw, "2026-08-25");
    }

    #[test]
    fn missing_marker_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkerStore::new(dir.path());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn corrupt_date_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LAST_IMAGE_FILE), "https://x").unwrap();
        fs::write(dir.path().join(LAST_UPDATE_FILE), "yesterday-ish").unwrap();

        let store = MarkerStore::new(dir.path());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn save_overwrites_previous_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkerStore::new(dir.path());
        store.save(&marker()).unwrap();

        let newer = FreshnessMarker {
            last_image_url: "https://apod.example/apod/image/2608/next.jpg".to_string(),
            last_update: NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
        };
        store.save(&newer).unwrap();
        assert_eq!(store.load(), Some(newer));
    }
}

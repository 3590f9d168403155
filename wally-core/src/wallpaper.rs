//! Desktop wallpaper application.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ApplyError;

/// Seam between the update pipeline and the OS desktop.
pub trait WallpaperBackend: Send + Sync {
    /// Set the desktop wallpaper to the image at `path`.
    fn set(&self, path: &Path) -> Result<(), ApplyError>;

    /// Path of the currently applied wallpaper, if the OS reports one.
    fn current(&self) -> Option<PathBuf>;
}

/// Backend that talks to the real desktop environment.
pub struct DesktopBackend;

impl WallpaperBackend for DesktopBackend {
    fn set(&self, path: &Path) -> Result<(), ApplyError> {
        let p = path
            .to_str()
            .ok_or_else(|| ApplyError::BadPath(path.to_path_buf()))?;
        wallpaper::set_from_path(p).map_err(|e| ApplyError::Backend(e.to_string()))
    }

    fn current(&self) -> Option<PathBuf> {
        wallpaper::get().ok().map(PathBuf::from)
    }
}

#[derive(Default)]
struct MockState {
    applied: Vec<PathBuf>,
    current: Option<PathBuf>,
}

/// In-memory backend for tests.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    fail: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that reports `path` as the already-applied wallpaper.
    pub fn with_current(path: impl Into<PathBuf>) -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().current = Some(path.into());
        backend
    }

    /// Backend whose `set` always fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every path passed to `set`, in order.
    pub fn applied(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().applied.clone()
    }
}

impl WallpaperBackend for MockBackend {
    fn set(&self, path: &Path) -> Result<(), ApplyError> {
        if self.fail {
            return Err(ApplyError::Backend("mock backend failure".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.applied.push(path.to_path_buf());
        state.current = Some(path.to_path_buf());
        Ok(())
    }

    fn current(&self) -> Option<PathBuf> {
        self.state.lock().unwrap().current.clone()
    }
}

//! Image validation and asset persistence.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::ImageReader;

use crate::error::ValidationError;

/// Minimum accepted dimensions for a downloaded image. Anything smaller is
/// rejected as unsuitable for a desktop background.
pub const MIN_WIDTH: u32 = 800;
pub const MIN_HEIGHT: u32 = 600;

/// Decode the image and check it meets the minimum dimensions.
///
/// Returns the decoded width and height. The minimum is inclusive:
/// exactly 800x600 passes.
pub fn validate_dimensions(data: &[u8]) -> Result<(u32, u32), ValidationError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;

    let (width, height) = (img.width(), img.height());
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return Err(ValidationError::TooSmall { width, height });
    }
    Ok((width, height))
}

/// Write validated image bytes into the managed directory under `filename`.
///
/// The bytes land in a temp file first and are renamed into place on
/// success, so a failed download never leaves a usable partial file under
/// the final name.
pub fn persist_asset(data: &[u8], filename: &str, dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".asset-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;

    let path = dir.join(filename);
    tmp.persist(&path).map_err(|e| e.error)?;
    Ok(path)
}

//! Descriptive metadata for stored assets.
//!
//! Every applied image gets a plain-text sidecar (`apod_<date>.txt`) and,
//! when the format supports it, the same fields embedded in the image
//! itself: EXIF slots for JPEG, tEXt chunks for PNG. Embedding is
//! best-effort; the sidecar is the canonical copy.

use std::fs;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use exif::experimental::Writer as ExifWriter;
use exif::{Field, In, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use regex::Regex;

use crate::error::MetadataError;
use crate::types::ImageRecord;

/// EXIF UserComment values carry an eight-byte character code prefix.
const ASCII_COMMENT_PREFIX: &[u8; 8] = b"ASCII\0\0\0";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Title: (.*?)\n").expect("invalid title regex"));
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Date: (.*?)\n").expect("invalid date regex"));
static DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Description: (.*?)(?:\n\n|$)").expect("invalid description regex")
});
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)URL: (.*)$").expect("invalid url regex"));

/// Metadata recovered from a sidecar or from an image file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
}

/// Path of the sidecar for a given publish date.
pub fn sidecar_path(dir: &Path, date: chrono::NaiveDate) -> PathBuf {
    dir.join(format!("apod_{}.txt", date.format("%Y-%m-%d")))
}

/// Write the sidecar for `record` into the managed directory.
pub fn write_sidecar(dir: &Path, record: &ImageRecord) -> Result<PathBuf, MetadataError> {
    fs::create_dir_all(dir)?;
    let path = sidecar_path(dir, record.publish_date);

    let content = format!(
        "Title: {}\n\nDate: {}\n\nDescription: {}\n\nURL: {}",
        record.title.as_deref().unwrap_or(""),
        record.publish_date.format("%Y-%m-%d"),
        record.description.as_deref().unwrap_or(""),
        record.source_page,
    );
    fs::write(&path, content)?;
    Ok(path)
}

/// Parse a sidecar's labeled fields back out. Empty fields read as `None`.
pub fn parse_sidecar(content: &str) -> AssetMetadata {
    AssetMetadata {
        title: capture(&TITLE_RE, content),
        date: capture(&DATE_RE, content),
        description: capture(&DESC_RE, content),
        url: capture(&URL_RE, content),
    }
}

fn capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

/// Newest sidecar in the managed directory, by the date in its filename.
pub fn latest_sidecar(dir: &Path) -> std::io::Result<Option<(PathBuf, AssetMetadata)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut sidecars: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("apod_") && n.ends_with(".txt"))
                .unwrap_or(false)
        })
        .collect();
    sidecars.sort();

    let Some(path) = sidecars.pop() else {
        return Ok(None);
    };
    let content = fs::read_to_string(&path)?;
    let metadata = parse_sidecar(&content);
    Ok(Some((path, metadata)))
}

/// Metadata describing the current desktop wallpaper.
///
/// Prefers the fields embedded in the wallpaper image itself, so a
/// description survives even after the sidecars are cleaned out; falls
/// back to the newest sidecar when the image carries none.
pub fn describe_current(
    current_wallpaper: Option<&Path>,
    dir: &Path,
) -> std::io::Result<Option<(PathBuf, AssetMetadata)>> {
    if let Some(path) = current_wallpaper {
        if let Ok(meta) = read_image_metadata(path) {
            if meta != AssetMetadata::default() {
                return Ok(Some((path.to_path_buf(), meta)));
            }
        }
    }
    latest_sidecar(dir)
}

/// Embed title, description, and date into the image file at `path`.
///
/// Dispatches on the file extension. Callers treat failures as
/// non-fatal: the sidecar still carries the fields.
pub fn embed_metadata(path: &Path, record: &ImageRecord) -> Result<(), MetadataError> {
    match extension(path).as_str() {
        "jpg" | "jpeg" => embed_jpeg(path, record),
        "png" => embed_png(path, record),
        other => Err(MetadataError::UnsupportedFormat(other.to_string())),
    }
}

/// Read embedded metadata back out of a stored asset.
pub fn read_image_metadata(path: &Path) -> Result<AssetMetadata, MetadataError> {
    match extension(path).as_str() {
        "jpg" | "jpeg" => read_jpeg(path),
        "png" => read_png(path),
        other => Err(MetadataError::UnsupportedFormat(other.to_string())),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn embed_jpeg(path: &Path, record: &ImageRecord) -> Result<(), MetadataError> {
    let data = fs::read(path)?;
    let mut jpeg = Jpeg::from_bytes(Bytes::from(data))?;

    let title = record.title.clone().unwrap_or_default().into_bytes();
    let date = record.publish_date.format("%Y-%m-%d").to_string().into_bytes();
    let mut comment = ASCII_COMMENT_PREFIX.to_vec();
    comment.extend_from_slice(record.description.as_deref().unwrap_or("").as_bytes());

    let title_field = Field {
        tag: Tag::ImageDescription,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![title]),
    };
    let date_field = Field {
        tag: Tag::DateTimeOriginal,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![date]),
    };
    let comment_field = Field {
        tag: Tag::UserComment,
        ifd_num: In::PRIMARY,
        value: Value::Undefined(comment, 0),
    };

    let mut writer = ExifWriter::new();
    writer.push_field(&title_field);
    writer.push_field(&date_field);
    writer.push_field(&comment_field);

    let mut exif_data = Cursor::new(Vec::new());
    writer.write(&mut exif_data, false)?;
    jpeg.set_exif(Some(exif_data.into_inner().into()));

    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".meta-")
        .suffix(".jpg")
        .tempfile_in(dir)?;
    jpeg.encoder().write_to(tmp.as_file_mut())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn embed_png(path: &Path, record: &ImageRecord) -> Result<(), MetadataError> {
    let img = image::open(path)?.into_rgba8();
    let (width, height) = img.dimensions();

    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".meta-")
        .suffix(".png")
        .tempfile_in(dir)?;
    {
        let file = BufWriter::new(tmp.as_file_mut());
        let mut encoder = png::Encoder::new(file, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.add_text_chunk(
            "Title".to_string(),
            record.title.clone().unwrap_or_default(),
        )?;
        encoder.add_text_chunk(
            "Description".to_string(),
            record.description.clone().unwrap_or_default(),
        )?;
        encoder.add_text_chunk(
            "Date".to_string(),
            record.publish_date.format("%Y-%m-%d").to_string(),
        )?;

        let mut writer = encoder.write_header()?;
        writer.write_image_data(img.as_raw())?;
        writer.finish()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn read_jpeg(path: &Path) -> Result<AssetMetadata, MetadataError> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader)?;

    let mut metadata = AssetMetadata::default();
    if let Some(field) = exif.get_field(Tag::ImageDescription, In::PRIMARY) {
        metadata.title = ascii_value(&field.value);
    }
    if let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
        metadata.date = ascii_value(&field.value);
    }
    if let Some(field) = exif.get_field(Tag::UserComment, In::PRIMARY) {
        if let Value::Undefined(data, _) = &field.value {
            let text = data
                .strip_prefix(ASCII_COMMENT_PREFIX.as_slice())
                .unwrap_or(data);
            metadata.description = non_empty(String::from_utf8_lossy(text).into_owned());
        }
    }
    Ok(metadata)
}

fn read_png(path: &Path) -> Result<AssetMetadata, MetadataError> {
    let decoder = png::Decoder::new(fs::File::open(path)?);
    let reader = decoder.read_info()?;

    let mut metadata = AssetMetadata::default();
    for chunk in &reader.info().uncompressed_latin1_text {
        match chunk.keyword.as_str() {
            "Title" => metadata.title = non_empty(chunk.text.clone()),
            "Description" => metadata.description = non_empty(chunk.text.clone()),
            "Date" => metadata.date = non_empty(chunk.text.clone()),
            _ => {}
        }
    }
    Ok(metadata)
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(v) => v
            .first()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .and_then(non_empty),
        _ => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

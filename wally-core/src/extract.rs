//! Extraction of the daily image record from the source page's HTML.
//!
//! The page is hand-written mid-90s markup, so extraction is structural
//! rather than semantic: the full-size image is the first anchor wrapping an
//! inline preview image, the title is the page title, and the caption is the
//! paragraph carrying the "Explanation:" marker.

use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::FetchError;
use crate::types::ImageRecord;

/// Extensions an image href may end in to count as the day's picture.
const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Marker text preceding the caption.
const EXPLANATION_MARKER: &str = "Explanation:";

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("invalid anchor selector"));
static IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("invalid img selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("invalid title selector"));
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("invalid paragraph selector"));

/// Extract an [`ImageRecord`] from the daily page.
///
/// Fails with [`FetchError::NoImageLink`] when no anchor wrapping an `<img>`
/// points at a known image extension; title and description are best-effort.
pub fn extract_image_record(
    html: &str,
    page_url: &str,
    base_url: &Url,
    publish_date: NaiveDate,
) -> Result<ImageRecord, FetchError> {
    let document = Html::parse_document(html);

    let url = find_image_url(&document, base_url).ok_or(FetchError::NoImageLink)?;
    let title = extract_title(&document);
    let description = extract_description(&document);

    Ok(ImageRecord {
        url,
        title,
        description,
        publish_date,
        source_page: page_url.to_string(),
    })
}

/// Locate the first `<a>` wrapping an `<img>` whose href ends in a known
/// image extension. Relative hrefs are resolved against the base URL.
fn find_image_url(document: &Html, base_url: &Url) -> Option<String> {
    for anchor in document.select(&ANCHOR) {
        if anchor.select(&IMG).next().is_none() {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let lower = href.to_ascii_lowercase();
        if !IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            continue;
        }
        if href.starts_with("http") {
            return Some(href.to_string());
        }
        if let Ok(resolved) = base_url.join(href) {
            return Some(resolved.into());
        }
    }
    None
}

fn extract_title(document: &Html) -> Option<String> {
    let title = document.select(&TITLE).next()?;
    let text = collapse_whitespace(&title.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

/// The caption is the trailing text of the paragraph containing the
/// "Explanation:" marker, falling back to the second paragraph when no
/// marker is present.
fn extract_description(document: &Html) -> Option<String> {
    let paragraphs: Vec<ElementRef> = document.select(&PARAGRAPH).collect();

    for paragraph in &paragraphs {
        let text = collapse_whitespace(&paragraph.text().collect::<String>());
        if let Some(idx) = text.find(EXPLANATION_MARKER) {
            let explanation = text[idx + EXPLANATION_MARKER.len()..].trim();
            if !explanation.is_empty() {
                return Some(explanation.to_string());
            }
        }
    }

    paragraphs.get(1).and_then(|p| {
        let text = collapse_whitespace(&p.text().collect::<String>());
        (!text.is_empty()).then_some(text)
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

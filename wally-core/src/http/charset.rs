//! Charset detection and transcoding for source pages.
//!
//! The source still serves charset-less Latin-1-era HTML, so decoding by
//! blind UTF-8 conversion would mangle the occasional accented credit line.

use encoding_rs::Encoding;

/// Decode raw bytes to a UTF-8 string, detecting charset from the
/// Content-Type header, then HTML meta tags, then falling back to UTF-8.
pub fn decode_bytes_to_utf8(bytes: &[u8], content_type: Option<&str>) -> String {
    let detected = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_html_meta(bytes));

    if let Some(encoding) = detected {
        if encoding != encoding_rs::UTF_8 {
            let (decoded, _, _) = encoding.decode(bytes);
            return decoded.into_owned();
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(e) => {
            tracing::debug!("falling back to lossy UTF-8 conversion: {}", e);
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Extract charset from a Content-Type header value.
/// e.g. "text/html; charset=iso-8859-1" -> Some(WINDOWS_1252)
fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    let lower = content_type.to_ascii_lowercase();
    let value = lower
        .split("charset=")
        .nth(1)?
        .trim_start_matches('"')
        .split(['"', ';', ',', ' '])
        .next()?
        .trim();

    if value.is_empty() {
        return None;
    }
    Encoding::for_label(value.as_bytes())
}

/// Scan the first 1024 bytes of HTML for a `<meta charset=...>` declaration.
fn charset_from_html_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(1024)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let idx = head.find("charset=")?;
    // Only honor a declaration sitting inside a <meta> tag; a bare
    // "charset=" this early in the page can be part of a URL query string.
    let tag_start = head[..idx].rfind('<')?;
    if !head[tag_start..idx].contains("meta") {
        return None;
    }
    let rest = &head[idx + "charset=".len()..];
    let value = rest
        .trim_start_matches(['"', '\''])
        .split(['"', '\'', ';', '>', ' '])
        .next()?
        .trim();

    if value.is_empty() {
        return None;
    }
    Encoding::for_label(value.as_bytes())
}

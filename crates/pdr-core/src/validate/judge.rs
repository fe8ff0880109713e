//! Decision rule: does a probe response look like a data file?

use crate::asset::ValidationErrorCode;
use crate::probe::ProbeResponse;

const MARKUP_TYPES: &[&str] = &["text/html", "application/xhtml+xml", "text/xml"];

const DATA_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.ms-office",
    "application/x-excel",
    "application/excel",
    "text/csv",
    "application/csv",
    "text/plain",
    "application/zip",
    "application/x-zip",
    "application/x-zip-compressed",
    "application/zip-compressed",
    "application/octet-stream",
    "binary/octet-stream",
    "application/x-download",
    "application/force-download",
    "application/download",
    "application/json",
];

/// Lower-cased MIME type without parameters.
pub(crate) fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn is_markup(mime: &str) -> bool {
    MARKUP_TYPES.contains(&mime)
}

fn is_data_type(mime: &str) -> bool {
    mime.starts_with("application/vnd.openxmlformats-officedocument.spreadsheetml")
        || DATA_TYPES.contains(&mime)
}

/// True when the leading bytes open an HTML document.
pub(crate) fn looks_like_html(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(bytes);
    let lower = head.trim_start_matches('\u{feff}').trim_start().to_ascii_lowercase();
    lower.starts_with("<!doctype html") || lower.starts_with("<html") || lower.contains("<body")
}

/// Judges a response. `Ok(())` means the URL serves a plausible data file.
pub(crate) fn judge(response: &ProbeResponse) -> Result<(), ValidationErrorCode> {
    if !response.is_success() {
        return Err(ValidationErrorCode::HttpError);
    }
    match response.content_type.as_deref().map(mime_essence) {
        Some(mime) if is_markup(&mime) => Err(ValidationErrorCode::HtmlResponse),
        Some(mime) if is_data_type(&mime) => Ok(()),
        Some(mime) if mime.is_empty() => sniff(&response.sniff),
        Some(_) => Err(ValidationErrorCode::UnexpectedType),
        None => sniff(&response.sniff),
    }
}

fn sniff(bytes: &[u8]) -> Result<(), ValidationErrorCode> {
    if looks_like_html(bytes) {
        Err(ValidationErrorCode::HtmlResponse)
    } else {
        Ok(())
    }
}

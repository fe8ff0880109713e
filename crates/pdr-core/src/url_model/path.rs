//! File name, extension and segment extraction from URL paths.

use url::Url;

/// Extracts the last path segment from a URL for use as a title hint.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = path_segments(&parsed).pop()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}

/// Lower-cased extension of the last path segment, ignoring query and fragment.
pub fn path_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Non-empty path segments in order (still percent-encoded).
pub fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

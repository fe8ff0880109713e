//! Recency and legacy signals derived from URLs and titles.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::url_model;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// Path segments or file-name tokens that mark superseded releases.
const LEGACY_TOKENS: [&str; 8] = [
    "archive",
    "archived",
    "archives",
    "old",
    "superseded",
    "legacy",
    "previous",
    "historical",
];

/// Four-digit runs between 1900 and 2099 bounded by non-digits.
pub fn year_tokens(text: &str) -> impl Iterator<Item = u16> + '_ {
    DIGIT_RUN
        .find_iter(text)
        .filter(|m| m.len() == 4)
        .filter_map(|m| m.as_str().parse::<u16>().ok())
        .filter(|y| (1900..=2099).contains(y))
}

/// Newest year token across all given texts.
pub fn newest_year<'a>(texts: impl IntoIterator<Item = &'a str>) -> Option<u16> {
    texts.into_iter().flat_map(year_tokens).max()
}

/// True if any path directory or the file stem contains a legacy token as a
/// separate word (`archive-2019/`, `report_old.csv`, `archive.zip`).
pub fn is_legacy(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let segments = url_model::path_segments(&parsed);
    let Some((file, dirs)) = segments.split_last() else {
        return false;
    };
    let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file.as_str());
    let legacy = dirs.iter().map(String::as_str).chain([stem]).any(has_legacy_word);
    legacy
}

fn has_legacy_word(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| LEGACY_TOKENS.iter().any(|t| word.eq_ignore_ascii_case(t)))
}

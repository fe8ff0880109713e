//! Candidate and asset records shared by extraction, ranking, validation and the cache.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Normalized data-file format. Ordering of the variants matches ranking precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    Xlsx,
    Csv,
    Xls,
    Zip,
    #[default]
    #[serde(other)]
    Other,
}

impl AssetFormat {
    /// All formats, highest precedence first.
    pub const ALL: [AssetFormat; 5] = [
        AssetFormat::Xlsx,
        AssetFormat::Csv,
        AssetFormat::Xls,
        AssetFormat::Zip,
        AssetFormat::Other,
    ];

    /// Maps a file extension (any case, with or without leading dot) to a format.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim().trim_start_matches('.');
        if ext.eq_ignore_ascii_case("xlsx") {
            AssetFormat::Xlsx
        } else if ext.eq_ignore_ascii_case("csv") {
            AssetFormat::Csv
        } else if ext.eq_ignore_ascii_case("xls") {
            AssetFormat::Xls
        } else if ext.eq_ignore_ascii_case("zip") {
            AssetFormat::Zip
        } else {
            AssetFormat::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetFormat::Xlsx => "xlsx",
            AssetFormat::Csv => "csv",
            AssetFormat::Xls => "xls",
            AssetFormat::Zip => "zip",
            AssetFormat::Other => "other",
        }
    }
}

impl fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the landing page a candidate link was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePattern {
    /// `<a href>` outside of a table.
    #[default]
    Anchor,
    /// Any `href` inside a `<td>` or `<th>`.
    TableCell,
    /// `data-url`, `data-href`, `data-download` or `data-file`.
    DataAttribute,
    /// `href` on a non-anchor element (`<link>`, `<area>`, ...).
    #[serde(other)]
    Element,
}

/// A link extracted from a landing page, not yet scored or validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute URL (fragment stripped).
    pub url: String,
    /// Display text near the link.
    pub title: String,
    /// Lower-cased extension as found in the URL path.
    pub format_hint: String,
    pub source_pattern: SourcePattern,
}

/// Tri-state validation flag. Persisted as `true`, `false` or `"skipped"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    Passed,
    Failed,
    #[default]
    Skipped,
}

impl Validation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Validation::Passed => "true",
            Validation::Failed => "false",
            Validation::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Validation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Validation::Passed => serializer.serialize_bool(true),
            Validation::Failed => serializer.serialize_bool(false),
            Validation::Skipped => serializer.serialize_str("skipped"),
        }
    }
}

impl<'de> Deserialize<'de> for Validation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Validation::Passed,
            Raw::Flag(false) => Validation::Failed,
            Raw::Text(s) if s.eq_ignore_ascii_case("true") => Validation::Passed,
            Raw::Text(s) if s.eq_ignore_ascii_case("false") => Validation::Failed,
            Raw::Text(_) => Validation::Skipped,
        })
    }
}

/// Reason a candidate failed its validation probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorCode {
    /// Response was HTML/markup regardless of the URL's extension.
    HtmlResponse,
    /// Non-2xx status, or the request failed before a status was received.
    HttpError,
    Timeout,
    /// Content-Type is neither markup nor a plausible data-file type.
    UnexpectedType,
}

impl ValidationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorCode::HtmlResponse => "html_response",
            ValidationErrorCode::HttpError => "http_error",
            ValidationErrorCode::Timeout => "timeout",
            ValidationErrorCode::UnexpectedType => "unexpected_type",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate after scoring (and optionally validation). This is the unit
/// returned to callers and stored in the resolution cache.
///
/// Every field defaults on read so older or hand-edited cache files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAsset {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// 1-based position after scoring.
    #[serde(default)]
    pub rank: usize,
    #[serde(default)]
    pub format: AssetFormat,
    #[serde(default)]
    pub validated: Validation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<ValidationErrorCode>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub format_hint: String,
    #[serde(default)]
    pub source_pattern: SourcePattern,
}

impl RankedAsset {
    /// Builds an unvalidated asset from a scored candidate.
    pub fn from_candidate(candidate: &Candidate, format: AssetFormat, score: i64, rank: usize) -> Self {
        Self {
            title: candidate.title.clone(),
            url: candidate.url.clone(),
            rank,
            format,
            validated: Validation::Skipped,
            validation_error: None,
            score,
            format_hint: candidate.format_hint.clone(),
            source_pattern: candidate.source_pattern,
        }
    }

    pub fn mark_passed(&mut self) {
        self.validated = Validation::Passed;
        self.validation_error = None;
    }

    pub fn mark_failed(&mut self, code: ValidationErrorCode) {
        self.validated = Validation::Failed;
        self.validation_error = Some(code);
    }
}

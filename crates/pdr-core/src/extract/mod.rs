//! Candidate extraction: landing-page HTML to a deduplicated list of data-file links.
//!
//! Pure HTML-to-structure transformation with no network access. Links are
//! recognized by the extension of their URL path in any `href`-like attribute,
//! wherever the element sits in the document (anchors, table cells, `<link>`,
//! buttons carrying `data-url`, ...). Relative references are resolved against
//! the landing page URL. The first occurrence of a URL wins and document order
//! is preserved, which later serves as the ranking tie-break.

mod consts;
mod metadata;

pub use metadata::{extract_page_metadata, PageMetadata};

use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

use crate::asset::{Candidate, SourcePattern};
use crate::url_model;

/// Extracts data-file candidates from landing-page HTML.
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    /// Lower-cased extensions without leading dot.
    extensions: Vec<String>,
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl CandidateExtractor {
    /// Recognizes xlsx, csv, xls and zip plus any `extra_extensions`.
    pub fn new(extra_extensions: &[String]) -> Self {
        let mut extensions: Vec<String> = consts::DATA_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        for ext in extra_extensions {
            let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
            if !ext.is_empty() && !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }
        Self { extensions }
    }

    /// Returns candidates in document order, one per absolute URL.
    pub fn extract(&self, html: &str, base: &Url) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for element in document.select(&consts::LINK_SELECTOR) {
            for attr in consts::LINK_ATTRIBUTES {
                let Some(raw) = element.value().attr(attr) else {
                    continue;
                };
                let Some(url) = resolve_reference(base, raw) else {
                    continue;
                };
                let Some(ext) = self.data_extension(&url) else {
                    continue;
                };
                let url = url.to_string();
                if !seen.insert(url.clone()) {
                    continue;
                }
                let source_pattern = source_pattern(&element, attr);
                let title = title_for(&element, &url);
                tracing::trace!(%url, ?source_pattern, "candidate");
                out.push(Candidate {
                    url,
                    title,
                    format_hint: ext,
                    source_pattern,
                });
            }
        }

        tracing::debug!(base = %base, count = out.len(), "extracted candidates");
        out
    }

    fn data_extension(&self, url: &Url) -> Option<String> {
        url_model::path_extension(url).filter(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// Extracts candidates using the default extension set.
pub fn extract(html: &str, base: &Url) -> Vec<Candidate> {
    CandidateExtractor::default().extract(html, base)
}

/// Collapses runs of whitespace and trims.
pub(crate) fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves an attribute value to an absolute http(s) URL without fragment.
fn resolve_reference(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let mut url = base.join(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn source_pattern(element: &ElementRef<'_>, attr: &str) -> SourcePattern {
    if attr.starts_with("data-") {
        SourcePattern::DataAttribute
    } else if enclosing(element, &["td", "th"]).is_some() {
        SourcePattern::TableCell
    } else if element.value().name() == "a" {
        SourcePattern::Anchor
    } else {
        SourcePattern::Element
    }
}

/// Nearest ancestor element whose tag name is one of `names`.
fn enclosing<'a>(element: &ElementRef<'a>, names: &[&str]) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| names.contains(&el.value().name()))
}

fn title_for(element: &ElementRef<'_>, url: &str) -> String {
    let own = normalize_text(&element.text().collect::<String>());
    if !own.is_empty() {
        return own;
    }
    for attr in ["title", "aria-label"] {
        if let Some(v) = element.value().attr(attr).map(normalize_text) {
            if !v.is_empty() {
                return v;
            }
        }
    }
    if let Some(row) = enclosing(element, &["tr"]) {
        let first_cell = row
            .select(&consts::CELL_SELECTOR)
            .next()
            .map(|cell| normalize_text(&cell.text().collect::<String>()))
            .unwrap_or_default();
        if !first_cell.is_empty() {
            return first_cell;
        }
    }
    url_model::filename_from_url_path(url).unwrap_or_else(|| url.to_string())
}

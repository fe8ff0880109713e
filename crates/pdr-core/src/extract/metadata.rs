//! Landing-page metadata (title and description) for display.

use scraper::Html;

use super::consts;
use super::normalize_text;

/// Human-readable metadata of a landing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PageMetadata {
    /// `<title>`, falling back to the first `<h1>`.
    pub title: Option<String>,
    /// `<meta name="description">` content.
    pub description: Option<String>,
}

/// Extracts page title and description. Missing pieces are `None`.
pub fn extract_page_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let first_text = |selector: &scraper::Selector| {
        document
            .select(selector)
            .map(|el| normalize_text(&el.text().collect::<String>()))
            .find(|t| !t.is_empty())
    };

    let title = first_text(&consts::TITLE_SELECTOR).or_else(|| first_text(&consts::H1_SELECTOR));
    let description = document
        .select(&consts::META_DESCRIPTION_SELECTOR)
        .filter_map(|el| el.value().attr("content"))
        .map(normalize_text)
        .find(|t| !t.is_empty());

    PageMetadata { title, description }
}

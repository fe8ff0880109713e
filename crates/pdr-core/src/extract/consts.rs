use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

/// Attributes that may carry a data-file reference, in inspection order.
pub(crate) const LINK_ATTRIBUTES: [&str; 5] = ["href", "data-url", "data-href", "data-download", "data-file"];

/// Extensions recognized as data files without any configuration.
pub(crate) const DATA_EXTENSIONS: [&str; 4] = ["xlsx", "csv", "xls", "zip"];

// Every element carrying one of LINK_ATTRIBUTES, in document order.
selector!(
    LINK_SELECTOR,
    "[href], [data-url], [data-href], [data-download], [data-file]"
);
selector!(CELL_SELECTOR, "td, th");
selector!(TITLE_SELECTOR, "title");
selector!(H1_SELECTOR, "h1");
selector!(META_DESCRIPTION_SELECTOR, "meta[name='description']");

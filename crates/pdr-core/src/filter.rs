//! Narrow a resolution down to assets matching a keyword.

use crate::asset::RankedAsset;

/// Keeps assets whose format or title contains `needle` (case-insensitive).
/// Order and rank numbers are preserved. A blank needle keeps everything.
pub fn filter_assets(assets: Vec<RankedAsset>, needle: &str) -> Vec<RankedAsset> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return assets;
    }
    assets
        .into_iter()
        .filter(|a| {
            a.format.as_str().contains(needle.as_str())
                || a.format_hint.to_lowercase().contains(needle.as_str())
                || a.title.to_lowercase().contains(needle.as_str())
        })
        .collect()
}

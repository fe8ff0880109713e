//! Dataset catalog: which landing pages a refresh run resolves.
//!
//! ```toml
//! [[dataset]]
//! id = "housing_starts"
//! title = "Housing starts by metro"
//! landing_url = "https://stats.example.org/housing/starts"
//! filter = "xlsx"
//!
//! [[dataset]]
//! id = "rental_market"
//! direct_url = "https://cdn.example.org/rms-2025.xlsx"
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub landing_url: Option<String>,
    /// Pinned download URL; resolution is skipped entirely when set.
    #[serde(default)]
    pub direct_url: Option<String>,
    /// Keyword passed to `filter_assets` before picking the top asset.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    dataset: Vec<Dataset>,
}

/// Parses a catalog and checks ids are unique and every dataset has a URL.
pub fn from_toml_str(data: &str) -> Result<Vec<Dataset>> {
    let file: CatalogFile = toml::from_str(data).context("parse catalog")?;
    let mut seen: HashSet<&str> = HashSet::new();
    for ds in &file.dataset {
        if ds.id.trim().is_empty() {
            bail!("catalog dataset with empty id");
        }
        if !seen.insert(&ds.id) {
            bail!("duplicate dataset id in catalog: {}", ds.id);
        }
        if ds.landing_url.is_none() && ds.direct_url.is_none() {
            bail!("dataset {} needs landing_url or direct_url", ds.id);
        }
    }
    Ok(file.dataset)
}

pub fn load(path: &Path) -> Result<Vec<Dataset>> {
    let data =
        std::fs::read_to_string(path).with_context(|| format!("read catalog: {}", path.display()))?;
    from_toml_str(&data).with_context(|| format!("load catalog: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_landing_and_pinned_datasets() {
        let toml = r#"
            [[dataset]]
            id = "starts"
            landing_url = "https://stats.example.org/housing/starts"
            filter = "xlsx"

            [[dataset]]
            id = "rents"
            title = "Rental market survey"
            direct_url = "https://cdn.example.org/rms.xlsx"
        "#;
        let datasets = from_toml_str(toml).unwrap();
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].filter.as_deref(), Some("xlsx"));
        assert!(datasets[0].direct_url.is_none());
        assert_eq!(datasets[1].title.as_deref(), Some("Rental market survey"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let toml = r#"
            [[dataset]]
            id = "starts"
            landing_url = "https://a.example/"
            [[dataset]]
            id = "starts"
            landing_url = "https://b.example/"
        "#;
        let err = from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_dataset_without_url() {
        let err = from_toml_str("[[dataset]]\nid = \"orphan\"\n").unwrap_err();
        assert!(err.to_string().contains("orphan"));
    }

    #[test]
    fn empty_catalog_is_fine() {
        assert!(from_toml_str("").unwrap().is_empty());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, "[[dataset]]\nid = \"a\"\ndirect_url = \"https://x.example/a.csv\"\n").unwrap();
        assert_eq!(load(&path).unwrap()[0].id, "a");
    }
}

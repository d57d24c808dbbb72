//! Search input files: which image URLs to harvest, grouped by query.
//!
//! The file is a JSON array. Keys may use the legacy PascalCase spelling
//! (`SearchQuery`, `MaxImages`, `Urls`) or snake_case.

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

/// One search query and the candidate image URLs collected for it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchInput {
    #[serde(alias = "SearchQuery")]
    pub search_query: String,

    /// Upper bound on images taken from `urls`
    #[serde(default, alias = "MaxImages")]
    pub max_images: Option<usize>,

    #[serde(default, alias = "Urls")]
    pub urls: Vec<String>,
}

impl SearchInput {
    /// Build an input from URLs given directly (e.g. on the command line).
    pub fn from_urls(search_query: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            search_query: search_query.into(),
            max_images: None,
            urls,
        }
    }

    /// Absolute http(s) URLs, in file order, capped at `max_images`.
    pub fn image_urls(&self) -> Vec<String> {
        let limit = self.max_images.unwrap_or(usize::MAX);
        self.urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
            .take(limit)
            .map(str::to_string)
            .collect()
    }
}

/// Load every search input from a JSON file.
pub fn load_inputs(path: &Path) -> Result<Vec<SearchInput>> {
    let content = std::fs::read_to_string(path)?;
    parse_inputs(&content)
}

/// Parse a JSON array of search inputs.
pub fn parse_inputs(json: &str) -> Result<Vec<SearchInput>> {
    Ok(serde_json::from_str(json)?)
}

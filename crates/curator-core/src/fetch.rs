//! Remote catalog access.
//!
//! The sync engine only needs "give me the text of a catalog-relative path",
//! so that is the whole trait. The HTTP implementation is blocking; sync runs
//! as a single foreground process.

use crate::error::{CuratorError, Result};
use crate::registry::Registry;
use crate::types::Category;
use std::time::Duration;

/// Published catalog used when no `--source` is given.
pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/oakmont-labs/curator-catalog/main";

pub trait RemoteSource {
    /// Fetch the text of a catalog-relative path (e.g. `registry/skills.json`).
    fn fetch(&self, path: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { base_url, client }
    }
}

impl RemoteSource for HttpSource {
    fn fetch(&self, path: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.get(&url).send().map_err(|e| CuratorError::Fetch {
            unit: path.to_string(),
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(CuratorError::Fetch {
                unit: path.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(response.text()?)
    }
}

// ---------------------------------------------------------------------------
// Registry fetch
// ---------------------------------------------------------------------------

/// Fetch and parse one category's registry from the remote catalog.
pub fn fetch_registry(source: &dyn RemoteSource, category: Category) -> Result<Registry> {
    let text = source.fetch(category.registry_file())?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| CuratorError::Fetch {
            unit: category.registry_file().to_string(),
            reason: format!("invalid JSON: {e}"),
        })?;
    Registry::from_json(category, &value).map_err(|reason| CuratorError::Fetch {
        unit: category.registry_file().to_string(),
        reason,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

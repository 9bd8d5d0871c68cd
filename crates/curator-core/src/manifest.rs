//! Per-project installation manifest.
//!
//! Records which resources a client project has installed, which categories
//! it tracks, and its sync preferences. Created on first sync, mutated only
//! after a successful apply, never touched by the registry builder.

use crate::error::Result;
use crate::types::Category;
use crate::{io, paths};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub auto_approve: bool,
    pub backup_before_sync: bool,
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_approve: false,
            backup_before_sync: true,
            notifications: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default = "default_tracking")]
    pub tracking: Vec<Category>,
    #[serde(default)]
    pub installed: BTreeMap<Category, Vec<String>>,
    #[serde(default)]
    pub preferences: Preferences,
}

fn default_version() -> u32 {
    1
}

fn default_tracking() -> Vec<Category> {
    Category::all().to_vec()
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: 1,
            last_sync: None,
            tracking: default_tracking(),
            installed: BTreeMap::new(),
            preferences: Preferences::default(),
        }
    }
}

impl Manifest {
    /// Load `.curator/manifest.json`, or start a fresh one on first sync.
    pub fn load_or_default(project: &Path) -> Result<Self> {
        let path = paths::manifest_path(project);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let manifest: Manifest = serde_json::from_str(&data)?;
        Ok(manifest)
    }

    pub fn save(&self, project: &Path) -> Result<()> {
        let path = paths::manifest_path(project);
        let mut data = serde_json::to_string_pretty(self)?;
        data.push('\n');
        io::atomic_write(&path, data.as_bytes())
    }

    pub fn tracks(&self, category: Category) -> bool {
        self.tracking.contains(&category)
    }

    pub fn is_installed(&self, category: Category, id: &str) -> bool {
        self.installed
            .get(&category)
            .is_some_and(|ids| ids.iter().any(|i| i == id))
    }

    /// Record a successful install. Keeps the list sorted and deduplicated.
    pub fn mark_installed(&mut self, category: Category, id: &str) {
        let ids = self.installed.entry(category).or_default();
        if !ids.iter().any(|i| i == id) {
            ids.push(id.to_string());
            ids.sort();
        }
    }

    pub fn touch_last_sync(&mut self) {
        self.last_sync = Some(Utc::now());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

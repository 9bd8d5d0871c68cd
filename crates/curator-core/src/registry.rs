//! Derived JSON registries, one per category.
//!
//! A registry is a projection of a source directory and is rebuilt wholesale
//! on every build. There is no partial-mutation API: `rebuild` replaces the
//! file, `load` reads it. Full replacement is what makes the no-orphan /
//! no-omission invariant hold without a reconciliation pass.

use crate::error::{CuratorError, Result};
use crate::types::{Category, ResourceDescriptor};
use crate::{io, paths};
use chrono::{DateTime, Utc};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Registry {
    pub category: Category,
    pub entries: Vec<ResourceDescriptor>,
    pub count: usize,
    /// Skill registry only: "<skills>:<tools>", cross-referencing the tool
    /// registry's count. Checked by the validator.
    pub tool_ratio: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl Registry {
    /// Build a brand-new registry from scanner output. `tool_count` feeds the
    /// embedded ratio and is only meaningful for the skill registry.
    pub fn build(
        category: Category,
        entries: Vec<ResourceDescriptor>,
        tool_count: Option<usize>,
    ) -> Self {
        let count = entries.len();
        let tool_ratio = match (category, tool_count) {
            (Category::Skill, Some(tools)) => Some(format!("{count}:{tools}")),
            _ => None,
        };
        Self {
            category,
            entries,
            count,
            tool_ratio,
            last_updated: Utc::now(),
        }
    }

    /// Write the registry file, replacing whatever was there.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::registry_path(root, self.category);
        let mut data = serde_json::to_string_pretty(&self.to_json()?)?;
        data.push('\n');
        io::atomic_write(&path, data.as_bytes())
    }

    /// Build and save in one step.
    pub fn rebuild(
        root: &Path,
        category: Category,
        entries: Vec<ResourceDescriptor>,
        tool_count: Option<usize>,
    ) -> Result<Self> {
        let registry = Self::build(category, entries, tool_count);
        registry.save(root)?;
        Ok(registry)
    }

    pub fn load(root: &Path, category: Category) -> Result<Self> {
        let path = paths::registry_path(root, category);
        if !path.exists() {
            return Err(CuratorError::RegistryNotFound(
                category.registry_file().to_string(),
            ));
        }
        let data = std::fs::read_to_string(&path)?;
        let value: serde_json::Value = serde_json::from_str(&data)?;
        Self::from_json(category, &value)
            .map_err(|reason| CuratorError::MalformedRegistry {
                path: category.registry_file().to_string(),
                reason,
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    // -----------------------------------------------------------------------
    // JSON shape
    // -----------------------------------------------------------------------

    // The entries array is named after the category ("skills" / "tools"), so
    // the document shape is assembled by hand rather than derived.

    fn to_json(&self) -> Result<serde_json::Value> {
        let mut obj = serde_json::Map::new();
        obj.insert(
            self.category.entries_field().to_string(),
            serde_json::to_value(&self.entries)?,
        );
        obj.insert("count".to_string(), serde_json::json!(self.count));
        if let Some(ratio) = &self.tool_ratio {
            obj.insert("toolRatio".to_string(), serde_json::json!(ratio));
        }
        obj.insert(
            "lastUpdated".to_string(),
            serde_json::json!(self.last_updated.to_rfc3339()),
        );
        Ok(serde_json::Value::Object(obj))
    }

    pub(crate) fn from_json(
        category: Category,
        value: &serde_json::Value,
    ) -> std::result::Result<Self, String> {
        let field = category.entries_field();
        let entries_value = value
            .get(field)
            .ok_or_else(|| format!("missing '{field}' array"))?;
        let entries: Vec<ResourceDescriptor> =
            serde_json::from_value(entries_value.clone()).map_err(|e| e.to_string())?;
        let count = value
            .get("count")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| "missing 'count'".to_string())? as usize;
        let tool_ratio = value
            .get("toolRatio")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let last_updated = value
            .get("lastUpdated")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "missing 'lastUpdated'".to_string())
            .and_then(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| format!("bad 'lastUpdated': {e}"))
            })?;
        Ok(Self {
            category,
            entries,
            count,
            tool_ratio,
            last_updated,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "skills")]
    Skill,
    #[serde(rename = "tools")]
    Tool,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[Category::Skill, Category::Tool]
    }

    /// Source directory under the catalog root whose subdirectories are the
    /// ground truth for this category.
    pub fn source_dir(self) -> &'static str {
        match self {
            Category::Skill => "skills",
            Category::Tool => "tools",
        }
    }

    /// Primary metadata file expected in every entry directory.
    pub fn metadata_file(self) -> &'static str {
        match self {
            Category::Skill => "SKILL.md",
            Category::Tool => "TOOL.md",
        }
    }

    /// Name of the entries array in this category's registry JSON.
    pub fn entries_field(self) -> &'static str {
        match self {
            Category::Skill => "skills",
            Category::Tool => "tools",
        }
    }

    pub fn registry_file(self) -> &'static str {
        match self {
            Category::Skill => "registry/skills.json",
            Category::Tool => "registry/tools.json",
        }
    }

    pub fn as_str(self) -> &'static str {
        self.source_dir()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = crate::error::CuratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skill" | "skills" => Ok(Category::Skill),
            "tool" | "tools" => Ok(Category::Tool),
            _ => Err(crate::error::CuratorError::InvalidCategory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ResourceDescriptor
// ---------------------------------------------------------------------------

/// One catalog entry, as scanned from its source directory. Registries store
/// these verbatim; the engine re-reads but never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub id: String,
    pub category: Category,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Catalog-relative path of the entry directory.
    pub path: String,
}

// ---------------------------------------------------------------------------
// MergeStrategy
// ---------------------------------------------------------------------------

/// How a remote update is combined with a local file. Assigned statically by
/// file identity, never inferred from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Remote content fully overwrites local content.
    Replace,
    /// Remote lines are unioned into the local file: local lines first in
    /// their original order, new remote lines appended, duplicates dropped.
    Append,
    /// Remote keys are added where absent; existing local values are never
    /// overwritten.
    Structural,
}

impl MergeStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeStrategy::Replace => "replace",
            MergeStrategy::Append => "append",
            MergeStrategy::Structural => "structural",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use crate::error::{CuratorError, Result};
use crate::types::Category;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const REGISTRY_DIR: &str = "registry";
pub const RELATIONSHIPS_FILE: &str = "registry/relationships.json";
pub const SKILL_INDEX_FILE: &str = "docs/skill-index.md";

pub const CURATOR_DIR: &str = ".curator";
pub const MANIFEST_FILE: &str = ".curator/manifest.json";
pub const BACKUPS_DIR: &str = ".curator/backups";

/// Placeholder entry directory for authoring new resources; never counted.
pub const RESERVED_TEMPLATE_DIR: &str = "_template";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn source_dir(root: &Path, category: Category) -> PathBuf {
    root.join(category.source_dir())
}

pub fn entry_dir(root: &Path, category: Category, id: &str) -> PathBuf {
    source_dir(root, category).join(id)
}

pub fn registry_path(root: &Path, category: Category) -> PathBuf {
    root.join(category.registry_file())
}

pub fn relationships_path(root: &Path) -> PathBuf {
    root.join(RELATIONSHIPS_FILE)
}

pub fn skill_index_path(root: &Path) -> PathBuf {
    root.join(SKILL_INDEX_FILE)
}

pub fn manifest_path(project: &Path) -> PathBuf {
    project.join(MANIFEST_FILE)
}

pub fn backups_dir(project: &Path) -> PathBuf {
    project.join(BACKUPS_DIR)
}

/// Local install path for a resource's metadata file inside a client project.
pub fn installed_entry_file(project: &Path, category: Category, id: &str) -> PathBuf {
    project
        .join(CURATOR_DIR)
        .join(category.source_dir())
        .join(id)
        .join(category.metadata_file())
}

// ---------------------------------------------------------------------------
// Id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(CuratorError::InvalidId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Directory scanner — turns a category's source directory into an ordered
//! list of [`ResourceDescriptor`]s.
//!
//! A malformed entry fails the whole category scan with an error naming the
//! offending directory. Silent skips are deliberately not an option: a
//! skipped entry would surface later as a registry/doc mismatch with no hint
//! of where it came from.

use crate::error::{CuratorError, Result};
use crate::paths;
use crate::types::{Category, ResourceDescriptor};
use serde::Deserialize;
use std::path::Path;

/// Declared metadata from the front-matter block of an entry's primary file.
/// All fields optional at parse time; required ones are checked afterwards so
/// the error can say which field is missing.
#[derive(Debug, Deserialize)]
struct FrontMatter {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    triggers: Vec<String>,
    version: Option<String>,
}

/// Scan one category's source directory, ordered by id.
pub fn scan_category(root: &Path, category: Category) -> Result<Vec<ResourceDescriptor>> {
    let dir = paths::source_dir(root, category);
    if !dir.is_dir() {
        return Err(CuratorError::MissingSourceDir(
            category.source_dir().to_string(),
        ));
    }

    let mut entries = Vec::new();
    for dirent in std::fs::read_dir(&dir)? {
        let dirent = dirent?;
        if !dirent.file_type()?.is_dir() {
            continue;
        }
        let dir_name = dirent.file_name().to_string_lossy().into_owned();
        if is_reserved(&dir_name) {
            continue;
        }
        entries.push(read_descriptor(category, &dirent.path(), &dir_name)?);
    }

    entries.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(entries)
}

/// The `_template` placeholder and dot-directories never count as entries.
fn is_reserved(name: &str) -> bool {
    name == paths::RESERVED_TEMPLATE_DIR || name.starts_with('.')
}

fn read_descriptor(category: Category, dir: &Path, dir_name: &str) -> Result<ResourceDescriptor> {
    let rel = format!("{}/{}", category.source_dir(), dir_name);
    let scan_err = |reason: String| CuratorError::Scan {
        dir: rel.clone(),
        reason,
    };

    if paths::validate_id(dir_name).is_err() {
        return Err(scan_err(
            "directory name is not a valid id (lowercase alphanumeric with hyphens)".to_string(),
        ));
    }

    let meta_path = dir.join(category.metadata_file());
    if !meta_path.is_file() {
        return Err(scan_err(format!("missing {}", category.metadata_file())));
    }

    let content = std::fs::read_to_string(&meta_path)?;
    let block = front_matter_block(&content)
        .ok_or_else(|| scan_err("missing front-matter block".to_string()))?;
    let fm: FrontMatter =
        serde_yaml::from_str(block).map_err(|e| scan_err(format!("bad front matter: {e}")))?;

    let name = fm
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| scan_err("front matter is missing required field 'name'".to_string()))?;
    let description = fm.description.filter(|d| !d.trim().is_empty()).ok_or_else(|| {
        scan_err("front matter is missing required field 'description'".to_string())
    })?;

    Ok(ResourceDescriptor {
        id: dir_name.to_string(),
        category,
        name,
        description,
        triggers: fm.triggers,
        version: fm.version,
        path: rel,
    })
}

/// Extract the YAML between the opening `---` line and the next `---` line.
fn front_matter_block(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

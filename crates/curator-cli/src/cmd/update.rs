use super::sync::{self, SyncFlags};
use curator_core::types::Category;
use std::path::Path;

/// `curator update <category>` — sync a single category, leaving the shared
/// config templates alone.
pub fn run(root: &Path, category: &str, flags: &SyncFlags) -> anyhow::Result<()> {
    let category: Category = category.parse()?;
    sync::run(root, flags, Some(category))
}

//! Client sync engine.
//!
//! Reconciles a remote catalog's registries against a project's installation
//! manifest: compute what is missing or changed, then apply each candidate
//! with a per-file merge strategy and a pre-write backup. Fetch failures are
//! isolated to their category or file; the manifest records an install only
//! after the corresponding write has succeeded.

use crate::error::{CuratorError, Result};
use crate::fetch::{self, RemoteSource};
use crate::manifest::Manifest;
use crate::registry::Registry;
use crate::types::{Category, MergeStrategy, ResourceDescriptor};
use crate::{io, paths};
use chrono::Utc;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Tracked config files
// ---------------------------------------------------------------------------

/// A config template distributed with the catalog. The merge strategy is
/// fixed here, by file identity; it is never inferred from content.
pub struct TrackedFile {
    pub remote_path: &'static str,
    pub local_path: &'static str,
    pub strategy: MergeStrategy,
}

pub const TRACKED_FILES: &[TrackedFile] = &[
    TrackedFile {
        remote_path: "config/curator.json",
        local_path: ".curator/config.json",
        strategy: MergeStrategy::Structural,
    },
    TrackedFile {
        remote_path: "config/triggers.txt",
        local_path: ".curator/triggers.txt",
        strategy: MergeStrategy::Append,
    },
];

// ---------------------------------------------------------------------------
// Update computation
// ---------------------------------------------------------------------------

pub enum UpdateCandidate {
    /// A resource present in the remote registry but not in the manifest.
    Resource { descriptor: ResourceDescriptor },
    /// A tracked config file whose remote template differs from the local
    /// copy (after stripping generated markers on both sides).
    ConfigFile {
        file: &'static TrackedFile,
        remote: String,
    },
}

impl UpdateCandidate {
    pub fn label(&self) -> String {
        match self {
            UpdateCandidate::Resource { descriptor } => {
                format!("{}/{}", descriptor.category, descriptor.id)
            }
            UpdateCandidate::ConfigFile { file, .. } => file.local_path.to_string(),
        }
    }

    pub fn strategy(&self) -> MergeStrategy {
        match self {
            UpdateCandidate::Resource { .. } => MergeStrategy::Replace,
            UpdateCandidate::ConfigFile { file, .. } => file.strategy,
        }
    }
}

/// Remote registries, fetched per category so one failure cannot block the
/// others.
pub struct RegistrySet {
    pub registries: Vec<Registry>,
    pub failures: Vec<CuratorError>,
}

pub fn fetch_registries(source: &dyn RemoteSource, categories: &[Category]) -> RegistrySet {
    let mut registries = Vec::new();
    let mut failures = Vec::new();
    for &category in categories {
        match fetch::fetch_registry(source, category) {
            Ok(registry) => registries.push(registry),
            Err(e) => failures.push(e),
        }
    }
    RegistrySet {
        registries,
        failures,
    }
}

pub struct UpdatePlan {
    pub candidates: Vec<UpdateCandidate>,
    pub fetch_failures: Vec<CuratorError>,
}

/// Compute the not-yet-installed resources and changed config templates.
/// `include_config` is off for category-scoped updates.
pub fn compute_updates(
    remote: RegistrySet,
    manifest: &Manifest,
    source: &dyn RemoteSource,
    project: &Path,
    include_config: bool,
) -> Result<UpdatePlan> {
    let mut candidates = Vec::new();
    let mut fetch_failures = remote.failures;

    for registry in &remote.registries {
        if !manifest.tracks(registry.category) {
            continue;
        }
        for entry in &registry.entries {
            if !manifest.is_installed(registry.category, &entry.id) {
                candidates.push(UpdateCandidate::Resource {
                    descriptor: entry.clone(),
                });
            }
        }
    }

    if include_config {
        for file in TRACKED_FILES {
            match source.fetch(file.remote_path) {
                Ok(remote_content) => {
                    let local = io::read_optional(&project.join(file.local_path))?;
                    let differs = match &local {
                        Some(local) => {
                            normalize_generated(local) != normalize_generated(&remote_content)
                        }
                        None => true,
                    };
                    if differs {
                        candidates.push(UpdateCandidate::ConfigFile {
                            file,
                            remote: remote_content,
                        });
                    }
                }
                Err(e) => fetch_failures.push(e),
            }
        }
    }

    Ok(UpdatePlan {
        candidates,
        fetch_failures,
    })
}

/// Strip generated-marker lines so a regenerated file with a fresh marker
/// does not read as a content change.
fn normalize_generated(content: &str) -> String {
    content
        .lines()
        .filter(|line| !is_generated_marker(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_generated_marker(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("<!-- generated by curator") || trimmed.starts_with("# generated by curator")
}

// ---------------------------------------------------------------------------
// Merge strategies
// ---------------------------------------------------------------------------

/// Union remote lines into local: local lines keep their order, new remote
/// lines append, duplicates drop. Blank lines in the local file survive.
pub fn append_merge(local: &str, remote: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut seen = BTreeSet::new();
    for line in local.lines() {
        if line.trim().is_empty() || seen.insert(line) {
            out.push(line);
        }
    }
    for line in remote.lines() {
        if !line.trim().is_empty() && seen.insert(line) {
            out.push(line);
        }
    }
    let mut merged = out.join("\n");
    if !merged.is_empty() {
        merged.push('\n');
    }
    merged
}

/// Add remote keys that are absent locally, at any depth where both sides are
/// objects. Existing local values are never overwritten: the client is the
/// source of local intent, upstream is only additive.
pub fn structural_merge(
    local: Option<&str>,
    remote: &str,
) -> std::result::Result<String, String> {
    let remote_value: serde_json::Value = serde_json::from_str(remote)
        .map_err(|e| format!("remote template is not valid JSON: {e}"))?;

    // No local intent yet: take the template verbatim, so the next sync sees
    // no byte difference.
    let Some(local_str) = local.filter(|s| !s.trim().is_empty()) else {
        return Ok(remote.to_string());
    };

    let mut local_value: serde_json::Value = serde_json::from_str(local_str)
        .map_err(|e| format!("local file is not valid JSON: {e}"))?;
    merge_missing(&mut local_value, &remote_value);

    let mut out = serde_json::to_string_pretty(&local_value).map_err(|e| e.to_string())?;
    out.push('\n');
    Ok(out)
}

fn merge_missing(local: &mut serde_json::Value, remote: &serde_json::Value) {
    if let (serde_json::Value::Object(local_map), serde_json::Value::Object(remote_map)) =
        (local, remote)
    {
        for (key, remote_value) in remote_map {
            match local_map.get_mut(key) {
                Some(local_value) => merge_missing(local_value, remote_value),
                None => {
                    local_map.insert(key.clone(), remote_value.clone());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// One sync invocation's backup scope. The first write to each path snapshots
/// the pre-sync content under `.curator/backups/<stamp>/`; repeat applies in
/// the same session find the backup in place and skip it.
pub struct SyncSession<'a> {
    project: &'a Path,
    stamp: String,
    backed_up: BTreeSet<String>,
}

impl<'a> SyncSession<'a> {
    pub fn new(project: &'a Path) -> Self {
        Self {
            project,
            stamp: Utc::now().format("%Y%m%d-%H%M%S").to_string(),
            backed_up: BTreeSet::new(),
        }
    }

    pub fn backup_dir(&self) -> PathBuf {
        paths::backups_dir(self.project).join(&self.stamp)
    }

    fn backup(&mut self, rel: &str) -> Result<()> {
        if self.backed_up.contains(rel) {
            return Ok(());
        }
        let local = self.project.join(rel);
        if local.exists() {
            io::copy_if_missing(&local, &self.backup_dir().join(rel))?;
        }
        self.backed_up.insert(rel.to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct Applied {
    pub label: String,
    pub strategy: MergeStrategy,
    /// Project-relative path that was written.
    pub path: String,
}

/// Apply one candidate. The manifest is marked only after the write succeeds,
/// so a failed apply never records a phantom install.
pub fn apply_update(
    session: &mut SyncSession,
    source: &dyn RemoteSource,
    manifest: &mut Manifest,
    candidate: &UpdateCandidate,
    force: bool,
) -> Result<Applied> {
    let backup = manifest.preferences.backup_before_sync;
    match candidate {
        UpdateCandidate::Resource { descriptor } => {
            let category = descriptor.category;
            let remote_rel = format!("{}/{}", descriptor.path, category.metadata_file());
            let content = source.fetch(&remote_rel)?;
            let local_rel = format!(
                "{}/{}/{}/{}",
                paths::CURATOR_DIR,
                category.source_dir(),
                descriptor.id,
                category.metadata_file()
            );
            write_with_backup(session, &local_rel, content.as_bytes(), backup)?;
            manifest.mark_installed(category, &descriptor.id);
            Ok(Applied {
                label: candidate.label(),
                strategy: MergeStrategy::Replace,
                path: local_rel,
            })
        }
        UpdateCandidate::ConfigFile { file, remote } => {
            let strategy = if force {
                MergeStrategy::Replace
            } else {
                file.strategy
            };
            let local = io::read_optional(&session.project.join(file.local_path))?;
            let merged = match strategy {
                MergeStrategy::Replace => remote.clone(),
                MergeStrategy::Append => append_merge(local.as_deref().unwrap_or(""), remote),
                MergeStrategy::Structural => structural_merge(local.as_deref(), remote)
                    .map_err(|reason| CuratorError::Apply {
                        path: file.local_path.to_string(),
                        reason,
                    })?,
            };
            write_with_backup(session, file.local_path, merged.as_bytes(), backup)?;
            Ok(Applied {
                label: candidate.label(),
                strategy,
                path: file.local_path.to_string(),
            })
        }
    }
}

fn write_with_backup(
    session: &mut SyncSession,
    rel: &str,
    data: &[u8],
    backup: bool,
) -> Result<()> {
    if backup {
        session.backup(rel)?;
    }
    io::atomic_write(&session.project.join(rel), data).map_err(|e| CuratorError::Apply {
        path: rel.to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Post-sync verification
// ---------------------------------------------------------------------------

/// Check that every install the manifest records actually exists on disk.
/// Returns the missing paths.
pub fn verify_installed(project: &Path, manifest: &Manifest) -> Vec<String> {
    let mut missing = Vec::new();
    for (&category, ids) in &manifest.installed {
        for id in ids {
            let path = paths::installed_entry_file(project, category, id);
            if !path.is_file() {
                missing.push(path.display().to_string());
            }
        }
    }
    missing
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

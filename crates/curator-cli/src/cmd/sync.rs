use curator_core::fetch::{self, HttpSource};
use curator_core::manifest::Manifest;
use curator_core::sync;
use curator_core::types::Category;
use std::path::Path;

#[derive(clap::Args)]
pub struct SyncFlags {
    /// Apply updates without asking for approval
    #[arg(long)]
    pub yes: bool,

    /// Compute and report updates without applying anything
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress informational output (failures still print)
    #[arg(long)]
    pub quiet: bool,

    /// Overwrite local files regardless of merge strategy
    #[arg(long)]
    pub force: bool,

    /// Catalog base URL to sync from
    #[arg(long)]
    pub source: Option<String>,
}

/// `curator sync` — reconcile the remote catalog with this project.
///
/// `scope` narrows the sync to one category (the `update` command); a scoped
/// sync skips the shared config templates.
pub fn run(root: &Path, flags: &SyncFlags, scope: Option<Category>) -> anyhow::Result<()> {
    let info = |msg: String| {
        if !flags.quiet {
            println!("{msg}");
        }
    };

    let source_url = flags
        .source
        .clone()
        .unwrap_or_else(|| fetch::DEFAULT_SOURCE.to_string());
    let source = HttpSource::new(&source_url);
    let mut manifest = Manifest::load_or_default(root)?;

    let categories: Vec<Category> = match scope {
        Some(category) => vec![category],
        None => manifest.tracking.clone(),
    };

    let remote = sync::fetch_registries(&source, &categories);
    let plan = sync::compute_updates(remote, &manifest, &source, root, scope.is_none())?;

    for failure in &plan.fetch_failures {
        eprintln!("fetch failure: {failure}");
    }

    if plan.candidates.is_empty() {
        info("Everything up to date.".to_string());
    } else {
        info(format!("{} update(s) available:", plan.candidates.len()));
        for candidate in &plan.candidates {
            info(format!(
                "  {} [{}]",
                candidate.label(),
                candidate.strategy()
            ));
        }
    }

    let approved = flags.yes || manifest.preferences.auto_approve;
    if flags.dry_run || !approved {
        if !flags.dry_run && !approved && !plan.candidates.is_empty() {
            info("Nothing applied. Re-run with --yes to apply.".to_string());
        }
        if !plan.fetch_failures.is_empty() {
            anyhow::bail!(
                "sync incomplete: {} fetch failure(s)",
                plan.fetch_failures.len()
            );
        }
        return Ok(());
    }

    let mut session = sync::SyncSession::new(root);
    let mut applied = 0usize;
    let mut failed = 0usize;
    for candidate in &plan.candidates {
        match sync::apply_update(&mut session, &source, &mut manifest, candidate, flags.force) {
            Ok(outcome) => {
                applied += 1;
                // Persist each install as it lands so a later failure cannot
                // roll back earlier successes.
                manifest.save(root)?;
                info(format!("  applied {} [{}]", outcome.label, outcome.strategy));
            }
            Err(e) => {
                failed += 1;
                eprintln!("  failed  {}: {e}", candidate.label());
            }
        }
    }

    manifest.touch_last_sync();
    manifest.save(root)?;

    let missing = sync::verify_installed(root, &manifest);
    for path in &missing {
        eprintln!("missing after sync: {path}");
    }

    info(format!(
        "Sync complete: {applied} applied, {failed} failed, {} fetch failure(s).",
        plan.fetch_failures.len()
    ));

    if failed > 0 || !plan.fetch_failures.is_empty() || !missing.is_empty() {
        anyhow::bail!("sync finished with errors");
    }
    Ok(())
}

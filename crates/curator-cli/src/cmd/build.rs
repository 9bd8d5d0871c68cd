use curator_core::docs::{self, Counts};
use curator_core::registry::Registry;
use curator_core::scanner;
use curator_core::types::Category;
use std::path::Path;

/// `curator build` — scan the source directories, rebuild both registries,
/// patch tracked facts into downstream docs, and regenerate the skill index.
///
/// A failed scan aborts that category's rebuild but not the other's. Doc
/// updates need both counts and are skipped when either category failed.
pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Building catalog registries in: {}", root.display());

    let mut scan_errors = Vec::new();
    let mut counts = [0usize; 2];
    let mut scans = Vec::new();
    for (i, &category) in Category::all().iter().enumerate() {
        match scanner::scan_category(root, category) {
            Ok(entries) => {
                counts[i] = entries.len();
                scans.push(Some(entries));
            }
            Err(e) => {
                scan_errors.push(e.to_string());
                scans.push(None);
            }
        }
    }
    let [skill_count, tool_count] = counts;

    let mut skill_registry = None;
    for (i, &category) in Category::all().iter().enumerate() {
        let Some(entries) = scans[i].take() else {
            continue;
        };
        let ratio_count = (category == Category::Skill).then_some(tool_count);
        let registry = Registry::rebuild(root, category, entries, ratio_count)?;
        println!("  {}: {} entries", category.registry_file(), registry.count);
        if category == Category::Skill {
            skill_registry = Some(registry);
        }
    }

    if scan_errors.is_empty() {
        let counts = Counts {
            skills: skill_count,
            tools: tool_count,
        };
        let drifts = docs::update_documents(root, &counts)?;
        for drift in &drifts {
            println!("  warning: structural drift in {drift}");
        }

        if let Some(registry) = &skill_registry {
            docs::write_skill_index(root, registry)?;
            println!("  {}: regenerated", curator_core::paths::SKILL_INDEX_FILE);
        }
    } else {
        println!("  skipping doc updates: not all categories scanned cleanly");
    }

    if !scan_errors.is_empty() {
        for e in &scan_errors {
            eprintln!("  {e}");
        }
        anyhow::bail!(
            "build failed for {} of {} categories",
            scan_errors.len(),
            Category::all().len()
        );
    }

    println!("Build complete.");
    Ok(())
}

//! Consistency validator — an ordered battery of pure-read checks.
//!
//! Every check runs to completion and lands in the report; a single
//! invocation surfaces every inconsistency at once. Nothing here mutates
//! state, so the battery can run independently of a build to detect drift
//! from manual edits.

use crate::docs::{self, Counts};
use crate::registry::Registry;
use crate::relationships::{RelationshipMap, COVERAGE_EXEMPT};
use crate::scanner;
use crate::types::{Category, ResourceDescriptor};
use crate::{error::Result, io, paths};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub checks: Vec<CheckResult>,
}

impl CheckReport {
    fn pass(&mut self, name: impl Into<String>, detail: impl Into<String>) {
        self.checks.push(CheckResult {
            name: name.into(),
            passed: true,
            detail: detail.into(),
        });
    }

    fn fail(&mut self, name: impl Into<String>, detail: impl Into<String>) {
        self.checks.push(CheckResult {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        });
    }

    pub fn ok(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }
}

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------

pub fn run_checks(root: &Path) -> Result<CheckReport> {
    let mut report = CheckReport::default();

    let mut scans: Vec<Option<Vec<ResourceDescriptor>>> = Vec::new();
    let mut registries: Vec<Option<Registry>> = Vec::new();

    for &category in Category::all() {
        let scan = match scanner::scan_category(root, category) {
            Ok(entries) => Some(entries),
            Err(e) => {
                report.fail(format!("{category}:scan"), e.to_string());
                None
            }
        };
        let registry = match Registry::load(root, category) {
            Ok(r) => Some(r),
            Err(e) => {
                report.fail(format!("{category}:registry"), e.to_string());
                None
            }
        };

        if let (Some(scan), Some(registry)) = (&scan, &registry) {
            check_registry_vs_disk(&mut report, category, scan, registry);
        }

        scans.push(scan);
        registries.push(registry);
    }

    check_cross_registry(&mut report, &registries);
    check_documents(&mut report, root, &scans, &registries)?;
    check_relationships(&mut report, root, &scans, &registries)?;

    Ok(report)
}

// ---------------------------------------------------------------------------
// Group 1: registry vs disk
// ---------------------------------------------------------------------------

fn check_registry_vs_disk(
    report: &mut CheckReport,
    category: Category,
    disk: &[ResourceDescriptor],
    registry: &Registry,
) {
    let name = |check: &str| format!("{category}:{check}");

    if registry.count == disk.len() && registry.entries.len() == registry.count {
        report.pass(name("count"), format!("{} entries", registry.count));
    } else {
        report.fail(
            name("count"),
            format!(
                "registry says {} (with {} entries), disk has {}",
                registry.count,
                registry.entries.len(),
                disk.len()
            ),
        );
    }

    let disk_ids: BTreeSet<&str> = disk.iter().map(|e| e.id.as_str()).collect();
    let registry_ids: BTreeSet<&str> = registry.ids().collect();
    let orphans: Vec<&str> = registry_ids.difference(&disk_ids).copied().collect();
    let omissions: Vec<&str> = disk_ids.difference(&registry_ids).copied().collect();
    if orphans.is_empty() && omissions.is_empty() {
        report.pass(name("membership"), "no orphans, no omissions");
    } else {
        report.fail(
            name("membership"),
            format!(
                "orphaned in registry: [{}]; missing from registry: [{}]",
                orphans.join(", "),
                omissions.join(", ")
            ),
        );
    }

    let untriggered: Vec<&str> = registry
        .entries
        .iter()
        .filter(|e| e.triggers.is_empty())
        .map(|e| e.id.as_str())
        .collect();
    if untriggered.is_empty() {
        report.pass(name("metadata"), "every entry declares trigger keywords");
    } else {
        report.fail(
            name("metadata"),
            format!("entries without trigger keywords: [{}]", untriggered.join(", ")),
        );
    }
}

// ---------------------------------------------------------------------------
// Group 2: cross-registry
// ---------------------------------------------------------------------------

fn check_cross_registry(report: &mut CheckReport, registries: &[Option<Registry>]) {
    let (Some(skills), Some(tools)) = (&registries[0], &registries[1]) else {
        return; // already reported as missing registries
    };
    let expected = format!("{}:{}", skills.count, tools.count);
    match &skills.tool_ratio {
        Some(ratio) if *ratio == expected => {
            report.pass("cross-registry:ratio", format!("toolRatio {ratio}"));
        }
        Some(ratio) => report.fail(
            "cross-registry:ratio",
            format!("toolRatio is '{ratio}', expected '{expected}'"),
        ),
        None => report.fail(
            "cross-registry:ratio",
            format!("skill registry has no toolRatio, expected '{expected}'"),
        ),
    }
}

// ---------------------------------------------------------------------------
// Group 3: documents vs registry
// ---------------------------------------------------------------------------

fn check_documents(
    report: &mut CheckReport,
    root: &Path,
    scans: &[Option<Vec<ResourceDescriptor>>],
    registries: &[Option<Registry>],
) -> Result<()> {
    // Expected values come from the source of truth: the scan when it
    // succeeded, the registry otherwise.
    let counts = match (&scans[0], &scans[1], &registries[0], &registries[1]) {
        (Some(s), Some(t), _, _) => Counts {
            skills: s.len(),
            tools: t.len(),
        },
        (_, _, Some(s), Some(t)) => Counts {
            skills: s.count,
            tools: t.count,
        },
        _ => {
            report.fail(
                "docs:facts",
                "skipped: neither scan nor registries available for both categories",
            );
            return Ok(());
        }
    };

    for tf in docs::TRACKED_FACTS {
        let name = format!("doc:{}:{}", tf.doc, tf.fact);
        let expected = tf.fact.value(&counts);
        match io::read_optional(&root.join(tf.doc))? {
            None => report.fail(name, "tracked document does not exist".to_string()),
            Some(content) => match docs::extract(&content, tf.anchor) {
                Some(actual) if actual == expected => {
                    report.pass(name, format!("{} = {expected}", tf.fact));
                }
                Some(actual) => report.fail(
                    name,
                    format!("document says {actual}, expected {expected}"),
                ),
                None => report.fail(name, format!("anchor not found: /{}/", tf.anchor)),
            },
        }
    }

    if let Some(skills) = &registries[0] {
        let expected = docs::generate_skill_index(skills);
        match io::read_optional(&paths::skill_index_path(root))? {
            Some(actual) if actual == expected => {
                report.pass("doc:skill-index", "matches a fresh regeneration");
            }
            Some(_) => report.fail(
                "doc:skill-index",
                format!("{} is stale; rerun 'curator build'", paths::SKILL_INDEX_FILE),
            ),
            None => report.fail(
                "doc:skill-index",
                format!("{} does not exist", paths::SKILL_INDEX_FILE),
            ),
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Group 4: relationships
// ---------------------------------------------------------------------------

fn check_relationships(
    report: &mut CheckReport,
    root: &Path,
    scans: &[Option<Vec<ResourceDescriptor>>],
    registries: &[Option<Registry>],
) -> Result<()> {
    let map = RelationshipMap::load(root)?;

    let known: Vec<BTreeSet<String>> = Category::all()
        .iter()
        .enumerate()
        .map(|(i, _)| match (&scans[i], &registries[i]) {
            (Some(scan), _) => scan.iter().map(|e| e.id.clone()).collect(),
            (None, Some(registry)) => registry.ids().map(str::to_string).collect(),
            (None, None) => BTreeSet::new(),
        })
        .collect();
    let known_skills = &known[0];
    let known_tools = &known[1];

    let mut dangling = 0usize;
    for edge in map.edges() {
        if !known_skills.contains(edge.from) {
            report.fail(
                "relationships:reference",
                format!("edges declared for unknown skill '{}'", edge.from),
            );
            dangling += 1;
            continue;
        }
        let resolves = match edge.to_kind {
            Category::Skill => known_skills.contains(edge.to),
            Category::Tool => known_tools.contains(edge.to),
        };
        if !resolves {
            report.fail(
                "relationships:reference",
                format!(
                    "edge {} -> {}/{} points at a nonexistent resource",
                    edge.from,
                    edge.to_kind,
                    edge.to
                ),
            );
            dangling += 1;
        }
    }
    if dangling == 0 {
        report.pass("relationships:reference", "every edge endpoint resolves");
    }

    let uncovered: Vec<&str> = known_skills
        .iter()
        .map(String::as_str)
        .filter(|id| !map.covers(id) && !COVERAGE_EXEMPT.contains(id))
        .collect();
    if uncovered.is_empty() {
        report.pass(
            "relationships:coverage",
            "every skill participates in at least one edge",
        );
    } else {
        report.fail(
            "relationships:coverage",
            format!("skills with no relationships: [{}]", uncovered.join(", ")),
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use tempfile::TempDir;

    fn write_entry(root: &Path, category: Category, id: &str) {
        let dir = root.join(category.source_dir()).join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(category.metadata_file()),
            format!("---\nname: {id}\ndescription: does {id}\ntriggers: [{id}]\n---\n"),
        )
        .unwrap();
    }

    fn write_relationships(root: &Path, json: &str) {
        let path = root.join(paths::RELATIONSHIPS_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    fn write_docs(root: &Path, skills: usize, tools: usize) {
        std::fs::write(
            root.join("README.md"),
            format!("{skills} curated skills and {tools} companion tools.\n"),
        )
        .unwrap();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::write(
            root.join("docs/CATALOG.md"),
            format!(
                "Total skills: **{skills}**\nTotal tools: **{tools}**\n\
                 Skill-to-tool ratio: **{skills}:{tools}**\n"
            ),
        )
        .unwrap();
        std::fs::write(
            root.join("AGENTS.md"),
            format!("catalog of {skills} skills\n"),
        )
        .unwrap();
    }

    /// A catalog where everything agrees: two skills, one tool, full edges.
    fn consistent_catalog() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_entry(root, Category::Skill, "code-review");
        write_entry(root, Category::Skill, "docs-writer");
        write_entry(root, Category::Tool, "lint-runner");

        let skills = scanner::scan_category(root, Category::Skill).unwrap();
        let tools = scanner::scan_category(root, Category::Tool).unwrap();
        let tool_count = tools.len();
        let skill_registry =
            Registry::rebuild(root, Category::Skill, skills, Some(tool_count)).unwrap();
        Registry::rebuild(root, Category::Tool, tools, None).unwrap();

        write_docs(root, 2, 1);
        docs::write_skill_index(root, &skill_registry).unwrap();
        write_relationships(
            root,
            r#"{
                "code-review": { "tools": ["lint-runner"], "skills": ["docs-writer"] }
            }"#,
        );
        dir
    }

    #[test]
    fn consistent_catalog_passes() {
        let dir = consistent_catalog();
        let report = run_checks(dir.path()).unwrap();
        assert!(report.ok(), "unexpected failures: {:?}", report.checks);
    }

    #[test]
    fn stale_doc_count_fails_doc_check() {
        let dir = consistent_catalog();
        write_docs(dir.path(), 36, 1);

        let report = run_checks(dir.path()).unwrap();
        assert!(!report.ok());
        let failing: Vec<&CheckResult> =
            report.checks.iter().filter(|c| !c.passed).collect();
        assert!(failing.iter().all(|c| c.name.starts_with("doc:")));
        assert!(failing
            .iter()
            .any(|c| c.detail.contains("document says 36, expected 2")));
    }

    #[test]
    fn removed_entry_fails_count_and_membership() {
        let dir = consistent_catalog();
        std::fs::remove_dir_all(dir.path().join("skills/docs-writer")).unwrap();

        let report = run_checks(dir.path()).unwrap();
        let failed: Vec<&str> = report
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect();
        assert!(failed.contains(&"skills:count"));
        assert!(failed.contains(&"skills:membership"));
    }

    #[test]
    fn dangling_edge_reports_exactly_one_referential_failure() {
        let dir = consistent_catalog();
        write_relationships(
            dir.path(),
            r#"{
                "code-review": { "tools": ["lint-runner", "removed-tool"], "skills": ["docs-writer"] }
            }"#,
        );

        let report = run_checks(dir.path()).unwrap();
        let referential: Vec<&CheckResult> = report
            .checks
            .iter()
            .filter(|c| c.name == "relationships:reference" && !c.passed)
            .collect();
        assert_eq!(referential.len(), 1);
        assert!(referential[0].detail.contains("removed-tool"));
    }

    #[test]
    fn uncovered_skill_fails_coverage() {
        let dir = consistent_catalog();
        write_relationships(dir.path(), r#"{"code-review": {"tools": ["lint-runner"]}}"#);

        let report = run_checks(dir.path()).unwrap();
        let coverage = report
            .checks
            .iter()
            .find(|c| c.name == "relationships:coverage")
            .unwrap();
        assert!(!coverage.passed);
        assert!(coverage.detail.contains("docs-writer"));
    }

    #[test]
    fn missing_triggers_fail_metadata_check() {
        let dir = consistent_catalog();
        let root = dir.path();
        let entry = root.join("skills/quiet-skill");
        std::fs::create_dir_all(&entry).unwrap();
        std::fs::write(
            entry.join("SKILL.md"),
            "---\nname: Quiet\ndescription: no triggers\n---\n",
        )
        .unwrap();
        // Rebuild so count/membership agree and only metadata fails.
        let skills = scanner::scan_category(root, Category::Skill).unwrap();
        let skill_registry = Registry::rebuild(root, Category::Skill, skills, Some(1)).unwrap();
        docs::write_skill_index(root, &skill_registry).unwrap();
        write_docs(root, 3, 1);
        write_relationships(
            root,
            r#"{
                "code-review": { "tools": ["lint-runner"], "skills": ["docs-writer", "quiet-skill"] }
            }"#,
        );

        let report = run_checks(root).unwrap();
        let metadata = report
            .checks
            .iter()
            .find(|c| c.name == "skills:metadata")
            .unwrap();
        assert!(!metadata.passed);
        assert!(metadata.detail.contains("quiet-skill"));
    }

    #[test]
    fn tampered_ratio_fails_cross_registry() {
        let dir = consistent_catalog();
        let path = dir.path().join("registry/skills.json");
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, content.replace("\"2:1\"", "\"9:1\"")).unwrap();

        let report = run_checks(dir.path()).unwrap();
        let ratio = report
            .checks
            .iter()
            .find(|c| c.name == "cross-registry:ratio")
            .unwrap();
        assert!(!ratio.passed);
    }

    #[test]
    fn stale_skill_index_fails() {
        let dir = consistent_catalog();
        std::fs::write(dir.path().join(paths::SKILL_INDEX_FILE), "hand edited\n").unwrap();

        let report = run_checks(dir.path()).unwrap();
        let index = report
            .checks
            .iter()
            .find(|c| c.name == "doc:skill-index")
            .unwrap();
        assert!(!index.passed);
    }

    #[test]
    fn missing_registry_is_a_failed_check_not_a_crash() {
        let dir = consistent_catalog();
        std::fs::remove_file(dir.path().join("registry/tools.json")).unwrap();

        let report = run_checks(dir.path()).unwrap();
        assert!(!report.ok());
        assert!(report
            .checks
            .iter()
            .any(|c| c.name == "tools:registry" && !c.passed));
    }

    #[test]
    fn validator_never_mutates() {
        let dir = consistent_catalog();
        write_docs(dir.path(), 36, 1); // introduce drift
        let before = std::fs::read_to_string(dir.path().join("README.md")).unwrap();

        run_checks(dir.path()).unwrap();
        let after = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert_eq!(before, after);
    }
}

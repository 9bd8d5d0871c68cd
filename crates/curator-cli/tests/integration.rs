use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn curator(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("curator").unwrap();
    cmd.current_dir(dir.path()).env("CURATOR_ROOT", dir.path());
    cmd
}

fn write_entry(root: &Path, category: &str, meta_file: &str, id: &str) {
    let dir = root.join(category).join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(meta_file),
        format!("---\nname: {id}\ndescription: does {id}\ntriggers: [{id}]\n---\n\n# {id}\n"),
    )
    .unwrap();
}

fn write_docs(root: &Path, skills: usize, tools: usize) {
    std::fs::write(
        root.join("README.md"),
        format!("# Catalog\n\n{skills} curated skills and {tools} companion tools.\n"),
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
        format!("Work from the catalog of {skills} skills.\n"),
    )
    .unwrap();
}

fn write_relationships(root: &Path, json: &str) {
    let path = root.join("registry/relationships.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, json).unwrap();
}

/// Two skills, one tool, docs deliberately stale (36/9).
fn scaffold_catalog(dir: &TempDir) {
    let root = dir.path();
    write_entry(root, "skills", "SKILL.md", "code-review");
    write_entry(root, "skills", "SKILL.md", "docs-writer");
    write_entry(root, "tools", "TOOL.md", "lint-runner");
    write_docs(root, 36, 9);
    write_relationships(
        root,
        r#"{"code-review": {"tools": ["lint-runner"], "skills": ["docs-writer"]}}"#,
    );
}

// ---------------------------------------------------------------------------
// curator build
// ---------------------------------------------------------------------------

#[test]
fn build_creates_registries() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);

    curator(&dir).arg("build").assert().success();

    let skills = std::fs::read_to_string(dir.path().join("registry/skills.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&skills).unwrap();
    assert_eq!(value["count"], 2);
    assert_eq!(value["toolRatio"], "2:1");
    assert_eq!(value["skills"].as_array().unwrap().len(), 2);

    let tools = std::fs::read_to_string(dir.path().join("registry/tools.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&tools).unwrap();
    assert_eq!(value["count"], 1);
}

#[test]
fn build_rewrites_stale_doc_counts() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);

    curator(&dir).arg("build").assert().success();

    let readme = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert!(readme.contains("2 curated skills and 1 companion tools"));
    let catalog = std::fs::read_to_string(dir.path().join("docs/CATALOG.md")).unwrap();
    assert!(catalog.contains("Skill-to-tool ratio: **2:1**"));
    let agents = std::fs::read_to_string(dir.path().join("AGENTS.md")).unwrap();
    assert!(agents.contains("catalog of 2 skills"));
}

#[test]
fn build_generates_skill_index() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);

    curator(&dir).arg("build").assert().success();

    let index = std::fs::read_to_string(dir.path().join("docs/skill-index.md")).unwrap();
    assert!(index.starts_with("<!-- generated by curator"));
    assert!(index.contains("## code-review"));
    assert!(index.contains("## docs-writer"));
}

#[test]
fn build_twice_leaves_docs_byte_identical() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);

    curator(&dir).arg("build").assert().success();
    let readme_first = std::fs::read(dir.path().join("README.md")).unwrap();
    let index_first = std::fs::read(dir.path().join("docs/skill-index.md")).unwrap();
    let skills_first: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("registry/skills.json")).unwrap(),
    )
    .unwrap();

    curator(&dir).arg("build").assert().success();
    assert_eq!(std::fs::read(dir.path().join("README.md")).unwrap(), readme_first);
    assert_eq!(
        std::fs::read(dir.path().join("docs/skill-index.md")).unwrap(),
        index_first
    );
    let skills_second: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("registry/skills.json")).unwrap(),
    )
    .unwrap();
    // Identical modulo the rebuild timestamp.
    assert_eq!(skills_second["skills"], skills_first["skills"]);
    assert_eq!(skills_second["count"], skills_first["count"]);
    assert_eq!(skills_second["toolRatio"], skills_first["toolRatio"]);
}

#[test]
fn build_fails_on_malformed_entry() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);
    let broken = dir.path().join("skills/broken");
    std::fs::create_dir_all(&broken).unwrap();
    std::fs::write(broken.join("SKILL.md"), "---\ndescription: no name\n---\n").unwrap();

    curator(&dir)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("skills/broken"));
}

#[test]
fn adding_an_entry_bumps_counts_everywhere() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);
    curator(&dir).arg("build").assert().success();

    write_entry(dir.path(), "skills", "SKILL.md", "release-notes");
    curator(&dir).arg("build").assert().success();

    let skills = std::fs::read_to_string(dir.path().join("registry/skills.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&skills).unwrap();
    assert_eq!(value["count"], 3);
    let readme = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert!(readme.contains("3 curated skills"));
}

// ---------------------------------------------------------------------------
// curator validate
// ---------------------------------------------------------------------------

#[test]
fn validate_passes_after_build() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);
    curator(&dir).arg("build").assert().success();

    curator(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 failed"));
}

#[test]
fn validate_fails_before_build() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);

    curator(&dir).arg("validate").assert().failure();
}

#[test]
fn validate_catches_manual_doc_edit() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);
    curator(&dir).arg("build").assert().success();

    // Someone "fixes" the count by hand.
    write_docs(dir.path(), 36, 9);

    curator(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("document says 36, expected 2"));
}

#[test]
fn validate_reports_dangling_edge() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);
    curator(&dir).arg("build").assert().success();

    write_relationships(
        dir.path(),
        r#"{"code-review": {"tools": ["vanished-tool"], "skills": ["docs-writer"]}}"#,
    );

    curator(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("vanished-tool"));
}

#[test]
fn validate_json_emits_check_report() {
    let dir = TempDir::new().unwrap();
    scaffold_catalog(&dir);
    curator(&dir).arg("build").assert().success();

    let output = curator(&dir).args(["validate", "--json"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(value["checks"].as_array().unwrap().len() > 5);
}

// ---------------------------------------------------------------------------
// curator sync
// ---------------------------------------------------------------------------

fn skill_entry_json(id: &str) -> String {
    format!(
        r#"{{"id": "{id}", "category": "skills", "name": "{id}", "description": "does {id}",
            "triggers": ["{id}"], "path": "skills/{id}"}}"#
    )
}

fn tool_entry_json(id: &str) -> String {
    format!(
        r#"{{"id": "{id}", "category": "tools", "name": "{id}", "description": "does {id}",
            "triggers": ["{id}"], "path": "tools/{id}"}}"#
    )
}

fn skills_registry_json(ids: &[&str], tool_count: usize) -> String {
    let entries: Vec<String> = ids.iter().map(|id| skill_entry_json(id)).collect();
    format!(
        r#"{{"skills": [{}], "count": {}, "toolRatio": "{}:{}", "lastUpdated": "2026-08-01T00:00:00Z"}}"#,
        entries.join(","),
        ids.len(),
        ids.len(),
        tool_count
    )
}

fn tools_registry_json(ids: &[&str]) -> String {
    let entries: Vec<String> = ids.iter().map(|id| tool_entry_json(id)).collect();
    format!(
        r#"{{"tools": [{}], "count": {}, "lastUpdated": "2026-08-01T00:00:00Z"}}"#,
        entries.join(","),
        ids.len()
    )
}

/// Mock a complete remote catalog: both registries, entry files, config
/// templates. Returns the server; mocks live as long as it does.
fn mock_catalog(server: &mut mockito::ServerGuard) {
    server
        .mock("GET", "/registry/skills.json")
        .with_body(skills_registry_json(&["code-review"], 1))
        .create();
    server
        .mock("GET", "/registry/tools.json")
        .with_body(tools_registry_json(&["lint-runner"]))
        .create();
    server
        .mock("GET", "/skills/code-review/SKILL.md")
        .with_body("---\nname: code-review\ndescription: d\n---\n")
        .create();
    server
        .mock("GET", "/tools/lint-runner/TOOL.md")
        .with_body("---\nname: lint-runner\ndescription: d\n---\n")
        .create();
    server
        .mock("GET", "/config/curator.json")
        .with_body("{\"telemetry\": false}\n")
        .create();
    server
        .mock("GET", "/config/triggers.txt")
        .with_body("review\nlint\n")
        .create();
}

#[test]
fn sync_dry_run_lists_without_applying() {
    let mut server = mockito::Server::new();
    mock_catalog(&mut server);
    let dir = TempDir::new().unwrap();

    curator(&dir)
        .args(["sync", "--dry-run", "--source", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("skills/code-review"))
        .stdout(predicate::str::contains("tools/lint-runner"));

    assert!(!dir.path().join(".curator/skills").exists());
    assert!(!dir.path().join(".curator/manifest.json").exists());
}

#[test]
fn sync_without_approval_applies_nothing() {
    let mut server = mockito::Server::new();
    mock_catalog(&mut server);
    let dir = TempDir::new().unwrap();

    curator(&dir)
        .args(["sync", "--source", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Re-run with --yes"));

    assert!(!dir.path().join(".curator/skills").exists());
}

#[test]
fn sync_yes_installs_and_updates_manifest() {
    let mut server = mockito::Server::new();
    mock_catalog(&mut server);
    let dir = TempDir::new().unwrap();

    curator(&dir)
        .args(["sync", "--yes", "--source", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sync complete"));

    assert!(dir
        .path()
        .join(".curator/skills/code-review/SKILL.md")
        .is_file());
    assert!(dir
        .path()
        .join(".curator/tools/lint-runner/TOOL.md")
        .is_file());
    assert_eq!(
        std::fs::read_to_string(dir.path().join(".curator/triggers.txt")).unwrap(),
        "review\nlint\n"
    );

    let manifest = std::fs::read_to_string(dir.path().join(".curator/manifest.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&manifest).unwrap();
    assert_eq!(value["installed"]["skills"][0], "code-review");
    assert_eq!(value["installed"]["tools"][0], "lint-runner");
    assert!(value["lastSync"].is_string());
}

#[test]
fn second_sync_is_a_no_op() {
    let mut server = mockito::Server::new();
    mock_catalog(&mut server);
    let dir = TempDir::new().unwrap();

    curator(&dir)
        .args(["sync", "--yes", "--source", &server.url()])
        .assert()
        .success();
    curator(&dir)
        .args(["sync", "--yes", "--source", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Everything up to date."));
}

#[test]
fn sync_fetch_failure_is_isolated_per_category() {
    let mut server = mockito::Server::new();
    // skills registry is down; everything else works
    server
        .mock("GET", "/registry/skills.json")
        .with_status(500)
        .create();
    server
        .mock("GET", "/registry/tools.json")
        .with_body(tools_registry_json(&["lint-runner"]))
        .create();
    server
        .mock("GET", "/tools/lint-runner/TOOL.md")
        .with_body("tool content\n")
        .create();
    server
        .mock("GET", "/config/curator.json")
        .with_body("{}\n")
        .create();
    server
        .mock("GET", "/config/triggers.txt")
        .with_body("lint\n")
        .create();
    let dir = TempDir::new().unwrap();

    curator(&dir)
        .args(["sync", "--yes", "--source", &server.url()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("tools/lint-runner"))
        .stderr(predicate::str::contains("registry/skills.json"));

    // The healthy category still synced.
    assert!(dir
        .path()
        .join(".curator/tools/lint-runner/TOOL.md")
        .is_file());
}

#[test]
fn quiet_sync_still_prints_failures() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/registry/skills.json")
        .with_status(500)
        .create();
    server
        .mock("GET", "/registry/tools.json")
        .with_status(500)
        .create();
    let dir = TempDir::new().unwrap();

    let assert = curator(&dir)
        .args(["sync", "--dry-run", "--quiet", "--source", &server.url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fetch failure"));
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout, "");
}

// ---------------------------------------------------------------------------
// curator update <category>
// ---------------------------------------------------------------------------

#[test]
fn update_scopes_to_one_category() {
    let mut server = mockito::Server::new();
    mock_catalog(&mut server);
    let dir = TempDir::new().unwrap();

    curator(&dir)
        .args(["update", "skills", "--yes", "--source", &server.url()])
        .assert()
        .success();

    assert!(dir
        .path()
        .join(".curator/skills/code-review/SKILL.md")
        .is_file());
    // Tools and config templates are out of scope for this command.
    assert!(!dir.path().join(".curator/tools").exists());
    assert!(!dir.path().join(".curator/triggers.txt").exists());
}

#[test]
fn update_rejects_unknown_category() {
    let dir = TempDir::new().unwrap();
    curator(&dir)
        .args(["update", "widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid category"));
}

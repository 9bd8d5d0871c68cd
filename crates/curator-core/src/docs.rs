//! Downstream document maintenance.
//!
//! Two mechanisms, chosen by how much of a file is derived:
//!
//! - Documents that are mostly prose with a few embedded facts (counts,
//!   ratios) are patched in place through a fixed table of anchored
//!   substitutions. Each anchor is a regex whose first capture group is the
//!   value; the surrounding text pins the match so unrelated numbers are
//!   never touched. Values are re-derived from the registries on every run,
//!   so the substitution is byte-idempotent.
//! - `docs/skill-index.md` is entirely registry-derived and is regenerated
//!   wholesale; patching it piecemeal would risk divergence.

use crate::error::Result;
use crate::io;
use crate::registry::Registry;
use crate::paths;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// First line of every fully-generated file.
pub const GENERATED_MARKER: &str = "<!-- generated by curator; do not edit -->";

// ---------------------------------------------------------------------------
// Facts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fact {
    SkillCount,
    ToolCount,
    SkillToolRatio,
}

impl Fact {
    pub fn as_str(self) -> &'static str {
        match self {
            Fact::SkillCount => "skill_count",
            Fact::ToolCount => "tool_count",
            Fact::SkillToolRatio => "skill_tool_ratio",
        }
    }

    pub fn value(self, counts: &Counts) -> String {
        match self {
            Fact::SkillCount => counts.skills.to_string(),
            Fact::ToolCount => counts.tools.to_string(),
            Fact::SkillToolRatio => counts.ratio(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry sizes every derived fact is computed from.
#[derive(Debug, Clone, Copy)]
pub struct Counts {
    pub skills: usize,
    pub tools: usize,
}

impl Counts {
    pub fn ratio(&self) -> String {
        format!("{}:{}", self.skills, self.tools)
    }
}

// ---------------------------------------------------------------------------
// Tracked fact table
// ---------------------------------------------------------------------------

/// One tracked (document, fact, anchor) triple. Adding a tracked fact is a
/// table entry, not new control flow.
pub struct TrackedFact {
    pub doc: &'static str,
    pub fact: Fact,
    /// Regex with exactly one capture group around the embedded value.
    pub anchor: &'static str,
}

pub const TRACKED_FACTS: &[TrackedFact] = &[
    TrackedFact {
        doc: "README.md",
        fact: Fact::SkillCount,
        anchor: r"(\d+) curated skills",
    },
    TrackedFact {
        doc: "README.md",
        fact: Fact::ToolCount,
        anchor: r"(\d+) companion tools",
    },
    TrackedFact {
        doc: "docs/CATALOG.md",
        fact: Fact::SkillCount,
        anchor: r"Total skills: \*\*(\d+)\*\*",
    },
    TrackedFact {
        doc: "docs/CATALOG.md",
        fact: Fact::ToolCount,
        anchor: r"Total tools: \*\*(\d+)\*\*",
    },
    TrackedFact {
        doc: "docs/CATALOG.md",
        fact: Fact::SkillToolRatio,
        anchor: r"Skill-to-tool ratio: \*\*(\d+:\d+)\*\*",
    },
    TrackedFact {
        doc: "AGENTS.md",
        fact: Fact::SkillCount,
        anchor: r"catalog of (\d+) skills",
    },
];

/// Documents appearing in [`TRACKED_FACTS`], deduplicated, table order.
pub fn tracked_docs() -> Vec<&'static str> {
    let mut docs = Vec::new();
    for tf in TRACKED_FACTS {
        if !docs.contains(&tf.doc) {
            docs.push(tf.doc);
        }
    }
    docs
}

// ---------------------------------------------------------------------------
// Drift
// ---------------------------------------------------------------------------

/// A tracked document whose wording no longer contains an expected anchor
/// (or the document itself is gone). Surfaced, never silently skipped.
#[derive(Debug, Clone, Serialize)]
pub struct DocDrift {
    pub doc: String,
    pub detail: String,
}

impl fmt::Display for DocDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.doc, self.detail)
    }
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Patch every tracked fact into its document. Returns structural drift
/// warnings for anchors that no longer match; those documents are left as
/// they are for the affected fact and updated for the rest.
pub fn update_documents(root: &Path, counts: &Counts) -> Result<Vec<DocDrift>> {
    let mut drifts = Vec::new();

    for doc in tracked_docs() {
        let path = root.join(doc);
        let Some(original) = io::read_optional(&path)? else {
            drifts.push(DocDrift {
                doc: doc.to_string(),
                detail: "tracked document does not exist".to_string(),
            });
            continue;
        };

        let mut content = original.clone();
        for tf in TRACKED_FACTS.iter().filter(|tf| tf.doc == doc) {
            match substitute(&content, tf.anchor, &tf.fact.value(counts)) {
                Some(updated) => content = updated,
                None => drifts.push(DocDrift {
                    doc: doc.to_string(),
                    detail: format!("anchor for {} not found: /{}/", tf.fact, tf.anchor),
                }),
            }
        }

        if content != original {
            io::atomic_write(&path, content.as_bytes())?;
        }
    }

    Ok(drifts)
}

/// Replace the first capture group of `anchor` in `content` with `value`,
/// leaving all surrounding text untouched. None if the anchor does not match.
pub fn substitute(content: &str, anchor: &str, value: &str) -> Option<String> {
    // Anchors come from the static table above; a bad pattern is a bug.
    let re = Regex::new(anchor).unwrap();
    let caps = re.captures(content)?;
    let group = caps.get(1)?;
    let mut out = String::with_capacity(content.len());
    out.push_str(&content[..group.start()]);
    out.push_str(value);
    out.push_str(&content[group.end()..]);
    Some(out)
}

/// Read the value currently embedded in `content` for `anchor`.
pub fn extract(content: &str, anchor: &str) -> Option<String> {
    let re = Regex::new(anchor).unwrap();
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|g| g.as_str().to_string())
}

// ---------------------------------------------------------------------------
// Skill index (wholesale generation)
// ---------------------------------------------------------------------------

/// Render the skill index from the registry. Pure; the caller writes it.
pub fn generate_skill_index(registry: &Registry) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_MARKER);
    out.push_str("\n\n# Skill Index\n\n");
    out.push_str(&format!("{} skills available.\n", registry.count));

    for entry in &registry.entries {
        out.push_str(&format!("\n## {}\n\n", entry.name));
        out.push_str(&format!("{}\n\n", entry.description));
        out.push_str(&format!("- id: `{}`\n", entry.id));
        if !entry.triggers.is_empty() {
            out.push_str(&format!("- triggers: {}\n", entry.triggers.join(", ")));
        }
        if let Some(version) = &entry.version {
            out.push_str(&format!("- version: {version}\n"));
        }
    }

    out
}

pub fn write_skill_index(root: &Path, registry: &Registry) -> Result<()> {
    let content = generate_skill_index(registry);
    io::atomic_write(&paths::skill_index_path(root), content.as_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

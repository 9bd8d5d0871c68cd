//! Curated skill relationships — which tools a skill requires and which
//! skills it pairs with.
//!
//! The mapping is maintained by hand in `registry/relationships.json`,
//! independent of the automated scan. The engine never derives or rewrites
//! it; the validator checks referential integrity and coverage.

use crate::error::Result;
use crate::paths;
use crate::types::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Skills that legitimately stand alone and are excluded from the coverage
/// check.
pub const COVERAGE_EXEMPT: &[&str] = &["getting-started"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
}

/// One outgoing edge: `from` requires/enables `to`, where `to` lives in
/// `to_kind`'s registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<'a> {
    pub from: &'a str,
    pub to_kind: Category,
    pub to: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipMap(pub BTreeMap<String, EdgeSet>);

impl RelationshipMap {
    /// Load `registry/relationships.json`. Absent file means no edges yet —
    /// the coverage check will say so entry by entry.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::relationships_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let map: RelationshipMap = serde_json::from_str(&data)?;
        Ok(map)
    }

    pub fn edges(&self) -> Vec<Edge<'_>> {
        let mut out = Vec::new();
        for (from, set) in &self.0 {
            for to in &set.tools {
                out.push(Edge {
                    from,
                    to_kind: Category::Tool,
                    to,
                });
            }
            for to in &set.skills {
                out.push(Edge {
                    from,
                    to_kind: Category::Skill,
                    to,
                });
            }
        }
        out
    }

    /// True if `id` participates in any edge, outgoing or incoming.
    pub fn covers(&self, id: &str) -> bool {
        if self.0.get(id).is_some_and(|s| !s.tools.is_empty() || !s.skills.is_empty()) {
            return true;
        }
        self.0
            .values()
            .any(|set| set.skills.iter().any(|s| s == id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

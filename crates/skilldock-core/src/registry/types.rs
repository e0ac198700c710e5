//! Index document types.
//!
//! An index is either authored (`index.yaml` at an index repo's root) or
//! derived by scanning a skills repo; both produce the same entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The merged (or per-remote) skill catalogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub metadata: IndexMetadata,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One skill as listed in an index. `name` doubles as the install directory
/// name under the managed skills directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub source: SkillSource,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Where a skill comes from. An empty `path` means the repository root is
/// the skill; an empty `tag` means the default branch head.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSource {
    pub repo: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub tag: String,
    /// Name of the configured remote this entry came from. Attached by the
    /// aggregator unless the authored index already names one; round-trips
    /// through the cache.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remote_name: String,
}

impl SkillEntry {
    /// Case-insensitive substring match over name, description, author, and
    /// tags. The empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.author.to_lowercase().contains(&query)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> SkillEntry {
        SkillEntry {
            name: "summarise".to_string(),
            description: "Condense long Documents".to_string(),
            author: "Ada".to_string(),
            tags: vec!["text".to_string(), "writing".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(entry().matches_query(""));
    }

    #[test]
    fn query_matches_each_field_case_insensitively() {
        let e = entry();
        assert!(e.matches_query("SUMM"));
        assert!(e.matches_query("documents"));
        assert!(e.matches_query("ada"));
        assert!(e.matches_query("WRIT"));
        assert!(!e.matches_query("spreadsheet"));
    }

    #[test]
    fn index_yaml_document_parses() {
        let yaml = r#"
version: 1
metadata:
  name: example-registry
  updated_at: 2026-05-01T12:00:00Z
skills:
  - name: summarise
    description: Condense documents
    source:
      repo: https://github.com/example/skills
      path: skills/summarise
    author: Ada
    tags: [text]
  - name: root-skill
    source:
      repo: https://github.com/example/root-skill
"#;
        let index: Index = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(index.version, 1);
        assert_eq!(index.metadata.name, "example-registry");
        assert_eq!(index.skills.len(), 2);
        assert_eq!(index.skills[0].source.path, "skills/summarise");
        assert_eq!(index.skills[1].source.path, "");
        assert_eq!(index.skills[1].source.tag, "");
        assert!(index.skills[1].source.remote_name.is_empty());
    }
}

//! Registry aggregation: fetch, merge, cache, and query skill indices
//! across every configured remote.
//!
//! A remote is either an *index repo* (carries an authored `index.yaml` at
//! its root) or a *skills repo* (plain directories of skills, discovered by
//! scanning for `SKILL.md` files).

mod cache;
mod types;

pub use cache::CacheManager;
pub use types::{Index, IndexMetadata, SkillEntry, SkillSource};

use std::fs;
use std::path::Path;

use tracing::{debug, warn};
use url::Url;

use crate::config::{Config, Remote};
use crate::error::{Error, Result};
use crate::git;
use crate::skillmd;

/// Relative locations scanned for skill directories, in order.
const SEARCH_DIRS: &[&str] = &[".", "skills", "external/skills"];

pub struct Registry<'a> {
    cfg: &'a Config,
    cache: CacheManager,
    index: Option<Index>,
}

impl<'a> Registry<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self {
            cfg,
            cache: CacheManager::new(cfg.layout.cache_path()),
            index: None,
        }
    }

    /// Populate the merged index: from cache when fresh (unless `force`),
    /// otherwise from every configured remote in order.
    ///
    /// Per-remote failures accumulate; the fetch succeeds as long as at
    /// least one remote contributed entries. With no remotes configured the
    /// index is left empty and [`Error::NoRemotesConfigured`] is returned so
    /// callers that can tolerate an empty index may carry on.
    pub fn fetch(&mut self, force: bool) -> Result<()> {
        if !force && self.cache.load().is_ok() && self.cache.is_valid(self.cfg.cache_ttl_hours) {
            self.index = self.cache.get().cloned();
            return Ok(());
        }

        if self.cfg.remotes.is_empty() {
            self.index = Some(Index::default());
            return Err(Error::NoRemotesConfigured);
        }

        let mut skills = Vec::new();
        let mut failures = Vec::new();
        for remote in &self.cfg.remotes {
            match fetch_remote(remote) {
                Ok(entries) => {
                    debug!("remote '{}' contributed {} skills", remote.name, entries.len());
                    skills.extend(entries);
                }
                Err(e) => {
                    warn!("failed to fetch remote '{}': {e}", remote.name);
                    failures.push(format!("{}: {e}", remote.name));
                }
            }
        }

        if skills.is_empty() && !failures.is_empty() {
            self.index = Some(Index::default());
            return Err(Error::AllRemotesFailed { details: failures });
        }

        // Merged-index uniqueness: first writer wins, duplicates dropped.
        let mut seen = std::collections::HashSet::new();
        skills.retain(|s: &SkillEntry| seen.insert(s.name.clone()));

        let index = Index {
            skills,
            ..Default::default()
        };
        if let Err(e) = self.cache.set(index.clone()) {
            warn!("failed to cache index: {e}");
        }
        self.index = Some(index);
        Ok(())
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    /// All skills in the merged index; empty when nothing was fetched.
    pub fn list(&self) -> &[SkillEntry] {
        self.index.as_ref().map(|i| i.skills.as_slice()).unwrap_or(&[])
    }

    /// First entry with the given name. Indexes do not guarantee uniqueness
    /// in practice; first match wins.
    pub fn by_name(&self, name: &str) -> Option<&SkillEntry> {
        self.list().iter().find(|s| s.name == name)
    }

    pub fn search(&self, query: &str) -> Vec<&SkillEntry> {
        self.list()
            .iter()
            .filter(|s| s.matches_query(query))
            .collect()
    }
}

/// Shallow-clone one remote into a scratch directory and read its entries.
/// The scratch directory is removed on every exit path.
fn fetch_remote(remote: &Remote) -> Result<Vec<SkillEntry>> {
    let scratch = tempfile::Builder::new()
        .prefix("skilldock-index-")
        .tempdir()
        .map_err(|e| Error::io("create", std::env::temp_dir(), e))?;

    git::shallow_clone(&remote.url, scratch.path())?;

    let mut entries = read_repo_entries(scratch.path(), &remote.url)?;
    for entry in &mut entries {
        if entry.source.remote_name.is_empty() {
            entry.source.remote_name = remote.name.clone();
        }
    }
    Ok(entries)
}

/// Entries from a cloned repo: the authored `index.yaml` when present,
/// otherwise whatever the scanner discovers.
fn read_repo_entries(repo_dir: &Path, repo_url: &str) -> Result<Vec<SkillEntry>> {
    let index_path = repo_dir.join("index.yaml");
    if let Ok(raw) = fs::read_to_string(&index_path) {
        let index: Index = serde_yaml::from_str(&raw).map_err(|e| Error::Parse {
            path: index_path,
            message: e.to_string(),
        })?;
        return Ok(index.skills);
    }
    scan_repo_dir(repo_dir, repo_url)
}

/// Discover skills in a repo working tree by looking for `SKILL.md` files.
///
/// Recognised shapes, deduplicated by subpath:
/// - a `SKILL.md` at the root: the whole repo is one skill, named after the
///   URL's last path segment;
/// - direct children of `.`, `skills/`, `external/skills/` carrying a
///   `SKILL.md`;
/// - one level deeper for `category/skill-name` layouts.
///
/// Hidden directories are ignored at every level.
pub fn scan_repo_dir(repo_dir: &Path, repo_url: &str) -> Result<Vec<SkillEntry>> {
    let mut skills: Vec<SkillEntry> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let push = |skills: &mut Vec<SkillEntry>,
                seen: &mut std::collections::HashSet<String>,
                name: &str,
                dir: &Path| {
        let subpath = dir
            .strip_prefix(repo_dir)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        if seen.insert(subpath.clone()) {
            skills.push(make_entry(name, dir, subpath, repo_url));
        }
    };

    // Single-skill repo: the root itself is the skill.
    if repo_dir.join("SKILL.md").is_file() {
        let name = root_skill_name(repo_url, repo_dir);
        push(&mut skills, &mut seen, &name, repo_dir);
    }

    for search in SEARCH_DIRS {
        let search_dir = if *search == "." {
            repo_dir.to_path_buf()
        } else {
            repo_dir.join(search)
        };
        let Ok(entries) = fs::read_dir(&search_dir) else {
            continue;
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            let skill_dir = entry.path();

            if skill_dir.join("SKILL.md").is_file() {
                push(&mut skills, &mut seen, &name, &skill_dir);
                continue;
            }

            // category/skill-name layout: look one level deeper.
            let Ok(sub_entries) = fs::read_dir(&skill_dir) else {
                continue;
            };
            for sub in sub_entries.flatten() {
                let sub_name = sub.file_name().to_string_lossy().into_owned();
                if sub_name.starts_with('.') || !sub.path().is_dir() {
                    continue;
                }
                if sub.path().join("SKILL.md").is_file() {
                    push(&mut skills, &mut seen, &sub_name, &sub.path());
                }
            }
        }
    }

    if skills.is_empty() {
        return Err(Error::RemoteEmpty {
            url: repo_url.to_string(),
        });
    }
    Ok(skills)
}

fn make_entry(name: &str, skill_dir: &Path, subpath: String, repo_url: &str) -> SkillEntry {
    let description = fs::read_to_string(skill_dir.join("SKILL.md"))
        .map(|content| skillmd::extract_description(&content))
        .unwrap_or_default();
    SkillEntry {
        name: name.to_string(),
        description,
        source: SkillSource {
            repo: repo_url.to_string(),
            path: subpath,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Name for a repo-root skill, derived from the URL's last path segment with
/// any `.git` suffix stripped. Handles SCP-style URLs and falls back to the
/// clone directory name.
fn root_skill_name(repo_url: &str, repo_dir: &Path) -> String {
    if let Ok(parsed) = Url::parse(repo_url) {
        if parsed.host().is_some() || parsed.scheme() == "file" {
            let path = parsed.path().trim_end_matches(".git");
            if let Some(base) = path.trim_matches('/').split('/').next_back() {
                if !base.is_empty() {
                    return base.to_string();
                }
            }
        }
    }

    // SCP-style: git@github.com:owner/repo.git
    if let Some((_, tail)) = repo_url.rsplit_once(':') {
        let tail = tail.trim_end_matches(".git").trim_matches('/');
        if let Some(base) = tail.split('/').next_back() {
            if !base.is_empty() {
                return base.to_string();
            }
        }
    }

    let stripped = repo_url.trim_end_matches(".git").trim_end_matches('/');
    if let Some(base) = stripped.rsplit('/').next() {
        if !base.is_empty() {
            return base.to_string();
        }
    }
    repo_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "skill".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_skill(base: &Path, parts: &[&str]) {
        let mut dir = base.to_path_buf();
        for part in parts {
            dir.push(part);
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("SKILL.md"),
            "---\ndescription: test skill\n---\n# Test Skill\n",
        )
        .unwrap();
    }

    fn names(entries: &[SkillEntry]) -> Vec<String> {
        let mut names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn single_skill_repo_is_named_after_the_url() {
        let temp = tempfile::tempdir().unwrap();
        create_skill(temp.path(), &[]);

        let entries = scan_repo_dir(temp.path(), "https://x/y/widget.git").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "widget");
        assert_eq!(entries[0].source.path, "");
        assert_eq!(entries[0].description, "test skill");
    }

    #[test]
    fn nested_and_flat_skills_are_both_found() {
        let temp = tempfile::tempdir().unwrap();
        create_skill(temp.path(), &["flat-skill"]);
        create_skill(temp.path(), &["category", "nested-skill"]);

        let entries = scan_repo_dir(temp.path(), "https://example.com/repo.git").unwrap();
        assert_eq!(names(&entries), vec!["flat-skill", "nested-skill"]);

        let nested = entries.iter().find(|e| e.name == "nested-skill").unwrap();
        assert_eq!(nested.source.path, "category/nested-skill");
    }

    #[test]
    fn category_layout_under_skills_dir() {
        let temp = tempfile::tempdir().unwrap();
        create_skill(temp.path(), &["skills", "text", "summarise"]);
        create_skill(temp.path(), &["skills", "text", "expand"]);

        let entries = scan_repo_dir(temp.path(), "https://example.com/repo.git").unwrap();
        assert_eq!(names(&entries), vec!["expand", "summarise"]);
        for entry in &entries {
            assert_eq!(
                entry.source.path,
                format!("skills/text/{}", entry.name),
            );
        }
    }

    #[test]
    fn hidden_directories_are_skipped_at_every_level() {
        let temp = tempfile::tempdir().unwrap();
        create_skill(temp.path(), &["visible"]);
        create_skill(temp.path(), &[".hidden", "secret"]);
        create_skill(temp.path(), &["category", ".private"]);

        let entries = scan_repo_dir(temp.path(), "https://example.com/repo.git").unwrap();
        assert_eq!(names(&entries), vec!["visible"]);
    }

    #[test]
    fn overlapping_search_dirs_deduplicate_by_subpath() {
        let temp = tempfile::tempdir().unwrap();
        // Root scan descends into skills/ as a category; the skills/ search
        // dir finds the same skill directly.
        create_skill(temp.path(), &["skills", "my-skill"]);

        let entries = scan_repo_dir(temp.path(), "https://example.com/repo.git").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "my-skill");
        assert_eq!(entries[0].source.path, "skills/my-skill");
    }

    #[test]
    fn multiple_overlaps_still_yield_one_entry_each() {
        let temp = tempfile::tempdir().unwrap();
        create_skill(temp.path(), &["skills", "alpha"]);
        create_skill(temp.path(), &["skills", "beta"]);
        create_skill(temp.path(), &["root-skill"]);

        let entries = scan_repo_dir(temp.path(), "https://example.com/repo.git").unwrap();
        assert_eq!(names(&entries), vec!["alpha", "beta", "root-skill"]);
    }

    #[test]
    fn empty_repo_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = scan_repo_dir(temp.path(), "https://example.com/repo.git").unwrap_err();
        assert!(matches!(err, Error::RemoteEmpty { .. }));
    }

    #[test]
    fn root_skill_names_for_url_shapes() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();
        assert_eq!(root_skill_name("https://x/y/widget.git", dir), "widget");
        assert_eq!(root_skill_name("https://x/y/widget/", dir), "widget");
        assert_eq!(root_skill_name("git@github.com:org/tool.git", dir), "tool");
        assert_eq!(root_skill_name("file:///srv/mirrors/widget", dir), "widget");
    }

    #[test]
    fn authored_index_takes_precedence_over_scanning() {
        let temp = tempfile::tempdir().unwrap();
        create_skill(temp.path(), &["on-disk-skill"]);
        fs::write(
            temp.path().join("index.yaml"),
            "version: 1\nskills:\n  - name: authored\n    source:\n      repo: https://x/y/z\n",
        )
        .unwrap();

        let entries = read_repo_entries(temp.path(), "https://example.com/repo.git").unwrap();
        assert_eq!(names(&entries), vec!["authored"]);
    }
}

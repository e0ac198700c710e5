//! The manifest: skilldock's record of which skills it installed and where
//! they came from, plus reconciliation against what is physically on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::git;
use crate::paths;
use crate::skillmd;

fn manifest_version() -> u32 {
    1
}

/// Persisted as `<root>/manifest.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "manifest_version")]
    pub version: u32,
    #[serde(default)]
    pub installed: BTreeMap<String, InstalledSkill>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: manifest_version(),
            installed: BTreeMap::new(),
        }
    }
}

/// Provenance of one installed skill. `version` is the requested tag (empty
/// for "latest"); `commit` the object id captured at install time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledSkill {
    #[serde(default)]
    pub version: String,
    pub commit: String,
    pub installed_at: DateTime<Utc>,
    pub source_repo: String,
    #[serde(default)]
    pub source_path: String,
}

impl Manifest {
    /// Load from disk. An absent file is an empty manifest, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::io("read", path, e)),
        };
        serde_yaml::from_str(&raw).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io("create", parent, e))?;
        }
        let raw = serde_yaml::to_string(self).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, raw).map_err(|e| Error::io("write", path, e))
    }

    pub fn add(&mut self, name: &str, record: InstalledSkill) {
        self.installed.insert(name.to_string(), record);
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.installed.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&InstalledSkill> {
        self.installed.get(name)
    }
}

/// Where a named skill lives under the skills directory.
pub fn skill_path(skills_dir: &Path, name: &str) -> PathBuf {
    skills_dir.join(name)
}

/// Whether the skill is physically present: `<skills_dir>/<name>/SKILL.md`
/// resolves through any symlink to a real file.
pub fn is_present_on_disk(skills_dir: &Path, name: &str) -> bool {
    skill_path(skills_dir, name).join("SKILL.md").is_file()
}

/// One entry found by scanning the skills directory.
#[derive(Debug, Clone)]
pub struct LocalSkill {
    pub name: String,
    pub path: PathBuf,
    pub description: String,
    pub is_git_repo: bool,
    pub is_modified: bool,
}

/// Walk the skills directory once and describe every directory that holds a
/// `SKILL.md` (following symlinks). Entries that error are omitted.
pub fn scan_local(skills_dir: &Path) -> BTreeMap<String, LocalSkill> {
    let mut result = BTreeMap::new();

    let Ok(entries) = fs::read_dir(skills_dir) else {
        return result;
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == paths::RESERVED_DIR {
            continue;
        }

        let path = entry.path();
        // DirEntry::file_type is lstat; a symlinked skill needs stat.
        let Ok(meta) = fs::metadata(&path) else {
            continue;
        };
        if !meta.is_dir() {
            continue;
        }

        let descriptor = path.join("SKILL.md");
        let Ok(content) = fs::read_to_string(&descriptor) else {
            debug!("skipping {}: no readable SKILL.md", path.display());
            continue;
        };

        let is_git_repo = git::is_git_repo(&path);
        let is_modified = is_git_repo && git::is_modified(&path).unwrap_or(false);

        result.insert(
            name.clone(),
            LocalSkill {
                name,
                path,
                description: skillmd::extract_description(&content),
                is_git_repo,
                is_modified,
            },
        );
    }

    result
}

/// Cross-reference of manifest records against the on-disk scan.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// In the manifest and present with a `SKILL.md`.
    pub tracked_present: Vec<String>,
    /// In the manifest but gone from disk (removed externally).
    pub tracked_missing: Vec<String>,
    /// On disk but not in the manifest (user-authored or foreign).
    pub untracked: Vec<String>,
}

pub fn reconcile(
    manifest: &Manifest,
    local: &BTreeMap<String, LocalSkill>,
) -> Reconciliation {
    let mut result = Reconciliation::default();
    for name in manifest.installed.keys() {
        if local.contains_key(name) {
            result.tracked_present.push(name.clone());
        } else {
            result.tracked_missing.push(name.clone());
        }
    }
    for name in local.keys() {
        if !manifest.installed.contains_key(name) {
            result.untracked.push(name.clone());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(commit: &str) -> InstalledSkill {
        InstalledSkill {
            version: String::new(),
            commit: commit.to_string(),
            installed_at: Utc::now(),
            source_repo: "https://example.com/skills.git".to_string(),
            source_path: "skills/widget".to_string(),
        }
    }

    #[test]
    fn absent_manifest_loads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let manifest = Manifest::load(&temp.path().join("manifest.yaml")).unwrap();
        assert_eq!(manifest.version, 1);
        assert!(manifest.installed.is_empty());
    }

    #[test]
    fn add_save_load_round_trips() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("manifest.yaml");

        let mut manifest = Manifest::default();
        manifest.add("widget", record("a".repeat(40).as_str()));
        manifest.save(&path).unwrap();

        let reloaded = Manifest::load(&path).unwrap();
        let entry = reloaded.get("widget").unwrap();
        assert_eq!(entry.commit.len(), 40);
        assert_eq!(entry.source_path, "skills/widget");

        let mut reloaded = reloaded;
        assert!(reloaded.remove("widget"));
        assert!(!reloaded.remove("widget"));
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("manifest.yaml");
        fs::write(&path, "installed: [not, a, map]").unwrap();
        assert!(matches!(
            Manifest::load(&path).unwrap_err(),
            Error::Parse { .. }
        ));
    }

    #[test]
    fn scan_finds_dirs_and_symlinked_skills() {
        let temp = tempfile::tempdir().unwrap();
        let skills = temp.path().join("skills");
        fs::create_dir_all(skills.join("plain")).unwrap();
        fs::write(
            skills.join("plain").join("SKILL.md"),
            "---\ndescription: plain skill\n---\n",
        )
        .unwrap();

        // A skill exposed through a symlink, like installs create.
        let target = temp.path().join("repos").join("r").join("linked");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("SKILL.md"), "Linked skill body.\n").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, skills.join("linked")).unwrap();

        // Noise that must be ignored.
        fs::create_dir_all(skills.join("no-descriptor")).unwrap();
        fs::create_dir_all(skills.join(paths::RESERVED_DIR)).unwrap();
        fs::write(skills.join("stray-file"), "x").unwrap();

        let local = scan_local(&skills);
        let mut found: Vec<&str> = local.keys().map(String::as_str).collect();
        found.sort();
        #[cfg(unix)]
        assert_eq!(found, vec!["linked", "plain"]);

        assert_eq!(local["plain"].description, "plain skill");
        assert!(!local["plain"].is_git_repo);
        assert!(!local["plain"].is_modified);
    }

    #[test]
    fn scan_of_missing_dir_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        assert!(scan_local(&temp.path().join("nope")).is_empty());
    }

    #[test]
    fn reconcile_classifies_three_ways() {
        let temp = tempfile::tempdir().unwrap();
        let skills = temp.path().join("skills");
        for name in ["tracked", "foreign"] {
            fs::create_dir_all(skills.join(name)).unwrap();
            fs::write(skills.join(name).join("SKILL.md"), "x\n").unwrap();
        }

        let mut manifest = Manifest::default();
        manifest.add("tracked", record("abc"));
        manifest.add("vanished", record("def"));

        let local = scan_local(&skills);
        let classes = reconcile(&manifest, &local);
        assert_eq!(classes.tracked_present, vec!["tracked"]);
        assert_eq!(classes.tracked_missing, vec!["vanished"]);
        assert_eq!(classes.untracked, vec!["foreign"]);
    }
}

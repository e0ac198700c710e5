//! The skill store: materialise skills under the repos tree via shared
//! sparse clones and expose them through symlinks in the skills directory.
//!
//! One clone exists per repository URL no matter how many skills point into
//! it; installing another skill from the same repo only extends the clone's
//! sparse-checkout set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::git;
use crate::manifest::{self, InstalledSkill, Manifest};
use crate::paths::Layout;
use crate::registry::SkillEntry;

pub struct SkillStore<'a> {
    layout: &'a Layout,
}

/// What an install produced.
#[derive(Debug, Clone)]
pub struct Installed {
    pub commit: String,
    pub skill_path: PathBuf,
}

/// Per-skill result of an update sweep. Consumers pattern-match.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated { from: String, to: String },
    UpToDate,
    Skipped { reason: String },
}

impl<'a> SkillStore<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// The shared clone directory for a repository URL.
    pub fn repo_dir_for(&self, repo_url: &str) -> PathBuf {
        self.layout.repos_dir().join(git::repo_dir_name(repo_url))
    }

    /// The symlink exposing a named skill.
    pub fn skill_link(&self, name: &str) -> PathBuf {
        manifest::skill_path(&self.layout.skills_dir(), name)
    }

    /// Install a skill from its index entry, recording it in the manifest.
    ///
    /// `version` overrides the entry's tag (a `name@tag` install). Anything
    /// already sitting at the skill's link path is replaced; callers that
    /// care about overwrites check before calling.
    pub fn install(
        &self,
        entry: &SkillEntry,
        version: Option<&str>,
        manifest: &mut Manifest,
    ) -> Result<Installed> {
        let subpath = entry.source.path.as_str();
        let tag = version.unwrap_or(entry.source.tag.as_str());
        let repo_dir = self.repo_dir_for(&entry.source.repo);
        let sparse = !subpath.is_empty();

        let existed = repo_dir.exists();
        if !existed {
            if sparse {
                git::sparse_clone(&entry.source.repo, &repo_dir)?;
                git::sparse_set(&repo_dir, subpath)?;
            } else {
                git::shallow_clone(&entry.source.repo, &repo_dir)?;
            }
        } else if sparse {
            // A clone made for a root-level skill is not sparse; as long as
            // the path is materialised the add is moot.
            if let Err(e) = git::sparse_add(&repo_dir, subpath) {
                if !repo_dir.join(subpath).exists() {
                    return Err(e);
                }
            }
        }

        if !tag.is_empty() {
            git::fetch_and_reset_to_tag(&repo_dir, tag)?;
        }

        let skill_path = if sparse {
            repo_dir.join(subpath)
        } else {
            repo_dir.clone()
        };

        // An existing clone can predate the skill's path upstream; refresh
        // once and re-apply the sparse set before giving up.
        if !skill_path.exists() {
            if sparse && existed {
                git::fetch_and_fast_forward(&repo_dir)?;
                git::sparse_add(&repo_dir, subpath)?;
            }
            if !skill_path.exists() {
                return Err(Error::SkillPathNotFound {
                    subpath: subpath.to_string(),
                });
            }
        }

        git::validate_skill(&skill_path)?;
        self.replace_link(&entry.name, &skill_path)?;

        let commit = git::head_commit(&repo_dir)?;
        manifest.add(
            &entry.name,
            InstalledSkill {
                version: tag.to_string(),
                commit: commit.clone(),
                installed_at: Utc::now(),
                source_repo: entry.source.repo.clone(),
                source_path: subpath.to_string(),
            },
        );
        manifest.save(&self.layout.manifest_path())?;

        debug!("installed '{}' at {}", entry.name, skill_path.display());
        Ok(Installed { commit, skill_path })
    }

    /// Update one installed skill towards its remote.
    ///
    /// Skills with local modifications are skipped unless `force`, which
    /// discards the changes first. The target tag comes from the current
    /// index entry when one exists (empty tag means default branch head).
    pub fn update(
        &self,
        name: &str,
        index_entry: Option<&SkillEntry>,
        force: bool,
        manifest: &mut Manifest,
    ) -> Result<UpdateOutcome> {
        let Some(record) = manifest.get(name).cloned() else {
            return Err(Error::NotInstalled {
                name: name.to_string(),
            });
        };

        let link = self.skill_link(name);
        if !manifest::is_present_on_disk(&self.layout.skills_dir(), name) {
            return Ok(UpdateOutcome::Skipped {
                reason: "not present on disk".to_string(),
            });
        }

        // The entry path itself for modification checks, so only this
        // skill's files count in a shared clone.
        let entry_path = fs::canonicalize(&link).map_err(|e| Error::io("resolve", &link, e))?;
        if git::is_modified(&entry_path)? {
            if !force {
                return Ok(UpdateOutcome::Skipped {
                    reason: "local modifications (use --force to discard)".to_string(),
                });
            }
            git::discard_local(&entry_path)?;
        }

        let (repo_dir, subpath) = self.update_target(name, &record, &entry_path)?;
        let tag = index_entry
            .map(|e| e.source.tag.as_str())
            .unwrap_or(record.version.as_str());

        if tag.is_empty() {
            git::fetch_and_fast_forward(&repo_dir)?;
        } else {
            git::fetch_and_reset_to_tag(&repo_dir, tag)?;
        }

        // Upstream may have moved or dropped the skill's path.
        let skill_path = if subpath.is_empty() {
            repo_dir.clone()
        } else {
            if let Err(e) = git::sparse_add(&repo_dir, &subpath) {
                if !repo_dir.join(&subpath).exists() {
                    return Err(e);
                }
            }
            repo_dir.join(&subpath)
        };
        git::validate_skill(&skill_path)?;

        let new_commit = git::head_commit(&repo_dir)?;
        if new_commit == record.commit {
            return Ok(UpdateOutcome::UpToDate);
        }

        let (source_repo, source_path) = match index_entry {
            Some(e) => (e.source.repo.clone(), e.source.path.clone()),
            None => (record.source_repo.clone(), record.source_path.clone()),
        };
        manifest.add(
            name,
            InstalledSkill {
                version: tag.to_string(),
                commit: new_commit.clone(),
                installed_at: Utc::now(),
                source_repo,
                source_path,
            },
        );
        manifest.save(&self.layout.manifest_path())?;

        Ok(UpdateOutcome::Updated {
            from: record.commit,
            to: new_commit,
        })
    }

    /// Remove a skill: unlink (or delete a pre-existing directory the
    /// install overwrote) and drop the manifest record. The shared repo
    /// clone is left alone.
    pub fn remove(&self, name: &str, manifest: &mut Manifest) -> Result<()> {
        let link = self.skill_link(name);
        let tracked = manifest.get(name).is_some();

        match fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                fs::remove_file(&link).map_err(|e| Error::io("remove", &link, e))?;
            }
            Ok(meta) if meta.is_dir() => {
                fs::remove_dir_all(&link).map_err(|e| Error::io("remove", &link, e))?;
            }
            Ok(_) => {
                fs::remove_file(&link).map_err(|e| Error::io("remove", &link, e))?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !tracked {
                    return Err(Error::NotInstalled {
                        name: name.to_string(),
                    });
                }
            }
            Err(e) => return Err(Error::io("stat", &link, e)),
        }

        if manifest.remove(name) {
            manifest.save(&self.layout.manifest_path())?;
        }
        Ok(())
    }

    /// Best-effort outdatedness: the local head differs from the remote
    /// head. Lookup errors degrade to "not outdated" so transient network
    /// trouble never surfaces as state.
    pub fn is_outdated(&self, name: &str, record: &InstalledSkill) -> bool {
        let shared = self.repo_dir_for(&record.source_repo);
        let repo_dir = if shared.exists() {
            shared
        } else {
            // Legacy shape: the skill directory is its own clone.
            let link = self.skill_link(name);
            if !git::is_git_repo(&link) {
                return false;
            }
            link
        };

        match (git::head_commit(&repo_dir), git::remote_head(&repo_dir)) {
            (Ok(local), Ok(remote)) => local != remote,
            _ => {
                debug!("remote head lookup failed for {}", repo_dir.display());
                false
            }
        }
    }

    /// Which directory an update operates on and the skill's path within
    /// it: the shared clone when one exists, otherwise a legacy per-skill
    /// clone whose root is the skill itself.
    fn update_target(
        &self,
        name: &str,
        record: &InstalledSkill,
        entry_path: &Path,
    ) -> Result<(PathBuf, String)> {
        let repo_dir = self.repo_dir_for(&record.source_repo);
        if repo_dir.exists() {
            return Ok((repo_dir, record.source_path.clone()));
        }
        if git::is_git_repo(entry_path) {
            // Legacy shape from before shared clones: the exposed directory
            // is itself a repository with the skill files at its root.
            warn!("skill '{name}' uses a legacy per-skill clone");
            return Ok((entry_path.to_path_buf(), String::new()));
        }
        Err(Error::NotInstalled {
            name: name.to_string(),
        })
    }

    /// Repoint `<skills_dir>/<name>`: whatever sits there is removed, then
    /// a fresh symlink is created.
    fn replace_link(&self, name: &str, skill_path: &Path) -> Result<()> {
        self.layout.ensure_dirs()?;
        let link = self.skill_link(name);

        match fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                fs::remove_file(&link).map_err(|e| Error::io("remove", &link, e))?;
            }
            Ok(meta) if meta.is_dir() => {
                fs::remove_dir_all(&link).map_err(|e| Error::io("remove", &link, e))?;
            }
            Ok(_) => {
                fs::remove_file(&link).map_err(|e| Error::io("remove", &link, e))?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io("stat", &link, e)),
        }

        symlink_dir(skill_path, &link).map_err(|e| Error::io("symlink", &link, e))
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

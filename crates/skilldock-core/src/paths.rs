//! Managed-root layout and path expansion.
//!
//! Everything skilldock owns lives under a single root (default
//! `~/.skilldock`, overridable via `SKILLDOCK_HOME`):
//!
//! ```text
//! <root>/config.toml     user configuration
//! <root>/manifest.yaml   installed-skill records
//! <root>/cache.yaml      cached merged index
//! <root>/skills/         user-visible skills; symlinks into repos/
//! <root>/repos/<name>/   one shared clone per source repository
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "config.toml";
pub const MANIFEST_FILE: &str = "manifest.yaml";
pub const CACHE_FILE: &str = "cache.yaml";
pub const SKILLS_DIR: &str = "skills";
pub const REPOS_DIR: &str = "repos";

/// Entry name skipped when scanning the skills directory, in case the tool
/// state is ever co-located with the skills themselves.
pub const RESERVED_DIR: &str = ".skilldock";

const ROOT_ENV: &str = "SKILLDOCK_HOME";
const ROOT_DIR_NAME: &str = ".skilldock";

/// Expand a leading `~` or `$XDG_CONFIG_HOME` in a configured path.
///
/// Any other path comes back unchanged. Deterministic given the process
/// environment.
pub fn expand(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix('~') {
        let home = home_dir()?;
        return Ok(home.join(rest.trim_start_matches('/')));
    }
    if let Some(rest) = path.strip_prefix("$XDG_CONFIG_HOME") {
        let base = xdg_config_home()?;
        return Ok(base.join(rest.trim_start_matches('/')));
    }
    Ok(PathBuf::from(path))
}

/// `$XDG_CONFIG_HOME`, falling back to `<home>/.config`.
pub fn xdg_config_home() -> Result<PathBuf> {
    match env::var("XDG_CONFIG_HOME") {
        Ok(value) if !value.trim().is_empty() => Ok(PathBuf::from(value)),
        _ => Ok(home_dir()?.join(".config")),
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(Error::UserHomeUnavailable)
}

/// The filesystem layout of a managed root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Resolve the managed root for this process: `SKILLDOCK_HOME` when set,
    /// `~/.skilldock` otherwise.
    pub fn discover() -> Result<Self> {
        if let Ok(value) = env::var(ROOT_ENV) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Ok(Self::at_root(trimmed));
            }
        }
        Ok(Self::at_root(home_dir()?.join(ROOT_DIR_NAME)))
    }

    /// Use an explicit root, bypassing environment discovery.
    pub fn at_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.join(CACHE_FILE)
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.root.join(SKILLS_DIR)
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.root.join(REPOS_DIR)
    }

    /// Create the root and the skills directory if they are missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| Error::io("create", &self.root, e))?;
        let skills = self.skills_dir();
        fs::create_dir_all(&skills).map_err(|e| Error::io("create", skills, e))?;
        Ok(())
    }
}

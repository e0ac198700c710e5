//! User configuration: skill remotes, backend targets, and state preserved
//! on behalf of UI collaborators.
//!
//! The on-disk form is `<root>/config.toml`. Only custom or modified
//! backends are persisted, so the file stays minimal and built-in defaults
//! can evolve without stale copies in user configs.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::paths::{self, Layout};

pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;

/// A user-labelled source of skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub name: String,
    pub url: String,
}

/// An AI-agent host program that consumes skills from a conventional
/// directory. `path` may embed `~` or `$XDG_CONFIG_HOME`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backend {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub description: String,
    /// Built-in backends cannot be removed, only dismissed.
    #[serde(skip)]
    pub builtin: bool,
}

impl Backend {
    fn builtin(name: &str, path: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            description: description.to_string(),
            builtin: true,
        }
    }
}

/// The host programs skilldock knows how to serve out of the box.
pub fn known_backends() -> Vec<Backend> {
    vec![
        Backend::builtin("claude", "~/.claude/skills", "Claude Code"),
        Backend::builtin("codex", "~/.codex/skills", "OpenAI Codex"),
    ]
}

/// Well-known skill repositories offered to first-run users.
pub fn starter_kit() -> Vec<Remote> {
    vec![
        Remote {
            name: "anthropics".to_string(),
            url: "https://github.com/anthropics/skills".to_string(),
        },
        Remote {
            name: "superpowers".to_string(),
            url: "https://github.com/obra/superpowers".to_string(),
        },
    ]
}

/// The serialized shape of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub repos: Vec<Remote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_hours: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<Backend>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dismissed_backends: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub starter_kit_dismissed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collapsed_groups: Vec<String>,
}

/// Where config documents live. The filesystem store is the production
/// implementation; tests inject in-memory stores satisfying the same
/// contract.
pub trait ConfigStore {
    /// `Ok(None)` when no config exists yet.
    fn load(&self) -> Result<Option<ConfigFile>>;
    fn save(&self, file: &ConfigFile) -> Result<()>;
}

pub struct FsConfigStore {
    path: PathBuf,
}

impl FsConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for FsConfigStore {
    fn load(&self) -> Result<Option<ConfigFile>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io("read", &self.path, e)),
        };
        let file = toml::from_str(&raw).map_err(|e| Error::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(file))
    }

    fn save(&self, file: &ConfigFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io("create", parent, e))?;
        }
        let raw = toml::to_string_pretty(file).map_err(|e| Error::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, raw).map_err(|e| Error::io("write", &self.path, e))
    }
}

/// Runtime configuration: the managed-root layout plus everything from
/// `config.toml`, with built-in backends merged in.
#[derive(Debug, Clone)]
pub struct Config {
    pub layout: Layout,
    pub remotes: Vec<Remote>,
    pub cache_ttl_hours: u64,
    pub viewer: Option<String>,
    pub backends: Vec<Backend>,
    pub dismissed_backends: Vec<String>,
    pub starter_kit_dismissed: bool,
    pub collapsed_groups: Vec<String>,
}

impl Config {
    /// Load from `<root>/config.toml`, migrating any legacy config location
    /// first. A missing file yields defaults.
    pub fn load(layout: Layout) -> Result<Self> {
        if let Err(e) = migrate_legacy_root(&layout) {
            warn!("legacy config migration failed: {e}");
        }
        let store = FsConfigStore::new(layout.config_path());
        Self::load_from(layout, &store)
    }

    pub fn load_from(layout: Layout, store: &dyn ConfigStore) -> Result<Self> {
        let file = store.load()?.unwrap_or_default();
        Ok(Self {
            layout,
            remotes: file.repos,
            cache_ttl_hours: file.cache_ttl_hours.unwrap_or(DEFAULT_CACHE_TTL_HOURS),
            viewer: file.viewer,
            backends: merge_backends(known_backends(), file.backends),
            dismissed_backends: file.dismissed_backends,
            starter_kit_dismissed: file.starter_kit_dismissed,
            collapsed_groups: file.collapsed_groups,
        })
    }

    pub fn save(&self) -> Result<()> {
        let store = FsConfigStore::new(self.layout.config_path());
        self.save_to(&store)
    }

    pub fn save_to(&self, store: &dyn ConfigStore) -> Result<()> {
        self.layout.ensure_dirs()?;
        store.save(&self.to_file())
    }

    fn to_file(&self) -> ConfigFile {
        ConfigFile {
            repos: self.remotes.clone(),
            cache_ttl_hours: (self.cache_ttl_hours != DEFAULT_CACHE_TTL_HOURS)
                .then_some(self.cache_ttl_hours),
            viewer: self.viewer.clone(),
            backends: filter_custom(&self.backends),
            dismissed_backends: self.dismissed_backends.clone(),
            starter_kit_dismissed: self.starter_kit_dismissed,
            collapsed_groups: self.collapsed_groups.clone(),
        }
    }

    /// Add a remote, or update its URL when the name is already taken.
    pub fn add_remote(&mut self, name: &str, url: &str) {
        if let Some(existing) = self.remotes.iter_mut().find(|r| r.name == name) {
            existing.url = url.to_string();
            return;
        }
        self.remotes.push(Remote {
            name: name.to_string(),
            url: url.to_string(),
        });
    }

    /// Remove a remote by name. Returns whether anything was removed.
    pub fn remove_remote(&mut self, name: &str) -> bool {
        let before = self.remotes.len();
        self.remotes.retain(|r| r.name != name);
        self.remotes.len() != before
    }

    pub fn backend(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// Add a custom backend, or repoint an existing one.
    pub fn add_backend(&mut self, name: &str, path: &str, description: &str) {
        if let Some(existing) = self.backends.iter_mut().find(|b| b.name == name) {
            existing.path = path.to_string();
            if !description.is_empty() {
                existing.description = description.to_string();
            }
            return;
        }
        self.backends.push(Backend {
            name: name.to_string(),
            path: path.to_string(),
            description: description.to_string(),
            builtin: false,
        });
    }

    /// Remove a custom backend. Built-ins are kept and `false` is returned.
    pub fn remove_backend(&mut self, name: &str) -> bool {
        match self.backends.iter().position(|b| b.name == name) {
            Some(i) if !self.backends[i].builtin => {
                self.backends.remove(i);
                true
            }
            _ => false,
        }
    }

    /// Record that the user declined a backend so first-run flows skip it.
    pub fn dismiss_backend(&mut self, name: &str) {
        if !self.dismissed_backends.iter().any(|d| d == name) {
            self.dismissed_backends.push(name.to_string());
        }
    }
}

/// Configured entries win; built-ins not overridden are appended after.
fn merge_backends(known: Vec<Backend>, configured: Vec<Backend>) -> Vec<Backend> {
    let mut result: Vec<Backend> = configured
        .into_iter()
        .map(|mut b| {
            b.builtin = known.iter().any(|k| k.name == b.name);
            b
        })
        .collect();
    for builtin in known {
        if !result.iter().any(|b| b.name == builtin.name) {
            result.push(builtin);
        }
    }
    result
}

/// Keep only backends that are custom, or built-ins whose path or
/// description the user changed.
fn filter_custom(backends: &[Backend]) -> Vec<Backend> {
    let known = known_backends();
    backends
        .iter()
        .filter(|b| {
            match known.iter().find(|k| k.name == b.name) {
                Some(k) => k.path != b.path || k.description != b.description,
                None => true,
            }
        })
        .cloned()
        .collect()
}

/// Move config, manifest, and cache from the pre-1.0 location under
/// `$XDG_CONFIG_HOME/skilldock` into the managed root, unless the new
/// location already has a config.
pub fn migrate_legacy_root(layout: &Layout) -> Result<()> {
    let legacy_dir = paths::xdg_config_home()?.join("skilldock");
    let legacy_config = legacy_dir.join(paths::CONFIG_FILE);
    if !legacy_config.exists() || layout.config_path().exists() {
        return Ok(());
    }

    debug!(
        "migrating legacy config from {} to {}",
        legacy_dir.display(),
        layout.root().display()
    );
    layout.ensure_dirs()?;
    move_if_present(&legacy_config, &layout.config_path());
    move_if_present(&legacy_dir.join(paths::MANIFEST_FILE), &layout.manifest_path());
    move_if_present(&legacy_dir.join(paths::CACHE_FILE), &layout.cache_path());
    Ok(())
}

// Rename, with copy+delete as the cross-filesystem fallback. Best effort:
// a file that cannot move is left behind rather than failing the load.
fn move_if_present(src: &PathBuf, dst: &PathBuf) {
    if !src.exists() || fs::rename(src, dst).is_ok() {
        return;
    }
    match fs::copy(src, dst) {
        Ok(_) => {
            let _ = fs::remove_file(src);
        }
        Err(e) => warn!("could not migrate {}: {e}", src.display()),
    }
}

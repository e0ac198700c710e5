//! Backend symlink lifecycle.
//!
//! Each backend (host program) reads skills from a conventional directory,
//! e.g. `~/.claude/skills`. skilldock points that directory at the managed
//! skills directory with a symlink, so installing a skill once serves every
//! linked host.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::Backend;
use crate::error::{Error, Result};
use crate::paths;

/// Inspection result for one backend path. Predicates, not a state enum:
/// callers combine them (`exists && !is_symlink && has_files` means "needs
/// migration").
#[derive(Debug, Clone)]
pub struct LinkStatus {
    pub backend: Backend,
    /// The path exists, by `lstat` (a dangling symlink still exists).
    pub exists: bool,
    pub is_symlink: bool,
    /// Where the symlink points, absolute.
    pub link_target: Option<PathBuf>,
    /// Symlink pointing at the managed skills directory.
    pub linked: bool,
    /// A regular, non-empty directory.
    pub has_files: bool,
    /// The parent directory exists, i.e. the host appears installed.
    pub available: bool,
    pub error: Option<String>,
}

impl LinkStatus {
    fn new(backend: &Backend) -> Self {
        Self {
            backend: backend.clone(),
            exists: false,
            is_symlink: false,
            link_target: None,
            linked: false,
            has_files: false,
            available: false,
            error: None,
        }
    }
}

/// Inspect every backend against the managed skills directory.
pub fn check_backends(backends: &[Backend], skills_dir: &Path) -> Vec<LinkStatus> {
    backends
        .iter()
        .map(|b| inspect(b, skills_dir))
        .collect()
}

/// Inspect a single backend path. Never fails; problems land in `error`.
pub fn inspect(backend: &Backend, skills_dir: &Path) -> LinkStatus {
    let mut status = LinkStatus::new(backend);

    let path = match paths::expand(&backend.path) {
        Ok(path) => path,
        Err(e) => {
            status.error = Some(format!("failed to expand path: {e}"));
            return status;
        }
    };

    status.available = path.parent().map(Path::exists).unwrap_or(false);

    let meta = match fs::symlink_metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return status,
        Err(e) => {
            status.error = Some(format!("failed to stat {}: {e}", path.display()));
            return status;
        }
    };
    status.exists = true;

    if meta.file_type().is_symlink() {
        status.is_symlink = true;
        let target = match fs::read_link(&path) {
            Ok(target) => target,
            Err(e) => {
                status.error = Some(format!("failed to read symlink: {e}"));
                return status;
            }
        };
        let absolute = if target.is_absolute() {
            target
        } else {
            path.parent().unwrap_or(Path::new("")).join(target)
        };
        let absolute = clean(&absolute);
        status.linked = absolute == clean(skills_dir);
        status.link_target = Some(absolute);
        return status;
    }

    if meta.is_dir() {
        match fs::read_dir(&path) {
            Ok(mut entries) => status.has_files = entries.next().is_some(),
            Err(e) => status.error = Some(format!("failed to read directory: {e}")),
        }
    }

    status
}

/// Create the backend symlink, creating its parent and the skills directory
/// as needed. Fails if something already sits at the backend path.
pub fn create(backend: &Backend, skills_dir: &Path) -> Result<()> {
    let path = paths::expand(&backend.path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io("create", parent, e))?;
    }
    fs::create_dir_all(skills_dir).map_err(|e| Error::io("create", skills_dir, e))?;
    symlink_dir(skills_dir, &path).map_err(|e| Error::io("symlink", &path, e))
}

/// Remove the backend symlink. Refuses to touch anything that is not a
/// symlink; an absent path is fine.
pub fn remove(backend: &Backend) -> Result<()> {
    let path = paths::expand(&backend.path)?;
    let meta = match fs::symlink_metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io("stat", &path, e)),
    };
    if !meta.file_type().is_symlink() {
        return Err(Error::NotASymlink { path });
    }
    fs::remove_file(&path).map_err(|e| Error::io("remove", &path, e))
}

/// What [`migrate`] did: entries moved into the skills directory, and
/// entries skipped because a same-named one already existed there.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub moved: Vec<String>,
    pub skipped: Vec<String>,
}

impl MigrationReport {
    /// The backend was left as a directory holding the skipped entries.
    pub fn blocked(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Move the contents of a pre-existing backend directory into the skills
/// directory, then replace the directory with a symlink.
///
/// Name collisions are skipped and left in place; when any occur the
/// directory is kept (holding only the skipped entries) and no symlink is
/// created, so nothing is ever overwritten or lost.
pub fn migrate(backend: &Backend, skills_dir: &Path) -> Result<MigrationReport> {
    let path = paths::expand(&backend.path)?;
    let meta = fs::symlink_metadata(&path).map_err(|e| Error::io("stat", &path, e))?;
    if meta.file_type().is_symlink() || !meta.is_dir() {
        return Err(Error::NotADirectory { path });
    }

    fs::create_dir_all(skills_dir).map_err(|e| Error::io("create", skills_dir, e))?;

    let mut report = MigrationReport::default();
    let entries = fs::read_dir(&path).map_err(|e| Error::io("read", &path, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("read", &path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let src = entry.path();
        let dst = skills_dir.join(entry.file_name());

        if fs::symlink_metadata(&dst).is_ok() {
            report.skipped.push(name);
            continue;
        }

        if fs::rename(&src, &dst).is_err() {
            // Cross-filesystem move: copy, then delete the source.
            copy_recursive(&src, &dst)?;
            fs::remove_dir_all(&src)
                .or_else(|_| fs::remove_file(&src))
                .map_err(|e| Error::io("remove", &src, e))?;
        }
        report.moved.push(name);
    }

    if report.blocked() {
        return Ok(report);
    }

    fs::remove_dir(&path).map_err(|e| Error::io("remove", &path, e))?;
    create(backend, skills_dir)?;
    Ok(report)
}

/// Whether any backend is present on this machine, not linked, and not
/// already dismissed by the user.
pub fn has_new_backends(statuses: &[LinkStatus], dismissed: &[String]) -> bool {
    statuses.iter().any(|s| {
        s.available
            && !s.linked
            && s.error.is_none()
            && !dismissed.iter().any(|d| *d == s.backend.name)
    })
}

/// Backends that inspect cleanly but are not linked yet.
pub fn unlinked(statuses: &[LinkStatus]) -> Vec<&LinkStatus> {
    statuses
        .iter()
        .filter(|s| !s.linked && s.error.is_none())
        .collect()
}

fn copy_recursive(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::metadata(src).map_err(|e| Error::io("stat", src, e))?;
    if meta.is_dir() {
        fs::create_dir_all(dst).map_err(|e| Error::io("create", dst, e))?;
        let entries = fs::read_dir(src).map_err(|e| Error::io("read", src, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io("read", src, e))?;
            copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(src, dst).map_err(|e| Error::io("copy", src, e))?;
        Ok(())
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

// Directory symlinks on Windows need developer mode or elevation; a
// junction would avoid that but junctions cannot be created without extra
// dependencies, so the symlink API is used on both platforms.
#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Lexical path cleanup: fold `.` and `..` components without touching the
/// filesystem, so symlink targets compare stably.
fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(Component::ParentDir);
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

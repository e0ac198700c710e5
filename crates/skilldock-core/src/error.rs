//! Error taxonomy shared by every core module.
//!
//! Callers pattern-match on the variant; the `Display` text is suitable for
//! a terminal as-is.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no skill repositories configured - add one with `skilldock repo add <name> <url>`")]
    NoRemotesConfigured,

    #[error("could not determine the current user's home directory")]
    UserHomeUnavailable,

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("git {op} failed: {stderr}")]
    Git { op: String, stderr: String },

    #[error("{} has local modifications", .path.display())]
    LocalChanges { path: PathBuf, files: Vec<String> },

    #[error("skill '{name}' is already installed (use `skilldock update` to update it)")]
    AlreadyInstalled { name: String },

    #[error("skill '{name}' is not installed")]
    NotInstalled { name: String },

    #[error("skill '{name}' not found in the index")]
    SkillNotFound { name: String },

    #[error("skill path '{subpath}' not found in repository after checkout")]
    SkillPathNotFound { subpath: String },

    #[error("invalid skill at {}: {missing} not found", .path.display())]
    Validation { path: PathBuf, missing: &'static str },

    #[error("{} is not a symlink, refusing to remove", .path.display())]
    NotASymlink { path: PathBuf },

    #[error("{} is not a regular directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("no index.yaml and no skills found in {url} (looking for directories with SKILL.md)")]
    RemoteEmpty { url: String },

    #[error("failed to fetch from any repository:\n  {}", .details.join("\n  "))]
    AllRemotesFailed { details: Vec<String> },

    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Shorthand for wrapping an [`io::Error`] with the operation and path
    /// it happened on.
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

//! Core engine for skilldock, a package manager for Agent Skills.
//!
//! An Agent Skill is a directory carrying a `SKILL.md` descriptor plus
//! supporting files, consumed by AI-agent host programs from conventional
//! directories (`~/.claude/skills`, `~/.codex/skills`, ...). skilldock
//! centralises installed skills under one managed directory and fans them
//! out to every host through symlinks, so one install serves all of them.
//!
//! The crate is split along the lifecycle:
//! - [`registry`] fetches, merges, and caches skill indices across remotes;
//! - [`store`] materialises skills via shared sparse git clones and exposes
//!   them through symlinks;
//! - [`manifest`] records what was installed and reconciles it against the
//!   filesystem;
//! - [`symlink`] manages the host-directory links;
//! - [`git`], [`skillmd`], [`paths`], and [`config`] are the supporting
//!   pieces the above compose.
//!
//! Everything here is synchronous and single-threaded; callers that need a
//! responsive UI run these operations on a worker and forward the results
//! to their event loop. Concurrent operations on the same skill, remote, or
//! clone are not supported.

pub mod config;
pub mod error;
pub mod git;
pub mod manifest;
pub mod paths;
pub mod registry;
pub mod skillmd;
pub mod store;
pub mod symlink;

pub use error::{Error, Result};

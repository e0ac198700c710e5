//! Child-process `git` adapter.
//!
//! Every operation shells out to the `git` binary on `PATH`; nothing here
//! links a git library. Operations are synchronous and fail with
//! [`Error::Git`] carrying the invocation and its stderr. No retries happen
//! at this layer.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Characters that may not appear in a clone directory name.
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid character class"));

/// Derive a stable, filesystem-safe clone directory name from a repo URL.
///
/// `https://github.com/anthropics/skills.git` -> `anthropics-skills`. Every
/// URL normalising to the same `org/repo` yields the same name, so all
/// skills from one repository share one clone.
pub fn repo_dir_name(repo_url: &str) -> String {
    if let Ok(parsed) = Url::parse(repo_url) {
        if parsed.host().is_some() || parsed.scheme() == "file" {
            let path = parsed.path().trim_end_matches(".git");
            let parts: Vec<&str> = path
                .trim_matches('/')
                .split('/')
                .filter(|p| !p.is_empty())
                .collect();
            match parts.as_slice() {
                [.., org, repo] => return sanitize(&format!("{org}-{repo}")),
                [single] => return sanitize(single),
                [] => {}
            }
        }
    }
    // SCP-style (git@host:org/repo.git) or anything else unparseable.
    sanitize(repo_url)
}

fn sanitize(s: &str) -> String {
    UNSAFE_CHARS.replace_all(s, "-").into_owned()
}

fn run_git(cwd: &Path, args: &[&str]) -> Result<Output> {
    debug!("git {} (in {})", args.join(" "), cwd.display());
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| Error::io("spawn git in", cwd, e))?;

    if output.status.success() {
        Ok(output)
    } else {
        Err(Error::Git {
            op: args.join(" "),
            stderr: error_detail(&output),
        })
    }
}

fn error_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stdout.is_empty() {
        return stdout;
    }
    "unknown git error".to_string()
}

fn stdout_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// `clone --depth 1 <url> <dest>`. Used for index fetches and for repos that
/// are a skill at their root.
pub fn shallow_clone(url: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io("create", parent, e))?;
    }
    let dest_str = dest.display().to_string();
    run_git(
        Path::new("."),
        &["clone", "--depth", "1", url, dest_str.as_str()],
    )?;
    Ok(())
}

/// Cone-mode sparse clone: after this only top-level files populate the
/// working tree; paths appear as they are added with [`sparse_add`].
///
/// Falls back to `clone --no-checkout` + `sparse-checkout init --cone` +
/// `checkout` for git builds without `clone --sparse`.
pub fn sparse_clone(url: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io("create", parent, e))?;
    }
    let dest_str = dest.display().to_string();
    if run_git(Path::new("."), &["clone", "--sparse", url, dest_str.as_str()]).is_ok() {
        return Ok(());
    }

    let _ = fs::remove_dir_all(dest);
    run_git(
        Path::new("."),
        &["clone", "--no-checkout", url, dest_str.as_str()],
    )?;
    if let Err(e) = run_git(dest, &["sparse-checkout", "init", "--cone"])
        .and_then(|_| run_git(dest, &["checkout"]))
    {
        let _ = fs::remove_dir_all(dest);
        return Err(e);
    }
    Ok(())
}

/// Replace the sparse-checkout set with a single path.
pub fn sparse_set(repo: &Path, subpath: &str) -> Result<()> {
    run_git(repo, &["sparse-checkout", "set", subpath])?;
    Ok(())
}

/// Add a path to the sparse-checkout set. Idempotent.
pub fn sparse_add(repo: &Path, subpath: &str) -> Result<()> {
    run_git(repo, &["sparse-checkout", "add", subpath])?;
    Ok(())
}

/// The full 40-character object id of `HEAD`.
pub fn head_commit(repo: &Path) -> Result<String> {
    let output = run_git(repo, &["rev-parse", "HEAD"])?;
    Ok(stdout_string(&output))
}

/// The object id `origin/HEAD` currently points to upstream, via
/// `ls-remote`. Pure query; touches nothing locally.
pub fn remote_head(repo: &Path) -> Result<String> {
    let output = run_git(repo, &["ls-remote", "origin", "HEAD"])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().next())
        .map(str::to_string)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::Git {
            op: "ls-remote origin HEAD".to_string(),
            stderr: "no HEAD advertised by remote".to_string(),
        })
}

/// Whether the path contains a git repository. Accepts both `.git`
/// directories and `.git` files (gitlinks).
pub fn is_git_repo(path: &Path) -> bool {
    path.join(".git").symlink_metadata().is_ok()
}

/// Whether the working tree has uncommitted changes, scoped to the given
/// directory. A path that is not a git repository is never modified.
pub fn is_modified(path: &Path) -> Result<bool> {
    if !is_git_repo_or_inside(path) {
        return Ok(false);
    }
    let output = run_git(path, &["status", "--porcelain", "--", "."])?;
    Ok(!stdout_string(&output).is_empty())
}

/// Paths of modified files under the given directory, relative to the repo
/// root. Empty for a non-repository.
pub fn modified_files(path: &Path) -> Result<Vec<String>> {
    if !is_git_repo_or_inside(path) {
        return Ok(Vec::new());
    }
    let output = run_git(path, &["status", "--porcelain", "--", "."])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| line[3..].trim().to_string())
        .collect())
}

// Skill paths inside a shared sparse clone have no .git of their own; the
// enclosing clone does.
fn is_git_repo_or_inside(path: &Path) -> bool {
    path.ancestors().any(is_git_repo)
}

/// `fetch --depth 1 origin` then fast-forward onto `FETCH_HEAD`.
///
/// Shallow histories routinely cannot fast-forward; in that case the tree is
/// hard-reset to `FETCH_HEAD`, but only when it has no local changes to
/// lose. Otherwise fails with [`Error::LocalChanges`].
pub fn fetch_and_fast_forward(repo: &Path) -> Result<()> {
    run_git(repo, &["fetch", "--depth", "1", "origin"])?;
    if run_git(repo, &["merge", "--ff-only", "FETCH_HEAD"]).is_ok() {
        return Ok(());
    }
    if is_modified(repo)? {
        return Err(Error::LocalChanges {
            path: repo.to_path_buf(),
            files: modified_files(repo)?,
        });
    }
    run_git(repo, &["reset", "--hard", "FETCH_HEAD"])?;
    Ok(())
}

/// Fetch a tag shallowly and hard-reset onto it. Requires a clean tree.
pub fn fetch_and_reset_to_tag(repo: &Path, tag: &str) -> Result<()> {
    if is_modified(repo)? {
        return Err(Error::LocalChanges {
            path: repo.to_path_buf(),
            files: modified_files(repo)?,
        });
    }
    run_git(repo, &["fetch", "--depth", "1", "origin", tag])?;
    run_git(repo, &["reset", "--hard", "FETCH_HEAD"])?;
    Ok(())
}

/// Discard all local modifications under the given directory.
pub fn discard_local(path: &Path) -> Result<()> {
    run_git(path, &["checkout", "--", "."])?;
    run_git(path, &["clean", "-fd"])?;
    Ok(())
}

/// A directory is a valid skill iff it carries a `SKILL.md`.
pub fn validate_skill(dir: &Path) -> Result<()> {
    if dir.join("SKILL.md").is_file() {
        Ok(())
    } else {
        Err(Error::Validation {
            path: dir.to_path_buf(),
            missing: "SKILL.md",
        })
    }
}

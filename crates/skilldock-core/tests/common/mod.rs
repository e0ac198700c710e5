//! Shared fixtures: tiny local git repositories served over `file://`.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run git in `dir`, panicking on failure. Identity and signing are pinned
/// so fixtures commit anywhere.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-c")
        .arg("user.name=Fixture")
        .arg("-c")
        .arg("user.email=fixture@example.com")
        .arg("-c")
        .arg("commit.gpgsign=false")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialise a repository at `dir` with a deterministic default branch.
pub fn init_repo(dir: &Path) {
    fs::create_dir_all(dir).expect("create repo dir");
    git(dir, &["init", "--initial-branch=main"]);
}

pub fn commit_all(dir: &Path, message: &str) -> String {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

pub fn head(dir: &Path) -> String {
    git(dir, &["rev-parse", "HEAD"])
}

/// Write a `SKILL.md` (plus directory) at `repo/parts...`.
pub fn write_skill(repo: &Path, parts: &[&str], description: &str) -> PathBuf {
    let mut dir = repo.to_path_buf();
    for part in parts {
        dir.push(part);
    }
    fs::create_dir_all(&dir).expect("create skill dir");
    fs::write(
        dir.join("SKILL.md"),
        format!("---\ndescription: {description}\n---\n\n# Skill\n"),
    )
    .expect("write SKILL.md");
    dir
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// A committed fixture repo holding `skills/alpha` and `skills/beta`.
pub fn skills_fixture(base: &Path) -> PathBuf {
    let repo = base.join("skills-repo");
    init_repo(&repo);
    write_skill(&repo, &["skills", "alpha"], "first skill");
    write_skill(&repo, &["skills", "beta"], "second skill");
    commit_all(&repo, "add skills");
    repo
}

/// A committed single-skill fixture repo (SKILL.md at the root).
pub fn root_skill_fixture(base: &Path, name: &str) -> PathBuf {
    let repo = base.join(name);
    init_repo(&repo);
    write_skill(&repo, &[], "whole repo skill");
    commit_all(&repo, "initial");
    repo
}

/// Count `.git` entries directly under each child of `dir`.
pub fn git_dir_count(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|e| e.path().join(".git").exists())
        .count()
}

//! End-to-end harness: an isolated managed root + HOME, local git fixtures,
//! and a runner for the built binary.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

pub struct TestEnv {
    temp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir_all(temp.path().join("home")).unwrap();
        Self { temp }
    }

    pub fn base(&self) -> &Path {
        self.temp.path()
    }

    /// The managed root handed to every invocation via `--root`.
    pub fn root(&self) -> PathBuf {
        self.temp.path().join("dock")
    }

    fn home(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_skilldock"))
            .arg("--root")
            .arg(self.root())
            .args(args)
            .env("HOME", self.home())
            .env_remove("SKILLDOCK_HOME")
            .env_remove("XDG_CONFIG_HOME")
            .output()
            .expect("run skilldock")
    }

    /// Run and require success; returns stdout.
    pub fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "skilldock {:?} failed:\nstdout: {}\nstderr: {}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Run and require failure; returns stderr.
    pub fn fail(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "skilldock {:?} unexpectedly succeeded:\n{}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).into_owned()
    }
}

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

pub fn commit_all(dir: &Path, message: &str) -> String {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// A committed fixture repo holding `skills/alpha` and `skills/beta`,
/// registered as the remote called `main`.
pub fn fixture_with_remote(env: &TestEnv) -> PathBuf {
    let repo = env.base().join("skills-repo");
    fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "--initial-branch=main"]);
    write_skill(&repo, &["skills", "alpha"], "first skill");
    write_skill(&repo, &["skills", "beta"], "second skill");
    commit_all(&repo, "add skills");

    env.ok(&["repo", "add", "main", &file_url(&repo)]);
    repo
}

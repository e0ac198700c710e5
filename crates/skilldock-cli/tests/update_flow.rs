//! Update sweeps: refresh, skip-on-modification, force, dry-run.

mod common;

use std::fs;

use common::{commit_all, fixture_with_remote, TestEnv};

#[test]
fn update_pulls_upstream_changes() {
    let env = TestEnv::new();
    let repo = fixture_with_remote(&env);
    env.ok(&["install", "alpha"]);

    let stdout = env.ok(&["update", "alpha"]);
    assert!(stdout.contains("already up to date"), "stdout: {stdout}");

    fs::write(
        repo.join("skills/alpha/SKILL.md"),
        "---\ndescription: improved\n---\n",
    )
    .unwrap();
    commit_all(&repo, "improve alpha");

    let stdout = env.ok(&["update", "alpha"]);
    assert!(stdout.contains("->"), "stdout: {stdout}");
    assert!(stdout.contains("Updated 1 skill(s)"), "stdout: {stdout}");

    let content = fs::read_to_string(env.root().join("skills/alpha/SKILL.md")).unwrap();
    assert!(content.contains("improved"));
}

#[test]
fn modified_skills_are_skipped_then_forced() {
    let env = TestEnv::new();
    let repo = fixture_with_remote(&env);
    env.ok(&["install", "alpha"]);

    fs::write(env.root().join("skills/alpha/SKILL.md"), "local tweak\n").unwrap();
    fs::write(repo.join("skills/alpha/extra.md"), "upstream extra\n").unwrap();
    commit_all(&repo, "upstream change");

    let stdout = env.ok(&["update", "alpha"]);
    assert!(stdout.contains("local modifications"), "stdout: {stdout}");
    assert_eq!(
        fs::read_to_string(env.root().join("skills/alpha/SKILL.md")).unwrap(),
        "local tweak\n"
    );

    let stdout = env.ok(&["update", "--force", "alpha"]);
    assert!(stdout.contains("Updated 1 skill(s)"), "stdout: {stdout}");
    assert!(env.root().join("skills/alpha/extra.md").is_file());
    let content = fs::read_to_string(env.root().join("skills/alpha/SKILL.md")).unwrap();
    assert!(content.contains("first skill"), "local tweak discarded");
}

#[test]
fn updating_everything_reports_per_skill_rows() {
    let env = TestEnv::new();
    let repo = fixture_with_remote(&env);
    env.ok(&["install", "alpha"]);
    env.ok(&["install", "beta"]);

    fs::write(repo.join("skills/beta/SKILL.md"), "---\ndescription: v2\n---\n").unwrap();
    commit_all(&repo, "beta v2");

    let stdout = env.ok(&["update"]);
    assert!(stdout.contains("alpha:"), "stdout: {stdout}");
    assert!(stdout.contains("beta:"), "stdout: {stdout}");
}

#[test]
fn dry_run_previews_without_changing_anything() {
    let env = TestEnv::new();
    let repo = fixture_with_remote(&env);
    env.ok(&["install", "alpha"]);

    fs::write(repo.join("skills/alpha/SKILL.md"), "---\ndescription: next\n---\n").unwrap();
    commit_all(&repo, "next");

    let before = fs::read_to_string(env.root().join("manifest.yaml")).unwrap();
    let stdout = env.ok(&["update", "--dry-run"]);
    assert!(stdout.contains("would update"), "stdout: {stdout}");
    let after = fs::read_to_string(env.root().join("manifest.yaml")).unwrap();
    assert_eq!(before, after, "dry run must not touch the manifest");

    let content = fs::read_to_string(env.root().join("skills/alpha/SKILL.md")).unwrap();
    assert!(!content.contains("next"));
}

#[test]
fn updating_a_skill_that_is_not_installed_fails() {
    let env = TestEnv::new();
    fixture_with_remote(&env);
    env.ok(&["install", "alpha"]);

    let stderr = env.fail(&["update", "ghost"]);
    assert!(stderr.contains("not installed"), "stderr: {stderr}");
}

#[test]
fn update_with_nothing_installed_is_a_no_op() {
    let env = TestEnv::new();
    fixture_with_remote(&env);
    let stdout = env.ok(&["update"]);
    assert!(stdout.contains("No skills installed"));
}

use std::fs;

use anyhow::Result;

use skilldock_core::config::Config;
use skilldock_core::git;
use skilldock_core::manifest::{self, Manifest};
use skilldock_core::registry::Registry;
use skilldock_core::store::{SkillStore, UpdateOutcome};
use skilldock_core::Error;

use super::short;

pub fn run(cfg: &Config, name: Option<&str>, force: bool, dry_run: bool) -> Result<()> {
    let mut manifest = Manifest::load(&cfg.layout.manifest_path())?;
    if manifest.installed.is_empty() {
        println!("No skills installed");
        return Ok(());
    }

    if let Some(name) = name {
        if manifest.get(name).is_none() {
            return Err(Error::NotInstalled {
                name: name.to_string(),
            }
            .into());
        }
    }

    println!("Fetching skill index...");
    let mut registry = Registry::new(cfg);
    match registry.fetch(true) {
        Ok(()) => {}
        // Updates still work from the recorded provenance when no remotes
        // are configured; tags just cannot be re-resolved.
        Err(Error::NoRemotesConfigured) => {}
        Err(e) => return Err(e.into()),
    }

    let targets: Vec<String> = match name {
        Some(name) => vec![name.to_string()],
        None => manifest.installed.keys().cloned().collect(),
    };

    let store = SkillStore::new(&cfg.layout);
    let (mut updated, mut skipped, mut failed) = (0, 0, 0);

    for name in targets {
        if dry_run {
            preview(cfg, &registry, &manifest, &name, force, &mut updated, &mut skipped);
            continue;
        }

        let entry = registry.by_name(&name);
        match store.update(&name, entry, force, &mut manifest) {
            Ok(UpdateOutcome::Updated { from, to }) => {
                println!("  {name}: {} -> {}", short(&from), short(&to));
                updated += 1;
            }
            Ok(UpdateOutcome::UpToDate) => {
                println!("  {name}: already up to date");
                skipped += 1;
            }
            Ok(UpdateOutcome::Skipped { reason }) => {
                println!("  {name}: {reason}, skipping");
                skipped += 1;
            }
            Err(e) => {
                println!("  {name}: failed: {e}");
                failed += 1;
            }
        }
    }

    if dry_run {
        println!("\nWould update: {updated}, skip: {skipped}");
    } else {
        print!("\nUpdated {updated} skill(s)");
        if skipped > 0 {
            print!(", {skipped} skipped");
        }
        if failed > 0 {
            print!(", {failed} failed");
        }
        println!();
    }
    Ok(())
}

fn preview(
    cfg: &Config,
    registry: &Registry,
    manifest: &Manifest,
    name: &str,
    force: bool,
    updated: &mut usize,
    skipped: &mut usize,
) {
    let Some(entry) = registry.by_name(name) else {
        println!("  {name}: not found in registry (would skip)");
        *skipped += 1;
        return;
    };

    let link = manifest::skill_path(&cfg.layout.skills_dir(), name);
    let entry_path = fs::canonicalize(&link).unwrap_or(link);
    let modified = git::is_modified(&entry_path).unwrap_or(false);
    if modified && !force {
        println!("  {name}: has local changes (would skip)");
        *skipped += 1;
        return;
    }

    let current = manifest
        .get(name)
        .map(|r| r.version.clone())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "latest".to_string());
    let target = if entry.source.tag.is_empty() {
        "latest".to_string()
    } else {
        entry.source.tag.clone()
    };

    if modified {
        println!("  {name}: {current} -> {target} (would force update)");
    } else {
        println!("  {name}: {current} -> {target} (would update)");
    }
    *updated += 1;
}

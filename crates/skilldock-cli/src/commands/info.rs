use anyhow::Result;
use tracing::debug;

use skilldock_core::config::Config;
use skilldock_core::manifest::{self, Manifest};
use skilldock_core::registry::Registry;
use skilldock_core::store::SkillStore;
use skilldock_core::Error;

use super::short;

pub fn run(cfg: &Config, name: &str) -> Result<()> {
    let manifest = Manifest::load(&cfg.layout.manifest_path())?;
    let local = manifest::scan_local(&cfg.layout.skills_dir());

    // The index is best-effort here: info about an installed skill should
    // not require the network.
    let mut registry = Registry::new(cfg);
    if let Err(e) = registry.fetch(false) {
        debug!("index unavailable for info: {e}");
    }
    let entry = registry.by_name(name);

    let record = manifest.get(name);
    let local_skill = local.get(name);

    if record.is_none() && local_skill.is_none() && entry.is_none() {
        return Err(Error::SkillNotFound {
            name: name.to_string(),
        }
        .into());
    }

    println!("Skill: {name}");

    if let Some(description) = local_skill
        .map(|s| s.description.clone())
        .filter(|d| !d.is_empty())
        .or_else(|| entry.map(|e| e.description.clone()).filter(|d| !d.is_empty()))
    {
        println!("Description: {description}");
    }

    if let Some(entry) = entry {
        print!("Source: {}", entry.source.repo);
        if !entry.source.path.is_empty() {
            print!(" ({})", entry.source.path);
        }
        if !entry.source.remote_name.is_empty() {
            print!(" via remote '{}'", entry.source.remote_name);
        }
        println!();
        if !entry.author.is_empty() {
            println!("Author: {}", entry.author);
        }
        if !entry.tags.is_empty() {
            println!("Tags: {}", entry.tags.join(", "));
        }
    }

    match record {
        Some(record) => {
            let version = if record.version.is_empty() {
                "latest"
            } else {
                record.version.as_str()
            };
            println!(
                "Installed: {} ({version}) on {}",
                short(&record.commit),
                record.installed_at.format("%Y-%m-%d %H:%M")
            );

            let store = SkillStore::new(&cfg.layout);
            let modified = local_skill.map(|s| s.is_modified).unwrap_or(false);
            let present = local_skill.is_some();
            let status = if !present {
                "missing from disk"
            } else if modified {
                "locally modified"
            } else if store.is_outdated(name, record) {
                "update available"
            } else {
                "up to date"
            };
            println!("Status: {status}");
        }
        None if local_skill.is_some() => println!("Installed: no (local, untracked)"),
        None => println!("Installed: no"),
    }

    Ok(())
}

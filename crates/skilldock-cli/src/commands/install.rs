use std::fs;

use anyhow::Result;

use skilldock_core::config::Config;
use skilldock_core::manifest::{self, Manifest};
use skilldock_core::registry::Registry;
use skilldock_core::store::SkillStore;
use skilldock_core::{git, Error};

use super::{confirm, short};

pub fn run(cfg: &Config, spec: &str, force: bool) -> Result<()> {
    let (name, version) = parse_spec(spec);
    let mut manifest = Manifest::load(&cfg.layout.manifest_path())?;
    let skills_dir = cfg.layout.skills_dir();

    if manifest::is_present_on_disk(&skills_dir, name) {
        let link = manifest::skill_path(&skills_dir, name);
        let entry_path = fs::canonicalize(&link).unwrap_or(link);
        let modified = git::is_modified(&entry_path).unwrap_or(false);

        if modified && !force {
            println!("Skill {name} has local modifications:");
            for file in git::modified_files(&entry_path).unwrap_or_default() {
                println!("  {file}");
            }
            if !confirm("Overwrite? [y/N]: ") {
                println!("Cancelled");
                return Ok(());
            }
        } else if !modified && !force {
            return Err(Error::AlreadyInstalled {
                name: name.to_string(),
            }
            .into());
        }
    }

    println!("Fetching skill index...");
    let mut registry = Registry::new(cfg);
    registry.fetch(false)?;

    let entry = registry.by_name(name).ok_or_else(|| Error::SkillNotFound {
        name: name.to_string(),
    })?;

    match version.or_else(|| (!entry.source.tag.is_empty()).then_some(entry.source.tag.as_str())) {
        Some(tag) => println!("Installing {name}@{tag}..."),
        None => println!("Installing {name}..."),
    }

    let store = SkillStore::new(&cfg.layout);
    let installed = store.install(entry, version, &mut manifest)?;
    println!("Installed {name} at {}", short(&installed.commit));
    Ok(())
}

fn parse_spec(spec: &str) -> (&str, Option<&str>) {
    match spec.split_once('@') {
        Some((name, version)) if !version.is_empty() => (name, Some(version)),
        Some((name, _)) => (name, None),
        None => (spec, None),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_spec;

    #[test]
    fn spec_parsing() {
        assert_eq!(parse_spec("widget"), ("widget", None));
        assert_eq!(parse_spec("widget@v1.2.0"), ("widget", Some("v1.2.0")));
        assert_eq!(parse_spec("widget@"), ("widget", None));
    }
}

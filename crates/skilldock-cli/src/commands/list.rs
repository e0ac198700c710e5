use anyhow::Result;

use skilldock_core::config::Config;
use skilldock_core::manifest::{self, Manifest};

use super::short;

pub fn run(cfg: &Config) -> Result<()> {
    let manifest = Manifest::load(&cfg.layout.manifest_path())?;
    let local = manifest::scan_local(&cfg.layout.skills_dir());
    let classes = manifest::reconcile(&manifest, &local);

    if classes.tracked_present.is_empty()
        && classes.tracked_missing.is_empty()
        && classes.untracked.is_empty()
    {
        println!("No skills installed");
        return Ok(());
    }

    for name in &classes.tracked_present {
        let record = manifest.get(name).expect("tracked skill has a record");
        let skill = &local[name];
        let mut markers = String::new();
        if skill.is_modified {
            markers.push_str(" [modified]");
        }
        let version = if record.version.is_empty() {
            short(&record.commit).to_string()
        } else {
            record.version.clone()
        };
        println!("  {name} ({version}){markers}");
        if !skill.description.is_empty() {
            println!("      {}", skill.description);
        }
    }

    for name in &classes.tracked_missing {
        println!("  {name} (missing from disk)");
    }

    for name in &classes.untracked {
        let skill = &local[name];
        let mut markers = String::from(" (untracked)");
        if skill.is_modified {
            markers.push_str(" [modified]");
        }
        println!("  {name}{markers}");
        if !skill.description.is_empty() {
            println!("      {}", skill.description);
        }
    }

    Ok(())
}

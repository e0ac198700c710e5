use anyhow::Result;

use skilldock_core::config::Config;
use skilldock_core::paths;
use skilldock_core::symlink::{self, LinkStatus};

use super::confirm;

pub fn list(cfg: &Config) -> Result<()> {
    let statuses = symlink::check_backends(&cfg.backends, &cfg.layout.skills_dir());
    if statuses.is_empty() {
        println!("No backends configured.");
        return Ok(());
    }

    println!("Backends:");
    for status in &statuses {
        let path = paths::expand(&status.backend.path)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| status.backend.path.clone());

        let state = if status.linked {
            "linked".to_string()
        } else if let Some(e) = &status.error {
            format!("error: {e}")
        } else if status.has_files {
            "has files (run 'skilldock backend link' to migrate)".to_string()
        } else {
            "not linked".to_string()
        };

        println!("  {:<12} {:<34} {state}", status.backend.name, path);
        if !status.backend.description.is_empty() {
            println!("  {:<12} {}", "", status.backend.description);
        }
    }
    Ok(())
}

pub fn link(cfg: &Config, name: Option<&str>, yes: bool) -> Result<()> {
    cfg.layout.ensure_dirs()?;
    let skills_dir = cfg.layout.skills_dir();
    let statuses = symlink::check_backends(&cfg.backends, &skills_dir);

    let to_link: Vec<&LinkStatus> = match name {
        Some(name) => {
            let status = statuses
                .iter()
                .find(|s| s.backend.name == name)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "backend '{name}' not found; use 'skilldock backend list' to see configured backends"
                    )
                })?;
            if status.linked {
                println!("Backend '{name}' is already linked.");
                return Ok(());
            }
            vec![status]
        }
        None => {
            let unlinked = symlink::unlinked(&statuses);
            if unlinked.is_empty() {
                println!("All backends are already linked.");
                return Ok(());
            }
            unlinked
        }
    };

    for status in to_link {
        let backend = &status.backend;
        let path = paths::expand(&backend.path)?;

        if status.exists && status.is_symlink {
            // Points somewhere else; repoint it.
            symlink::remove(backend)?;
            symlink::create(backend, &skills_dir)?;
            println!("Relinked '{}' -> {}", backend.name, skills_dir.display());
            continue;
        }

        if status.exists && status.has_files {
            println!("Backend '{}': {} exists with files.", backend.name, path.display());
            if !yes {
                let prompt = format!(
                    "Move its contents to {} and create a symlink? [y/N]: ",
                    skills_dir.display()
                );
                if !confirm(&prompt) {
                    println!("Skipping '{}'.", backend.name);
                    continue;
                }
            }
            let report = symlink::migrate(backend, &skills_dir)?;
            for skipped in &report.skipped {
                println!(
                    "  kept in place (already exists centrally): {skipped}"
                );
            }
            if report.blocked() {
                println!(
                    "Could not link '{}': resolve the conflicts above, then rerun.",
                    backend.name
                );
            } else {
                println!("Migrated {} entries and linked '{}'", report.moved.len(), backend.name);
            }
            continue;
        }

        if status.exists {
            // An empty directory; migrate handles removal and linking.
            symlink::migrate(backend, &skills_dir)?;
            println!("Linked '{}'", backend.name);
            continue;
        }

        symlink::create(backend, &skills_dir)?;
        println!(
            "Linked '{}': {} -> {}",
            backend.name,
            path.display(),
            skills_dir.display()
        );
    }

    Ok(())
}

pub fn unlink(cfg: &Config, name: &str) -> Result<()> {
    let backend = cfg
        .backend(name)
        .ok_or_else(|| anyhow::anyhow!("backend '{name}' not found"))?;

    let status = symlink::inspect(backend, &cfg.layout.skills_dir());
    if !status.linked {
        println!("Backend '{name}' is not linked.");
        return Ok(());
    }

    symlink::remove(backend)?;
    println!("Unlinked '{name}'");
    Ok(())
}

pub fn add(cfg: &mut Config, name: &str, path: &str, description: &str) -> Result<()> {
    cfg.add_backend(name, path, description);
    cfg.save()?;
    println!("Added backend '{name}': {path}");
    println!("Run 'skilldock backend link {name}' to create the symlink.");
    Ok(())
}

pub fn remove(cfg: &mut Config, name: &str) -> Result<()> {
    if let Some(backend) = cfg.backend(name) {
        if backend.builtin {
            return Err(anyhow::anyhow!("cannot remove built-in backend '{name}'"));
        }
        let status = symlink::inspect(backend, &cfg.layout.skills_dir());
        if status.linked {
            if let Err(e) = symlink::remove(backend) {
                eprintln!("warning: could not remove symlink: {e}");
            }
        }
    }

    if cfg.remove_backend(name) {
        cfg.save()?;
        println!("Removed backend '{name}'");
    } else {
        println!("Backend '{name}' is not configured");
    }
    Ok(())
}

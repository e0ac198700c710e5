use anyhow::Result;

use skilldock_core::config::Config;

pub fn add(cfg: &mut Config, name: &str, url: &str) -> Result<()> {
    cfg.add_remote(name, url);
    cfg.save()?;
    println!("Added repository '{name}': {url}");
    Ok(())
}

pub fn remove(cfg: &mut Config, name: &str) -> Result<()> {
    if cfg.remove_remote(name) {
        cfg.save()?;
        println!("Removed repository '{name}'");
    } else {
        println!("Repository '{name}' is not configured");
    }
    Ok(())
}

pub fn list(cfg: &Config) -> Result<()> {
    if cfg.remotes.is_empty() {
        println!("No repositories configured.");
        println!("Add one with: skilldock repo add <name> <url>");
        return Ok(());
    }
    for remote in &cfg.remotes {
        println!("  {:<16} {}", remote.name, remote.url);
    }
    Ok(())
}

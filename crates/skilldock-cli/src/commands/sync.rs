use anyhow::Result;

use skilldock_core::config::Config;
use skilldock_core::registry::Registry;

pub fn run(cfg: &Config) -> Result<()> {
    println!("Syncing repositories...");
    let mut registry = Registry::new(cfg);
    registry.fetch(true)?;
    println!("Synced. {} skill(s) available.", registry.list().len());
    Ok(())
}

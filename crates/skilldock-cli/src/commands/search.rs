use anyhow::Result;

use skilldock_core::config::Config;
use skilldock_core::registry::Registry;

pub fn run(cfg: &Config, query: &str) -> Result<()> {
    let mut registry = Registry::new(cfg);
    registry.fetch(false)?;

    let matches = registry.search(query);
    if matches.is_empty() {
        println!("No skills match '{query}'");
        return Ok(());
    }

    for skill in matches {
        let origin = if skill.source.remote_name.is_empty() {
            String::new()
        } else {
            format!(" [{}]", skill.source.remote_name)
        };
        println!("  {}{origin}", skill.name);
        if !skill.description.is_empty() {
            println!("      {}", skill.description);
        }
    }
    Ok(())
}

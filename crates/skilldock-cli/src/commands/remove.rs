use anyhow::Result;

use skilldock_core::config::Config;
use skilldock_core::manifest::Manifest;
use skilldock_core::store::SkillStore;

pub fn run(cfg: &Config, name: &str) -> Result<()> {
    let mut manifest = Manifest::load(&cfg.layout.manifest_path())?;
    let store = SkillStore::new(&cfg.layout);
    store.remove(name, &mut manifest)?;
    println!("Removed {name}");
    Ok(())
}

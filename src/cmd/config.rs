use std::path::Path;

use anyhow::Result;

use selmd::config::config_path;
use selmd::Config;

pub fn cmd_config(config: &Config, explicit: Option<&Path>, path_only: bool) -> Result<()> {
    let path = explicit.map_or_else(config_path, Path::to_path_buf);
    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    let source = if path.exists() { "loaded" } else { "defaults, file not found" };
    println!("# {} ({source})", path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}

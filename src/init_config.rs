//! Writes a default configuration file

use std::path::PathBuf;

use harvest_ap::config::{default_config, default_config_path, ConfigError};

pub fn run(args: &[String]) -> Result<(), ConfigError> {
    let path = args
        .first()
        .map_or_else(default_config_path, PathBuf::from);

    if path.exists() {
        eprintln!("Refusing to overwrite existing config at {}", path.display());
        std::process::exit(1);
    }

    default_config().save_to_file(&path)?;
    println!("Wrote config to {}", path.display());
    Ok(())
}

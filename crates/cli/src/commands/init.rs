//! `aicode init`: write a starter config and the workspace state directories.

use std::path::PathBuf;

use aicode_config::{AppConfig, WORKSPACE_STATE_DIR};

pub async fn run(path: Option<PathBuf>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = path.unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    if config_path.exists() && !force {
        println!(
            "  Config already exists: {} (use --force to overwrite)",
            config_path.display()
        );
    } else {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Wrote config: {}", config_path.display());
    }

    let config = AppConfig::load_from(&config_path)?;
    let state_dir = config.workspace_root().join(WORKSPACE_STATE_DIR);
    for dir in [config.sessions_dir(), state_dir.join("skills")] {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            println!("✅ Created {}", dir.display());
        }
    }

    Ok(())
}

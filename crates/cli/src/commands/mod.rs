pub mod init;
pub mod parse;
pub mod run;
pub mod sessions;
pub mod skills;

use std::path::PathBuf;
use std::sync::Arc;

use aicode_config::AppConfig;
use aicode_tools::FileSystemSkillRegistry;

/// Load config from `path` if given, else the default location.
pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            let mut config = AppConfig::load_from(&path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => AppConfig::load()?,
    };
    Ok(config)
}

/// The skill registry, or `None` when skills are disabled.
pub fn load_skills(config: &AppConfig) -> Option<Arc<FileSystemSkillRegistry>> {
    config
        .skills
        .enabled
        .then(|| Arc::new(FileSystemSkillRegistry::load(&config.skill_dirs())))
}

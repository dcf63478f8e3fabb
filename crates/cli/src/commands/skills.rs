//! `aicode skills`: list discovered skills.

use std::path::PathBuf;

use aicode_core::SkillSource;

use super::{load_config, load_skills};

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let Some(registry) = load_skills(&config) else {
        println!("Skills are disabled in the config.");
        return Ok(());
    };

    let skills = registry.skills();
    if skills.is_empty() {
        println!("No skills found. Searched:");
        for dir in config.skill_dirs() {
            println!("  {}", dir.display());
        }
        return Ok(());
    }

    for skill in skills {
        println!("{:<24} {}", skill.name, skill.description);
        println!("{:<24} {}", "", skill.path.display());
    }
    Ok(())
}

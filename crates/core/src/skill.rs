//! Skill source: named, described bundles of supplementary instructions.
//!
//! The agent only lists skills in its system prompt; the body of a skill
//! is pulled in by the model through the `load_skill` tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique skill name (from front matter)
    pub name: String,

    /// One-line description (from front matter)
    pub description: String,

    /// Skill root directory
    pub path: PathBuf,
}

#[async_trait]
pub trait SkillSource: Send + Sync {
    /// All available skills, for prompt augmentation.
    fn skills(&self) -> Vec<Skill>;

    /// Full instruction body of a skill, if it exists and can be read.
    async fn skill_content(&self, name: &str) -> Option<String>;
}

//! Filesystem skill registry.
//!
//! A skill is a directory containing a `SKILL.md` file:
//!
//! ```text
//! ---
//! name: release
//! description: Cut a release
//! ---
//! Step-by-step instructions...
//! ```
//!
//! Directories are scanned in priority order, lowest first, and a skill
//! found later replaces an earlier one with the same name. The default
//! order is user (`~/.aicoding/skills`) then project
//! (`<workspace>/.aicoding/skills`).

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

use aicode_core::{Skill, SkillSource};

const SKILL_FILE: &str = "SKILL.md";

static FRONT_MATTER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)^---\r?\n(.*?)\r?\n---\r?\n?").ok());

#[derive(Debug, Default, Deserialize)]
struct SkillMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Skills discovered on disk, keyed by name.
#[derive(Debug, Default)]
pub struct FileSystemSkillRegistry {
    skills: BTreeMap<String, Skill>,
}

impl FileSystemSkillRegistry {
    /// Scan `dirs` in order. Missing directories are skipped.
    pub fn load(dirs: &[PathBuf]) -> Self {
        let mut registry = Self::default();
        for dir in dirs {
            registry.load_dir(dir);
        }
        debug!(count = registry.skills.len(), "Skills loaded");
        registry
    }

    fn load_dir(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to scan skill directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let skill_dir = entry.path();
            if !skill_dir.is_dir() {
                continue;
            }

            let raw = match std::fs::read_to_string(skill_dir.join(SKILL_FILE)) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(skill = %skill_dir.display(), error = %e, "Failed to load skill");
                    continue;
                }
            };

            let (metadata, _) = split_front_matter(&raw);
            match (metadata.name, metadata.description) {
                (Some(name), Some(description)) if !name.is_empty() && !description.is_empty() => {
                    if self.skills.contains_key(&name) {
                        debug!(skill = %name, dir = %dir.display(), "Skill overridden");
                    }
                    self.skills.insert(
                        name.clone(),
                        Skill {
                            name,
                            description,
                            path: skill_dir,
                        },
                    );
                }
                _ => warn!(
                    skill = %skill_dir.display(),
                    "SKILL.md missing name or description, skipping"
                ),
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.get(name)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[async_trait]
impl SkillSource for FileSystemSkillRegistry {
    fn skills(&self) -> Vec<Skill> {
        self.skills.values().cloned().collect()
    }

    async fn skill_content(&self, name: &str) -> Option<String> {
        let skill = self.skills.get(name)?;
        match tokio::fs::read_to_string(skill.path.join(SKILL_FILE)).await {
            Ok(raw) => Some(split_front_matter(&raw).1),
            Err(e) => {
                warn!(skill = %name, error = %e, "Failed to read skill content");
                None
            }
        }
    }
}

/// Split a `SKILL.md` into its YAML header and trimmed body.
fn split_front_matter(content: &str) -> (SkillMetadata, String) {
    let Some(re) = FRONT_MATTER.as_ref() else {
        return (SkillMetadata::default(), content.trim().to_string());
    };
    let Some(captures) = re.captures(content) else {
        return (SkillMetadata::default(), content.trim().to_string());
    };
    let (Some(header), Some(full)) = (captures.get(1), captures.get(0)) else {
        return (SkillMetadata::default(), content.trim().to_string());
    };

    let metadata = serde_yaml::from_str::<SkillMetadata>(header.as_str()).unwrap_or_else(|e| {
        warn!("Failed to parse skill front matter: {e}");
        SkillMetadata::default()
    });
    (metadata, content[full.end()..].trim().to_string())
}

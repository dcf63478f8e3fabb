//! Configuration loading, validation, and management for aicode.
//!
//! Loads configuration from `~/.aicode/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory (relative to the workspace root) holding sessions and skills.
pub const WORKSPACE_STATE_DIR: &str = ".aicoding";

/// The root configuration structure.
///
/// Maps directly to `~/.aicode/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root (defaults to the current directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Context store settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Skill discovery settings
    #[serde(default)]
    pub skills: SkillsConfig,
}

/// How the agent loop extracts an action from a model turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// `Final Answer:` check plus `Action:` / `Action Input:` regexes
    #[default]
    React,
    /// The full multi-format response parser
    MultiFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model turns per run (safety limit)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default)]
    pub extraction: ExtractionMode,

    /// Replace the generated ReAct system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_max_iterations() -> u32 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            extraction: ExtractionMode::default(),
            system_prompt_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Messages sent to the model per turn, system prompt included
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Bytes read from each session file when listing sessions
    #[serde(default = "default_preview_bytes")]
    pub preview_bytes: usize,

    /// Override for `<workspace>/.aicoding/sessions`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_dir: Option<PathBuf>,
}

fn default_max_messages() -> usize {
    50
}
fn default_preview_bytes() -> usize {
    2048
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            preview_bytes: default_preview_bytes(),
            sessions_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Skill directories, lowest priority first. Defaults to the user
    /// directory followed by the project directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirs: Option<Vec<PathBuf>>,
}

fn default_true() -> bool {
    true
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dirs: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.aicode/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// `AICODING_MAX_ITERATIONS`, `AICODING_SESSIONS_DIR`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`, then re-validate.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("AICODING_MAX_ITERATIONS") {
            self.agent.max_iterations = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "AICODING_MAX_ITERATIONS must be a positive integer, got {raw:?}"
                ))
            })?;
        }
        if let Some(dir) = lookup("AICODING_SESSIONS_DIR") {
            self.context.sessions_dir = Some(PathBuf::from(dir));
        }
        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aicode")
    }

    /// The workspace root, falling back to the current directory.
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Where session logs live.
    pub fn sessions_dir(&self) -> PathBuf {
        self.context.sessions_dir.clone().unwrap_or_else(|| {
            self.workspace_root()
                .join(WORKSPACE_STATE_DIR)
                .join("sessions")
        })
    }

    /// Skill directories, lowest priority first.
    pub fn skill_dirs(&self) -> Vec<PathBuf> {
        match &self.skills.dirs {
            Some(dirs) => dirs.clone(),
            None => vec![
                dirs_home().join(WORKSPACE_STATE_DIR).join("skills"),
                self.workspace_root()
                    .join(WORKSPACE_STATE_DIR)
                    .join("skills"),
            ],
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.context.max_messages < 2 {
            return Err(ConfigError::ValidationError(
                "context.max_messages must be at least 2 (system prompt + one message)".into(),
            ));
        }

        if self.context.preview_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "context.preview_bytes must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.agent.extraction, ExtractionMode::React);
        assert_eq!(config.context.max_messages, 50);
        assert_eq!(config.context.preview_bytes, 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.agent.max_iterations, config.agent.max_iterations);
        assert_eq!(parsed.context.max_messages, config.context.max_messages);
        assert_eq!(parsed.agent.extraction, config.agent.extraction);
    }

    #[test]
    fn parses_sections() {
        let toml_str = r#"
workspace_root = "/work"

[agent]
max_iterations = 4
extraction = "multi_format"

[context]
max_messages = 20
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agent.max_iterations, 4);
        assert_eq!(config.agent.extraction, ExtractionMode::MultiFormat);
        assert_eq!(config.context.max_messages, 20);
        assert_eq!(config.context.preview_bytes, 2048);
        assert_eq!(
            config.sessions_dir(),
            PathBuf::from("/work/.aicoding/sessions")
        );
    }

    #[test]
    fn window_smaller_than_two_rejected() {
        let mut config = AppConfig::default();
        config.context.max_messages = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AICODING_MAX_ITERATIONS", "3"),
            ("AICODING_SESSIONS_DIR", "/tmp/sessions"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.sessions_dir(), PathBuf::from("/tmp/sessions"));
    }

    #[test]
    fn bad_iteration_override_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|k| (k == "AICODING_MAX_ITERATIONS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().agent.max_iterations, 10);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "agent = [").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_iterations = 10"));
        assert!(toml_str.contains("max_messages = 50"));
    }
}

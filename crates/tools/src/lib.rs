//! Built-in tool implementations for aicode.
//!
//! Tools give the agent the ability to work on the user's project:
//! read, write and list files under the workspace root, and load skills
//! (on-demand instruction bundles) into the conversation.

pub mod file_read;
pub mod file_write;
pub mod list_files;
pub mod load_skill;
pub mod skills;
pub mod workspace;

use std::path::Path;
use std::sync::Arc;

use aicode_core::tool::ToolRegistry;
use aicode_core::SkillSource;

pub use skills::FileSystemSkillRegistry;
pub use workspace::Workspace;

/// Create a tool registry with all built-in tools.
///
/// File tools are confined to `workspace_root`. `load_skill` is only
/// registered when a skill source is supplied.
pub fn default_registry(
    workspace_root: &Path,
    skills: Option<Arc<dyn SkillSource>>,
) -> ToolRegistry {
    let workspace = Arc::new(Workspace::new(workspace_root));
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(file_read::FileReadTool::new(workspace.clone())));
    registry.register(Box::new(file_write::FileWriteTool::new(workspace.clone())));
    registry.register(Box::new(list_files::ListFilesTool::new(workspace)));
    if let Some(skills) = skills {
        registry.register(Box::new(load_skill::LoadSkillTool::new(skills)));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_without_skills() {
        let registry = default_registry(Path::new("/tmp"), None);
        assert_eq!(registry.names(), vec!["file_read", "file_write", "list_files"]);
    }

    #[test]
    fn registry_with_skills() {
        let skills: Arc<dyn SkillSource> = Arc::new(FileSystemSkillRegistry::default());
        let registry = default_registry(Path::new("/tmp"), Some(skills));
        assert!(registry.get("load_skill").is_some());
        assert_eq!(registry.len(), 4);
    }

    #[tokio::test]
    async fn registry_executes_workspace_tools() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(dir.path(), None);

        registry
            .execute(
                "file_write",
                serde_json::json!({"path": "notes.md", "content": "# Notes"}),
            )
            .await
            .unwrap();
        let content = registry
            .execute("file_read", serde_json::json!({"path": "notes.md"}))
            .await
            .unwrap();
        assert_eq!(content, "# Notes");
    }
}

//! File write tool: create or overwrite a workspace file.

use async_trait::async_trait;
use std::sync::Arc;

use aicode_core::error::ToolError;
use aicode_core::tool::Tool;

use crate::workspace::Workspace;

pub struct FileWriteTool {
    workspace: Arc<Workspace>,
}

impl FileWriteTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a workspace file. Creates the file and any missing parent \
         directories, overwrites the file if it exists."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the workspace root"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;

        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        self.workspace.write_file(path, content).await?;
        tracing::debug!(path, bytes = content.len(), "File written");
        Ok(format!("Successfully wrote to {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition() {
        let tool = FileWriteTool::new(Arc::new(Workspace::new("/tmp")));
        assert_eq!(tool.name(), "file_write");
        let schema = tool.parameters_schema();
        assert_eq!(schema["required"], serde_json::json!(["path", "content"]));
    }

    #[tokio::test]
    async fn write_new_file_with_parents() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileWriteTool::new(Arc::new(Workspace::new(dir.path())));

        let output = tool
            .execute(serde_json::json!({"path": "sub/dir/out.txt", "content": "hi"}))
            .await
            .unwrap();

        assert_eq!(output, "Successfully wrote to sub/dir/out.txt");
        let written = std::fs::read_to_string(dir.path().join("sub/dir/out.txt")).unwrap();
        assert_eq!(written, "hi");
    }

    #[tokio::test]
    async fn missing_content_argument() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileWriteTool::new(Arc::new(Workspace::new(dir.path())));
        let result = tool.execute(serde_json::json!({"path": "x.txt"})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn write_outside_root_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileWriteTool::new(Arc::new(Workspace::new(dir.path().join("inner"))));
        let result = tool
            .execute(serde_json::json!({"path": "../escape.txt", "content": "x"}))
            .await;

        assert!(matches!(result, Err(ToolError::PermissionDenied(_))));
        assert!(!dir.path().join("escape.txt").exists());
    }
}

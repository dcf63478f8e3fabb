//! Workspace root: every file tool resolves paths through here.
//!
//! Paths are resolved lexically against the root (`.` and `..` folded, no
//! symlink resolution) and anything landing outside the root is refused.

use std::path::{Component, Path, PathBuf};

use aicode_core::error::ToolError;

const OUTSIDE_ROOT: &str = "Access denied: Path is outside workspace root.";

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let absolute = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            root: normalize(&absolute),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` (or an absolute path) inside the workspace.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ToolError> {
        let full = normalize(&self.root.join(relative));
        if full.starts_with(&self.root) {
            Ok(full)
        } else {
            Err(ToolError::PermissionDenied(OUTSIDE_ROOT.into()))
        }
    }

    pub async fn read_file(&self, relative: &str) -> Result<String, ToolError> {
        let path = self.resolve(relative)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to read {relative}: {e}")))
    }

    /// Write a file, creating parent directories as needed.
    pub async fn write_file(&self, relative: &str, content: &str) -> Result<(), ToolError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ToolError::ExecutionFailed(format!("Failed to create directories: {e}"))
            })?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to write {relative}: {e}")))
    }

    /// Entry names directly under `relative`, sorted. Directories end in `/`.
    pub async fn list_files(&self, relative: &str) -> Result<Vec<String>, ToolError> {
        let path = self.resolve(relative)?;
        let mut dir = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to list {relative}: {e}")))?;

        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to list {relative}: {e}")))?
        {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }
}

/// Fold `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

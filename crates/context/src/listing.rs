//! Session listing with short previews.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use aicode_core::error::ContextError;
use aicode_core::message::{ChatMessage, Role};

const PREVIEW_CHARS: usize = 80;
const NO_PREVIEW: &str = "No preview available";

/// Listing metadata for one stored session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub path: PathBuf,
    pub last_modified: DateTime<Utc>,
    pub preview: String,
}

/// Enumerate `session_*.jsonl` logs under `sessions_dir`, newest first.
///
/// Only the first `preview_bytes` of each log are read. Files that cannot
/// be read are skipped. A missing directory lists as empty.
pub fn list_sessions(
    sessions_dir: &Path,
    preview_bytes: usize,
) -> Result<Vec<SessionInfo>, ContextError> {
    let entries = match std::fs::read_dir(sessions_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ContextError::Storage(format!(
                "Failed to list {}: {e}",
                sessions_dir.display()
            )));
        }
    };

    let mut sessions = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(id) = file_name
            .to_str()
            .and_then(|name| name.strip_prefix("session_"))
            .and_then(|rest| rest.strip_suffix(".jsonl"))
        else {
            continue;
        };

        let path = entry.path();
        match describe(&path, preview_bytes) {
            Ok((last_modified, preview)) => sessions.push(SessionInfo {
                id: id.to_string(),
                path,
                last_modified,
                preview,
            }),
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable session"),
        }
    }

    sessions.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    Ok(sessions)
}

fn describe(path: &Path, preview_bytes: usize) -> std::io::Result<(DateTime<Utc>, String)> {
    let modified = std::fs::metadata(path)?.modified()?;

    let mut prefix = Vec::with_capacity(preview_bytes);
    File::open(path)?
        .take(preview_bytes as u64)
        .read_to_end(&mut prefix)?;
    let text = String::from_utf8_lossy(&prefix);

    Ok((DateTime::<Utc>::from(modified), preview_from(&text)))
}

/// The first user message in `prefix`, else the first record as
/// `[role] content`, trimmed to one short line.
fn preview_from(prefix: &str) -> String {
    let lines: Vec<&str> = prefix.lines().filter(|l| !l.trim().is_empty()).collect();

    let first_user = lines
        .iter()
        .filter_map(|l| serde_json::from_str::<ChatMessage>(l).ok())
        .find(|m| m.role == Role::User);

    let preview = match first_user {
        Some(message) => message.content,
        None => lines
            .first()
            .and_then(|l| serde_json::from_str::<ChatMessage>(l).ok())
            .map(|m| format!("[{}] {}", m.role, m.content))
            .unwrap_or_else(|| NO_PREVIEW.to_string()),
    };

    shorten(&preview)
}

fn shorten(preview: &str) -> String {
    let flat = preview.replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

//! `aicode sessions`, `history` and `clear`: session management.

use std::path::PathBuf;

use aicode_context::{
    JsonlContextStore, list_sessions, session_file, validate_session_id,
};
use aicode_core::ContextManager;

use super::load_config;

pub async fn list(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let sessions = list_sessions(&config.sessions_dir(), config.context.preview_bytes)?;

    if sessions.is_empty() {
        println!("No sessions in {}", config.sessions_dir().display());
        return Ok(());
    }

    for session in sessions {
        println!(
            "{}  {}  {}",
            session.last_modified.format("%Y-%m-%d %H:%M:%S"),
            session.id,
            session.preview
        );
    }
    Ok(())
}

pub async fn history(
    config_path: Option<PathBuf>,
    id: String,
    full: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    validate_session_id(&id)?;
    let config = load_config(config_path)?;
    let sessions_dir = config.sessions_dir();
    if !session_file(&sessions_dir, &id).exists() {
        return Err(format!("Session not found: {id}").into());
    }

    let store = JsonlContextStore::new(sessions_dir, id, config.context.max_messages);
    let messages = if full {
        store.full_history().await?
    } else {
        store.history().await?
    };

    for message in messages {
        println!("[{}] {}", message.role, message.content);
        println!();
    }
    Ok(())
}

pub async fn clear(
    config_path: Option<PathBuf>,
    id: String,
) -> Result<(), Box<dyn std::error::Error>> {
    validate_session_id(&id)?;
    let config = load_config(config_path)?;
    let store = JsonlContextStore::new(
        config.sessions_dir(),
        id.clone(),
        config.context.max_messages,
    );
    store.clear()?;
    println!("✅ Cleared session {id}");
    Ok(())
}

//! JSONL session store: append-only conversation log per session.
//!
//! Storage location: `<sessions_dir>/session_<id>.jsonl`, one JSON-encoded
//! `ChatMessage` per line.
//!
//! Reads are served from an in-memory cache of the full conversation,
//! hydrated lazily from the log on first read. Writes update the cache
//! synchronously and are handed to a single writer task that appends them
//! to disk one at a time, in submission order. A record that fails to
//! append is logged and dropped.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use aicode_core::error::ContextError;
use aicode_core::message::{ChatMessage, estimate_tokens};
use aicode_core::ContextManager;

use crate::window::sliding_window;

/// Path of the log for `session_id` under `sessions_dir`.
pub fn session_file(sessions_dir: &Path, session_id: &str) -> PathBuf {
    sessions_dir.join(format!("session_{session_id}.jsonl"))
}

/// Check that `session_id` names a file inside the sessions directory.
pub fn validate_session_id(session_id: &str) -> Result<(), ContextError> {
    if session_id.is_empty()
        || session_id.contains(['/', '\\', '\0'])
        || session_id.contains("..")
    {
        return Err(ContextError::InvalidSessionId(session_id.to_string()));
    }
    Ok(())
}

/// One serialized message on its way to disk.
struct PendingRecord {
    path: PathBuf,
    generation: u64,
    seq: u64,
    line: String,
}

enum WriteCommand {
    Append(PendingRecord),
    Flush(oneshot::Sender<()>),
}

/// State shared between the store and its writer task.
struct WriterShared {
    /// Bumped by `switch_session` and `clear`; older records are discarded.
    generation: AtomicU64,
    /// Every record with a smaller sequence number has been processed.
    applied: AtomicU64,
    /// Processed records that never reached the log.
    failed: Mutex<BTreeSet<u64>>,
    /// Held for each append, and while the log is read or deleted.
    io_lock: Mutex<()>,
}

impl WriterShared {
    fn io(&self) -> MutexGuard<'_, ()> {
        self.io_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn failed(&self) -> MutexGuard<'_, BTreeSet<u64>> {
        self.failed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn append(&self, record: &PendingRecord) -> std::io::Result<bool> {
        let _io = self.io();
        self.applied.store(record.seq + 1, Ordering::SeqCst);

        if record.generation != self.generation.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let written = write_line(&record.path, &record.line);
        if written.is_err() {
            self.failed().insert(record.seq);
        }
        written.map(|()| true)
    }
}

fn write_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

struct SessionState {
    session_id: String,
    path: PathBuf,
    /// The full, unwindowed conversation once hydrated.
    cache: Option<Vec<ChatMessage>>,
    /// Messages added before hydration, keyed by sequence number.
    cold_writes: Vec<(u64, ChatMessage)>,
    next_seq: u64,
}

/// A file-backed session store using JSONL (one message per line).
pub struct JsonlContextStore {
    sessions_dir: PathBuf,
    max_messages: usize,
    state: Mutex<SessionState>,
    shared: Arc<WriterShared>,
    writer: mpsc::UnboundedSender<WriteCommand>,
}

impl JsonlContextStore {
    /// Open (or start) session `session_id` under `sessions_dir`.
    ///
    /// Spawns the writer task, so this must be called inside a Tokio runtime.
    /// The log is not read until the first `history()` call.
    pub fn new(
        sessions_dir: impl Into<PathBuf>,
        session_id: impl Into<String>,
        max_messages: usize,
    ) -> Self {
        let sessions_dir = sessions_dir.into();
        let session_id = session_id.into();
        let path = session_file(&sessions_dir, &session_id);

        let shared = Arc::new(WriterShared {
            generation: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            failed: Mutex::new(BTreeSet::new()),
            io_lock: Mutex::new(()),
        });
        let (writer, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(rx, shared.clone()));

        debug!(session_id = %session_id, path = %path.display(), "JSONL session store opened");

        Self {
            sessions_dir,
            max_messages,
            state: Mutex::new(SessionState {
                session_id,
                path,
                cache: None,
                cold_writes: Vec::new(),
                next_seq: 0,
            }),
            shared,
            writer,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn session_id(&self) -> String {
        self.state().session_id.clone()
    }

    /// Path of the current session's log.
    pub fn path(&self) -> PathBuf {
        self.state().path.clone()
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Point the store at another session.
    ///
    /// Writes still queued for the previous session are discarded and the
    /// next read hydrates from the new session's log.
    pub fn switch_session(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        let mut state = self.state();
        {
            let _io = self.shared.io();
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            self.shared.failed().clear();
        }
        let dropped = state.cold_writes.len();
        state.path = session_file(&self.sessions_dir, &session_id);
        state.session_id = session_id;
        state.cache = None;
        state.cold_writes.clear();
        debug!(session_id = %state.session_id, dropped, "Switched session");
    }

    /// Wait until every message added before this call has been processed
    /// by the writer.
    pub async fn flush(&self) -> Result<(), ContextError> {
        let (tx, rx) = oneshot::channel();
        self.writer
            .send(WriteCommand::Flush(tx))
            .map_err(|_| ContextError::WriterClosed)?;
        rx.await.map_err(|_| ContextError::WriterClosed)
    }

    /// The full conversation, without windowing.
    pub async fn full_history(&self) -> Result<Vec<ChatMessage>, ContextError> {
        if let Some(cache) = &self.state().cache {
            return Ok(cache.clone());
        }

        let (path, generation) = {
            let state = self.state();
            (
                state.path.clone(),
                self.shared.generation.load(Ordering::SeqCst),
            )
        };
        let shared = self.shared.clone();
        let (from_disk, applied, failed) = tokio::task::spawn_blocking(move || {
            let _io = shared.io();
            let messages = read_log(&path)?;
            let applied = shared.applied.load(Ordering::SeqCst);
            let failed = shared.failed().clone();
            Ok::<_, ContextError>((messages, applied, failed))
        })
        .await
        .map_err(|e| ContextError::Storage(format!("Session read task failed: {e}")))??;

        let mut state = self.state();
        if let Some(cache) = &state.cache {
            return Ok(cache.clone());
        }

        let mut full = from_disk;
        full.extend(
            state
                .cold_writes
                .iter()
                .filter(|(seq, _)| *seq >= applied || failed.contains(seq))
                .map(|(_, message)| message.clone()),
        );

        if generation == self.shared.generation.load(Ordering::SeqCst) {
            debug!(session_id = %state.session_id, count = full.len(), "Session hydrated");
            let next_seq = state.next_seq;
            self.shared.failed().retain(|seq| *seq >= next_seq);
            state.cold_writes.clear();
            state.cache = Some(full.clone());
        }
        Ok(full)
    }
}

#[async_trait]
impl ContextManager for JsonlContextStore {
    fn add_message(&self, message: ChatMessage) {
        let line = serde_json::to_string(&message)
            .map_err(|e| error!(error = %e, "Failed to serialize message; not persisted"))
            .ok();

        let mut state = self.state();
        let seq = state.next_seq;
        state.next_seq += 1;

        if let Some(line) = line {
            let record = PendingRecord {
                path: state.path.clone(),
                generation: self.shared.generation.load(Ordering::SeqCst),
                seq,
                line,
            };
            if self.writer.send(WriteCommand::Append(record)).is_err() {
                warn!(session_id = %state.session_id, "Session writer stopped; message not persisted");
            }
        }

        match state.cache.as_mut() {
            Some(cache) => cache.push(message),
            None => state.cold_writes.push((seq, message)),
        }
    }

    async fn history(&self) -> Result<Vec<ChatMessage>, ContextError> {
        let full = self.full_history().await?;
        Ok(sliding_window(&full, self.max_messages))
    }

    async fn token_count(&self) -> Result<usize, ContextError> {
        Ok(estimate_tokens(&self.full_history().await?))
    }

    fn clear(&self) -> Result<(), ContextError> {
        let mut state = self.state();
        let _io = self.shared.io();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.failed().clear();
        state.cache = Some(Vec::new());
        state.cold_writes.clear();

        match std::fs::remove_file(&state.path) {
            Ok(()) => {
                debug!(session_id = %state.session_id, "Session log deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ContextError::Storage(format!(
                "Failed to delete {}: {e}",
                state.path.display()
            ))),
        }
    }
}

/// Drain loop: the only code that appends to session logs.
async fn run_writer(mut rx: mpsc::UnboundedReceiver<WriteCommand>, shared: Arc<WriterShared>) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Append(record) => {
                let shared = shared.clone();
                let path = record.path.clone();
                let outcome = tokio::task::spawn_blocking(move || shared.append(&record)).await;
                match outcome {
                    Ok(Ok(true)) => {}
                    Ok(Ok(false)) => debug!(path = %path.display(), "Discarded stale session write"),
                    Ok(Err(e)) => {
                        error!(path = %path.display(), error = %e, "Failed to write to session file; record dropped")
                    }
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "Session write task failed; record dropped")
                    }
                }
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Session writer stopped");
}

/// Read every parseable message from a log. A missing log is empty.
fn read_log(path: &Path) -> Result<Vec<ChatMessage>, ContextError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ContextError::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            )));
        }
    };

    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<ChatMessage>(line) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping corrupted session record");
                None
            }
        })
        .collect())
}

//! # aicode Context
//!
//! Conversation stores implementing [`aicode_core::ContextManager`]:
//!
//! - [`JsonlContextStore`]: durable sessions, one JSONL log per session,
//!   with a sliding window over what is sent to the model
//! - [`InMemoryContext`]: ephemeral conversations for tests and one-off runs
//!
//! Plus [`list_sessions`] for browsing stored sessions.

pub mod in_memory;
pub mod jsonl;
pub mod listing;
pub mod window;

pub use in_memory::InMemoryContext;
pub use jsonl::{JsonlContextStore, session_file, validate_session_id};
pub use listing::{SessionInfo, list_sessions};
pub use window::sliding_window;

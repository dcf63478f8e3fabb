//! # aicode Core
//!
//! Domain types, traits, and error definitions for the aicode ReAct agent.
//! This crate has **no framework dependencies** beyond serde and tokio's
//! sync primitives. It defines the domain model that the other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the agent loop is a trait here: the chat model,
//! the context store, tools, and the skill source. Implementations live in
//! their respective crates, and tests swap in scripted doubles.

pub mod chat;
pub mod context;
pub mod error;
pub mod event;
pub mod message;
pub mod skill;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use chat::{ChatModel, ScriptedChat};
pub use context::ContextManager;
pub use error::{ContextError, Error, ModelError, Result, ToolError};
pub use event::{AgentEvent, EventBus, EventKind, Subscription};
pub use message::{ChatMessage, Role};
pub use skill::{Skill, SkillSource};
pub use tool::{Tool, ToolDefinition, ToolRegistry};

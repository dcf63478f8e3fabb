//! Error types for the aicode domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all aicode operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Context store errors ---
    #[error("Context error: {0}")]
    Context(#[from] ContextError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the LLM chat primitive.
///
/// The agent loop never retries these; retry and backoff belong to the
/// model implementation.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Model script exhausted after {0} turns")]
    Exhausted(usize),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool {0} not found")]
    NotFound(String),

    #[error("{0}")]
    ExecutionFailed(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    InvalidArguments(String),
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Session writer is no longer running")]
    WriterClosed,

    #[error("Invalid session id {0:?}: must not be empty or contain path separators or '..'")]
    InvalidSessionId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_displays_correctly() {
        let err = Error::Model(ModelError::Exhausted(3));
        assert_eq!(
            err.to_string(),
            "Model error: Model script exhausted after 3 turns"
        );
    }

    #[test]
    fn tool_not_found_matches_observation_wording() {
        let err = ToolError::NotFound("grep".into());
        assert_eq!(err.to_string(), "Tool grep not found");
    }

    #[test]
    fn tool_failures_display_bare_message() {
        let err = ToolError::ExecutionFailed("disk full".into());
        assert_eq!(err.to_string(), "disk full");
    }
}

//! The aicode agent: a ReAct loop over plain-text model turns.
//!
//! 1. **Receive** an instruction and append it to the session
//! 2. **Send** the (windowed) history to the chat model
//! 3. **If an action**: run the tool, append `Observation: ...`, loop to 2
//! 4. **If a final answer** (or nothing actionable): stop
//!
//! The loop is bounded by `max_iterations` and can be stopped cooperatively.
//! [`parser`] decodes the many shapes a model turn can take.

pub mod loop_runner;
pub mod parser;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentLoop, RunOutcome, RunReport, StopHandle};
pub use parser::{ParsedResponse, parse};

//! Shared test doubles for agent tests.

use aicode_core::error::ToolError;
use aicode_core::{AgentEvent, EventBus, EventKind, Skill, SkillSource, Tool};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Returns its arguments as compact JSON.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the arguments back"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {"x": {"type": "integer"}}})
    }

    async fn execute(&self, arguments: Value) -> Result<String, ToolError> {
        Ok(arguments.to_string())
    }
}

/// Always fails.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "fail"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _arguments: Value) -> Result<String, ToolError> {
        Err(ToolError::ExecutionFailed("disk on fire".into()))
    }
}

/// A fixed skill list.
pub struct StaticSkills(Vec<Skill>);

impl StaticSkills {
    pub fn one(name: &str, description: &str) -> Self {
        Self(vec![Skill {
            name: name.into(),
            description: description.into(),
            path: PathBuf::from("/skills").join(name),
        }])
    }
}

#[async_trait]
impl SkillSource for StaticSkills {
    fn skills(&self) -> Vec<Skill> {
        self.0.clone()
    }

    async fn skill_content(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Collect every event of `kind` published on `bus`.
pub fn record_events(bus: &EventBus, kind: EventKind) -> Arc<Mutex<Vec<AgentEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _subscription = bus.on(kind, move |event| {
        sink.lock().unwrap().push(event.clone());
    });
    seen
}

//! Load skill tool: pulls a skill's instructions into the conversation.

use async_trait::async_trait;
use std::sync::Arc;

use aicode_core::error::ToolError;
use aicode_core::{SkillSource, Tool};

pub struct LoadSkillTool {
    skills: Arc<dyn SkillSource>,
}

impl LoadSkillTool {
    pub fn new(skills: Arc<dyn SkillSource>) -> Self {
        Self { skills }
    }
}

#[async_trait]
impl Tool for LoadSkillTool {
    fn name(&self) -> &str {
        "load_skill"
    }

    fn description(&self) -> &str {
        "Load a skill's instructions into context. Only use this when you are about to carry \
         out the skill; the system prompt already lists which skills exist."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "skill_name": {
                    "type": "string",
                    "description": "The name of the skill to load (e.g., \"release\")"
                }
            },
            "required": ["skill_name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let name = arguments["skill_name"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ToolError::InvalidArguments("skill_name is required and must be a string".into())
            })?;

        let content = self.skills.skill_content(name).await.ok_or_else(|| {
            ToolError::ExecutionFailed(format!("Skill \"{name}\" not found or failed to load."))
        })?;

        Ok(format!(
            "Skill \"{name}\" loaded successfully.\n\n\
             SYSTEM INSTRUCTION: You have loaded the \"{name}\" skill. \
             Follow the instructions below carefully:\n\n{content}"
        ))
    }
}

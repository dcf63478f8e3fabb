//! System prompt for the ReAct protocol.

use aicode_core::{Skill, ToolDefinition};

/// Render the tool section: one entry per tool with its parameter schema.
pub fn describe_tools(tools: &[ToolDefinition]) -> String {
    if tools.is_empty() {
        return "No tools available.".into();
    }
    tools
        .iter()
        .map(|t| {
            format!(
                "- {}: {}\n  Parameters: {}",
                t.name, t.description, t.parameters
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the skill section.
pub fn describe_skills(skills: &[Skill]) -> String {
    if skills.is_empty() {
        return "No skills available.".into();
    }
    skills
        .iter()
        .map(|s| format!("- {}: {}", s.name, s.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the system prompt injected at the start of a new session.
///
/// `skills` is `None` when no skill source is configured, in which case the
/// skills section is left out entirely.
pub fn system_prompt(tools: &[ToolDefinition], skills: Option<&[Skill]>) -> String {
    let mut prompt = format!(
        "You are a professional AI coding assistant working inside the user's workspace.

Tools you can call:
{tools}
",
        tools = describe_tools(tools)
    );

    if let Some(skills) = skills {
        prompt.push_str(&format!(
            "
Skills you can load with the load_skill tool when a task calls for them:
{skills}
",
            skills = describe_skills(skills)
        ));
    }

    prompt.push_str(
        "
RULES:
1. Use the tools for anything involving files, commands or other resources.
2. Never invent file contents or tool output.
3. Every tool use follows this exact sequence, then stops to wait:
   Thought: why a tool is needed
   Action: the tool name
   Action Input: the tool arguments as a JSON object
4. Only give a Final Answer after reading the Observation for your last action.
5. If the tools did not turn up what you needed, say so in the Final Answer.

Format:
Thought: your reasoning
Action: tool name
Action Input: JSON arguments
Observation: the tool result (supplied to you, never written by you)
... (Thought/Action/Action Input/Observation may repeat)
Thought: I have what I need
Final Answer: your response to the user

Begin!",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn echo_def() -> ToolDefinition {
        ToolDefinition {
            name: "echo".into(),
            description: "Echo the input back".into(),
            parameters: json!({"type": "object", "properties": {"x": {"type": "integer"}}}),
        }
    }

    #[test]
    fn lists_tools_with_schema() {
        let prompt = system_prompt(&[echo_def()], None);
        assert!(prompt.contains("- echo: Echo the input back"));
        assert!(prompt.contains("  Parameters: {\"properties\":{\"x\":{\"type\":\"integer\"}},\"type\":\"object\"}"));
        assert!(prompt.contains("Final Answer:"));
        assert!(prompt.ends_with("Begin!"));
    }

    #[test]
    fn skills_section_only_with_source() {
        let without = system_prompt(&[echo_def()], None);
        assert!(!without.contains("load_skill"));

        let none: [Skill; 0] = [];
        let empty = system_prompt(&[echo_def()], Some(&none));
        assert!(empty.contains("No skills available."));

        let skills = [Skill {
            name: "git".into(),
            description: "Commit conventions".into(),
            path: PathBuf::from("/skills/git"),
        }];
        let with = system_prompt(&[echo_def()], Some(&skills));
        assert!(with.contains("- git: Commit conventions"));
    }

    #[test]
    fn no_tools_is_explicit() {
        assert_eq!(describe_tools(&[]), "No tools available.");
    }
}

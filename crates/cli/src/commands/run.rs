//! `aicode run`: drive the agent loop against a scripted model.

use std::path::PathBuf;
use std::sync::Arc;

use aicode_agent::{AgentLoop, RunOutcome};
use aicode_context::{JsonlContextStore, validate_session_id};
use aicode_core::{
    AgentEvent, ChatModel, ContextManager, EventBus, EventKind, ScriptedChat, SkillSource,
};
use aicode_tools::default_registry;
use tracing::{info, warn};

use super::{load_config, load_skills};

pub async fn run(
    config_path: Option<PathBuf>,
    instruction: String,
    script: PathBuf,
    session: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let script = std::fs::read_to_string(&script)
        .map_err(|e| format!("Failed to read script {}: {e}", script.display()))?;
    let model: Arc<dyn ChatModel> = Arc::new(ScriptedChat::from_script(&script));

    let session_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    validate_session_id(&session_id)?;
    let store = Arc::new(JsonlContextStore::new(
        config.sessions_dir(),
        session_id.clone(),
        config.context.max_messages,
    ));
    let context: Arc<dyn ContextManager> = store.clone();

    let skills: Option<Arc<dyn SkillSource>> =
        load_skills(&config).map(|registry| registry as Arc<dyn SkillSource>);
    let tools = Arc::new(default_registry(&config.workspace_root(), skills.clone()));

    let events = Arc::new(EventBus::default());
    let _thoughts = events.on(EventKind::AgentThought, |event| {
        if let AgentEvent::AgentThought { content } = event {
            println!("🤔 {content}\n");
        }
    });
    let _calls = events.on(EventKind::ToolCall, |event| {
        if let AgentEvent::ToolCall { tool_name, args } = event {
            println!("🔧 {tool_name} {args}");
        }
    });
    let _results = events.on(EventKind::ToolResult, |event| {
        if let AgentEvent::ToolResult { result, error, .. } = event {
            match (result, error) {
                (_, Some(error)) => println!("❌ {error}\n"),
                (Some(result), None) => println!("📎 {result}\n"),
                (None, None) => println!(),
            }
        }
    });

    let mut agent = AgentLoop::new(model, tools, context, events).with_config(&config.agent);
    if let Some(skills) = skills {
        agent = agent.with_skills(skills);
    }

    let stop = agent.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current step");
            stop.stop();
        }
    });

    info!(session_id = %session_id, "Starting run");
    let report = agent.run(&instruction).await;
    store.flush().await?;
    let report = report?;

    match &report.outcome {
        RunOutcome::FinalAnswer(answer) => println!("✅ {answer}"),
        RunOutcome::NoAction => {
            println!("⚠️  The model stopped without an action or final answer.")
        }
        RunOutcome::IterationLimit => println!(
            "⚠️  Stopped after {} model calls without a final answer.",
            report.model_calls
        ),
        RunOutcome::Stopped => println!("⏹  Stopped."),
    }
    println!(
        "\nSession: {session_id} ({} model calls, {} tool calls)",
        report.model_calls, report.tool_calls
    );
    Ok(())
}

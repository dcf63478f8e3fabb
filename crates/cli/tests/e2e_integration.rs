//! End-to-end tests for the aicode agent runtime.
//!
//! These wire the real pieces together (JSONL session store, built-in tools,
//! filesystem skills, agent loop) and drive them with a scripted model.

use std::path::Path;
use std::sync::{Arc, Mutex};

use aicode_agent::{AgentLoop, RunOutcome};
use aicode_context::{JsonlContextStore, list_sessions};
use aicode_core::{
    AgentEvent, ChatModel, ContextManager, EventBus, EventKind, Role, ScriptedChat, SkillSource,
};
use aicode_tools::{FileSystemSkillRegistry, default_registry};

// ── Helpers ──────────────────────────────────────────────────────────────

struct Harness {
    store: Arc<JsonlContextStore>,
    model: Arc<ScriptedChat>,
    events: Arc<EventBus>,
    agent: AgentLoop,
}

fn harness(
    workspace: &Path,
    sessions: &Path,
    session_id: &str,
    turns: &[&str],
    skills: Option<Arc<dyn SkillSource>>,
) -> Harness {
    let store = Arc::new(JsonlContextStore::new(sessions, session_id, 50));
    let model = Arc::new(ScriptedChat::new(turns.iter().copied()));
    let tools = Arc::new(default_registry(workspace, skills.clone()));
    let chat: Arc<dyn ChatModel> = model.clone();
    let context: Arc<dyn ContextManager> = store.clone();
    let events = Arc::new(EventBus::default());

    let mut agent = AgentLoop::new(chat, tools, context, events.clone());
    if let Some(skills) = skills {
        agent = agent.with_skills(skills);
    }
    Harness {
        store,
        model,
        events,
        agent,
    }
}

// ── E2E: File tools through the loop ─────────────────────────────────────

#[tokio::test]
async fn e2e_write_then_read_file() {
    let workspace = tempfile::tempdir().unwrap();
    let sessions = tempfile::tempdir().unwrap();

    let h = harness(
        workspace.path(),
        sessions.path(),
        "files",
        &[
            "Thought: create it\nAction: file_write\nAction Input: {\"path\": \"notes/todo.md\", \"content\": \"- ship it\"}",
            "Thought: check it\nAction: file_read\nAction Input: {\"path\": \"notes/todo.md\"}",
            "Thought: done\nFinal Answer: wrote notes/todo.md",
        ],
        None,
    );

    let report = h.agent.run("Write a todo list").await.unwrap();

    assert_eq!(
        report.outcome,
        RunOutcome::FinalAnswer("wrote notes/todo.md".into())
    );
    assert_eq!(report.tool_calls, 2);
    assert_eq!(h.model.call_count(), 3);
    assert_eq!(
        std::fs::read_to_string(workspace.path().join("notes/todo.md")).unwrap(),
        "- ship it"
    );

    let history = h.store.full_history().await.unwrap();
    let observations: Vec<&str> = history
        .iter()
        .filter(|m| m.role == Role::User && m.content.starts_with("Observation:"))
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(
        observations,
        vec![
            "Observation: Successfully wrote to notes/todo.md",
            "Observation: - ship it",
        ]
    );
}

#[tokio::test]
async fn e2e_path_escape_is_an_observation() {
    let workspace = tempfile::tempdir().unwrap();
    let sessions = tempfile::tempdir().unwrap();

    let h = harness(
        workspace.path(),
        sessions.path(),
        "escape",
        &[
            "Action: file_read\nAction Input: {\"path\": \"../../etc/passwd\"}",
            "Final Answer: not allowed",
        ],
        None,
    );

    let report = h.agent.run("Read the password file").await.unwrap();
    assert_eq!(report.outcome, RunOutcome::FinalAnswer("not allowed".into()));

    let second_request = &h.model.requests()[1];
    let last = second_request.last().unwrap();
    assert_eq!(
        last.content,
        "Observation: Error: Access denied: Path is outside workspace root."
    );
}

// ── E2E: Durable sessions ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_session_survives_restart() {
    let workspace = tempfile::tempdir().unwrap();
    let sessions = tempfile::tempdir().unwrap();

    let first = harness(
        workspace.path(),
        sessions.path(),
        "resume-me",
        &["Final Answer: hello"],
        None,
    );
    first.agent.run("Say hello").await.unwrap();
    first.store.flush().await.unwrap();
    let first_len = first.store.full_history().await.unwrap().len();
    assert_eq!(first_len, 3);

    let second = harness(
        workspace.path(),
        sessions.path(),
        "resume-me",
        &["Final Answer: hello again"],
        None,
    );
    let report = second.agent.run("Again").await.unwrap();
    second.store.flush().await.unwrap();
    assert_eq!(report.outcome, RunOutcome::FinalAnswer("hello again".into()));

    // The resumed run sees the earlier turns and gets no second system prompt.
    let request = &second.model.requests()[0];
    assert_eq!(request.len(), first_len + 1);
    assert_eq!(request.iter().filter(|m| m.role == Role::System).count(), 1);

    let listed = list_sessions(sessions.path(), 64 * 1024).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "resume-me");
    assert_eq!(listed[0].preview, "Say hello");
}

#[tokio::test]
async fn e2e_clear_starts_over() {
    let workspace = tempfile::tempdir().unwrap();
    let sessions = tempfile::tempdir().unwrap();

    let h = harness(
        workspace.path(),
        sessions.path(),
        "wipe",
        &["Final Answer: one", "Final Answer: two"],
        None,
    );
    h.agent.run("First").await.unwrap();
    h.store.flush().await.unwrap();
    assert!(h.store.path().exists());

    h.store.clear().unwrap();
    assert!(!h.store.path().exists());

    h.agent.run("Second").await.unwrap();
    let history = h.store.full_history().await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, Role::System);
    assert_eq!(history[1].content, "Second");
}

// ── E2E: Skills ──────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_load_skill_flow() {
    let workspace = tempfile::tempdir().unwrap();
    let sessions = tempfile::tempdir().unwrap();
    let skills_dir = tempfile::tempdir().unwrap();

    let skill = skills_dir.path().join("changelog");
    std::fs::create_dir_all(&skill).unwrap();
    std::fs::write(
        skill.join("SKILL.md"),
        "---\nname: changelog\ndescription: Keep CHANGELOG.md tidy\n---\nAdd entries under Unreleased.",
    )
    .unwrap();
    let registry: Arc<dyn SkillSource> =
        Arc::new(FileSystemSkillRegistry::load(&[skills_dir.path().to_path_buf()]));

    let h = harness(
        workspace.path(),
        sessions.path(),
        "skills",
        &[
            "Thought: I need the changelog rules\nAction: load_skill\nAction Input: {\"skill_name\": \"changelog\"}",
            "Final Answer: following the changelog skill",
        ],
        Some(registry),
    );

    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = results.clone();
    let _sub = h.events.on(EventKind::ToolResult, move |event| {
        sink.lock().unwrap().push(event.clone());
    });

    let report = h.agent.run("Update the changelog").await.unwrap();
    assert_eq!(
        report.outcome,
        RunOutcome::FinalAnswer("following the changelog skill".into())
    );

    let system = &h.model.requests()[0][0];
    assert!(system.content.contains("- changelog: Keep CHANGELOG.md tidy"));

    let results = results.lock().unwrap();
    assert_eq!(results.len(), 1);
    match &results[0] {
        AgentEvent::ToolResult {
            tool_name, result, ..
        } => {
            assert_eq!(tool_name, "load_skill");
            let result = result.as_deref().unwrap();
            assert!(result.starts_with("Skill \"changelog\" loaded successfully."));
            assert!(result.ends_with("Add entries under Unreleased."));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

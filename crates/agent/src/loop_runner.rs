//! The agent loop: Thought → Action → Observation over a text protocol.
//!
//! Each iteration sends the session history to the model, records the raw
//! turn, and either finishes (`Final Answer:`), runs one tool and feeds its
//! result back as an `Observation:` user message, or stops when the turn
//! contains neither.
//!
//! Tool problems (unknown tool, bad arguments, execution failure) become
//! error observations and the loop keeps going. Only model failures and
//! context read failures end a run with an error.

use regex_lite::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aicode_config::{AgentConfig, ExtractionMode};
use aicode_core::error::ToolError;
use aicode_core::message::{ChatMessage, estimate_tokens};
use aicode_core::{AgentEvent, ChatModel, ContextManager, EventBus, SkillSource, ToolRegistry};

use crate::parser::{self, ParsedResponse};
use crate::prompt;

const DEFAULT_MAX_ITERATIONS: u32 = 10;

static ACTION_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Action:\s*(.+)").ok());
static ACTION_INPUT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)Action Input:\s*(.+)").ok());

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model gave a final answer (the text after `Final Answer:`).
    FinalAnswer(String),
    /// The model's turn had neither an action nor a final answer.
    NoAction,
    /// `max_iterations` turns went by without a final answer.
    IterationLimit,
    /// `stop()` was called.
    Stopped,
}

/// The result of one `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Number of model calls made.
    pub model_calls: usize,
    /// Number of tools actually executed.
    pub tool_calls: usize,
}

/// What one model turn asks the loop to do.
enum Step {
    Finish(String),
    Dispatch { tool_name: String, input: ActionInput },
    Halt,
}

enum ActionInput {
    /// Text still to be decoded as JSON.
    Raw(String),
    Parsed(Value),
}

/// Clonable handle that stops a running agent at its next iteration.
#[derive(Debug, Clone)]
pub struct StopHandle(CancellationToken);

impl StopHandle {
    pub fn stop(&self) {
        self.0.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// The ReAct agent.
pub struct AgentLoop {
    /// LLM chat primitive.
    model: Arc<dyn ChatModel>,
    /// Tool registry.
    tools: Arc<ToolRegistry>,
    /// Session history.
    context: Arc<dyn ContextManager>,
    /// Event bus.
    events: Arc<EventBus>,
    /// Optional skill source for the system prompt.
    skills: Option<Arc<dyn SkillSource>>,
    /// Maximum model turns per run.
    max_iterations: u32,
    /// How actions are pulled out of a turn.
    extraction: ExtractionMode,
    /// Replaces the generated system prompt.
    system_prompt: Option<String>,
    cancel: CancellationToken,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolRegistry>,
        context: Arc<dyn ContextManager>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            model,
            tools,
            context,
            events,
            skills: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            extraction: ExtractionMode::React,
            system_prompt: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Apply the `[agent]` config section.
    pub fn with_config(mut self, config: &AgentConfig) -> Self {
        self.max_iterations = config.max_iterations;
        self.extraction = config.extraction;
        self.system_prompt = config.system_prompt_override.clone();
        self
    }

    /// List skills from `skills` in the system prompt.
    pub fn with_skills(mut self, skills: Arc<dyn SkillSource>) -> Self {
        self.skills = Some(skills);
        self
    }

    /// Set max iterations.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_extraction(mut self, mode: ExtractionMode) -> Self {
        self.extraction = mode;
        self
    }

    /// Use `prompt` verbatim as the system prompt of new sessions.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Ask the loop to stop before its next iteration.
    ///
    /// A stopped agent stays stopped; later runs return
    /// [`RunOutcome::Stopped`] without calling the model.
    pub fn stop(&self) {
        info!("Agent stop requested");
        self.cancel.cancel();
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.cancel.clone())
    }

    /// The system prompt a new session would start with.
    pub fn system_prompt(&self) -> String {
        if let Some(custom) = &self.system_prompt {
            return custom.clone();
        }
        let tools = self.tools.definitions();
        match &self.skills {
            Some(source) => {
                let skills = source.skills();
                prompt::system_prompt(&tools, Some(skills.as_slice()))
            }
            None => prompt::system_prompt(&tools, None),
        }
    }

    /// Run the loop for one instruction.
    pub async fn run(&self, instruction: &str) -> Result<RunReport, aicode_core::Error> {
        let mut report = RunReport {
            outcome: RunOutcome::IterationLimit,
            model_calls: 0,
            tool_calls: 0,
        };

        info!(model = %self.model.model(), max_iter = self.max_iterations, "Agent run starting");
        self.events.publish(AgentEvent::AgentStart {
            task_id: instruction.to_string(),
        });

        if self.context.history().await?.is_empty() {
            debug!("New session, injecting system prompt");
            self.context.add_message(ChatMessage::system(self.system_prompt()));
        }

        self.context.add_message(ChatMessage::user(instruction));
        self.events.publish(AgentEvent::UiInput {
            content: instruction.to_string(),
        });

        for iteration in 1..=self.max_iterations {
            if self.cancel.is_cancelled() {
                info!(iteration, "Agent stopped");
                report.outcome = RunOutcome::Stopped;
                return Ok(report);
            }

            debug!(iteration, "Agent iteration");

            // ── Ask the model ──
            let messages = self.context.history().await?;
            self.events.publish(AgentEvent::LlmRequest {
                model: self.model.model().to_string(),
                token_count: estimate_tokens(&messages),
            });

            report.model_calls += 1;
            let response = self.model.chat(&messages).await?;

            self.events.publish(AgentEvent::LlmResponse {
                content: response.clone(),
                token_count: response.chars().count() / 4,
            });
            self.context.add_message(ChatMessage::assistant(response.clone()));
            self.events.publish(AgentEvent::AgentThought {
                content: response.clone(),
            });

            // ── Decide ──
            let step = match self.extraction {
                ExtractionMode::React => extract_react(&response),
                ExtractionMode::MultiFormat => extract_any(&response),
            };

            match step {
                Step::Finish(answer) => {
                    info!(
                        iterations = iteration,
                        tool_calls = report.tool_calls,
                        "Agent run completed"
                    );
                    report.outcome = RunOutcome::FinalAnswer(answer);
                    return Ok(report);
                }
                Step::Halt => {
                    info!(iteration, "No action or final answer in model turn, stopping");
                    report.outcome = RunOutcome::NoAction;
                    return Ok(report);
                }
                Step::Dispatch { tool_name, input } => {
                    if self.dispatch(&tool_name, input).await {
                        report.tool_calls += 1;
                    }
                }
            }
        }

        warn!("Agent: max iterations reached ({})", self.max_iterations);
        report.outcome = RunOutcome::IterationLimit;
        Ok(report)
    }

    /// Run one tool and append its observation. Returns whether the tool ran.
    async fn dispatch(&self, tool_name: &str, input: ActionInput) -> bool {
        let mut executed = false;

        let outcome = match self.tools.get(tool_name) {
            None => Err(ToolError::NotFound(tool_name.to_string()).to_string()),
            Some(tool) => match decode(input) {
                Err(message) => Err(message),
                Ok(args) => {
                    self.events.publish(AgentEvent::ToolCall {
                        tool_name: tool_name.to_string(),
                        args: args.clone(),
                    });
                    debug!(tool = %tool_name, "Executing tool");
                    executed = true;
                    tool.execute(args).await.map_err(|e| e.to_string())
                }
            },
        };

        match outcome {
            Ok(result) => {
                self.events.publish(AgentEvent::ToolResult {
                    tool_name: tool_name.to_string(),
                    result: Some(result.clone()),
                    error: None,
                });
                self.context
                    .add_message(ChatMessage::user(format!("Observation: {result}")));
            }
            Err(message) => {
                warn!(tool = %tool_name, error = %message, "Tool call failed");
                self.context
                    .add_message(ChatMessage::user(format!("Observation: Error: {message}")));
                self.events.publish(AgentEvent::ToolResult {
                    tool_name: tool_name.to_string(),
                    result: None,
                    error: Some(message),
                });
            }
        }

        executed
    }
}

fn decode(input: ActionInput) -> Result<Value, String> {
    match input {
        ActionInput::Parsed(args) => Ok(args),
        ActionInput::Raw(raw) => serde_json::from_str(&raw)
            .map_err(|_| format!("Invalid JSON in Action Input: {raw}")),
    }
}

/// `Final Answer:` anywhere finishes; otherwise one `Action:` line plus
/// everything after `Action Input:`.
fn extract_react(response: &str) -> Step {
    if let Some((_, answer)) = response.split_once("Final Answer:") {
        return Step::Finish(answer.trim().to_string());
    }

    let capture = |re: &LazyLock<Option<Regex>>| {
        re.as_ref()
            .and_then(|re| re.captures(response))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    match (capture(&ACTION_LINE), capture(&ACTION_INPUT)) {
        (Some(tool_name), Some(raw)) => Step::Dispatch {
            tool_name,
            input: ActionInput::Raw(raw),
        },
        _ => Step::Halt,
    }
}

/// Any format the response parser understands.
fn extract_any(response: &str) -> Step {
    match parser::parse(response) {
        ParsedResponse::FinalAnswer { content } => Step::Finish(content),
        ParsedResponse::Action { tool_name, args } => Step::Dispatch {
            tool_name,
            input: ActionInput::Parsed(Value::Object(args)),
        },
        ParsedResponse::Error { error } => {
            debug!(error = %error, "Response not understood");
            Step::Halt
        }
    }
}

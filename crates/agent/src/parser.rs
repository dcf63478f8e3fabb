//! Response parser: turns a free-form model turn into an action, a final
//! answer, or an error.
//!
//! Models emit tool calls in several competing conventions. Each convention
//! has a detector; detectors are tried in a fixed order and the first one
//! that recognises the text wins:
//!
//! 1. Function tags: `<functions.NAME:IDX>{json}</functions.NAME:IDX>`
//! 2. ReAct text: `Final Answer:` or `Action:` / `Action Input:`
//! 3. A bare JSON object with `final_answer`, `tool` or `action`
//! 4. XML-like `<final_answer>` or `<tool name="..">` with `<arg key="..">`
//! 5. A fenced code block (JSON, else plain text as the final answer)
//!
//! Parsing never fails: problems surface as [`ParsedResponse::Error`].

use regex_lite::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

const EMPTY_RESPONSE: &str = "Empty or invalid response";
const UNRECOGNISED: &str = "Unable to parse response format";

/// What a model turn asks for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedResponse {
    Action {
        #[serde(rename = "toolName")]
        tool_name: String,
        args: Map<String, Value>,
    },
    FinalAnswer {
        content: String,
    },
    Error {
        error: String,
    },
}

impl ParsedResponse {
    fn action(tool_name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self::Action {
            tool_name: tool_name.into(),
            args,
        }
    }

    fn final_answer(content: impl Into<String>) -> Self {
        Self::FinalAnswer {
            content: content.into(),
        }
    }

    fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A format detector: `Some` when it recognises the text, `None` to pass.
type Detector = fn(&str) -> Option<ParsedResponse>;

const DETECTORS: [(&str, Detector); 5] = [
    ("function_tag", parse_function_tag),
    ("react", parse_react),
    ("json", parse_json),
    ("xml", parse_xml),
    ("code_fence", parse_code_fence),
];

/// Parse one model turn.
pub fn parse(raw: &str) -> ParsedResponse {
    if raw.is_empty() {
        return ParsedResponse::error(EMPTY_RESPONSE);
    }

    for (format, detect) in DETECTORS {
        if let Some(parsed) = detect(raw) {
            tracing::trace!(format, "Response format recognised");
            return parsed;
        }
    }

    ParsedResponse::error(UNRECOGNISED)
}

/// Parse a turn that may be missing altogether.
pub fn parse_opt(raw: Option<&str>) -> ParsedResponse {
    match raw {
        Some(raw) => parse(raw),
        None => ParsedResponse::error(EMPTY_RESPONSE),
    }
}

// A pattern that fails to compile leaves its detector permanently declining.
static FUNCTION_TAG_OPEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<functions\.([^:<>\s]+):(\d+)>").ok());
static REACT_ACTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Action:\s*(.+?)(?:\n|$)").ok());
static REACT_INPUT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)Action Input:\s*(.+?)(?:\n|Observation:|$)").ok());
static JSON_SPAN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").ok());
static XML_FINAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<final_answer>([\s\S]*?)</final_answer>").ok());
static XML_TOOL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<tool\s+name="([^"]+)"\s*/?>"#).ok());
static XML_ARG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<arg\s+key="([^"]+)"\s*/?>([\s\S]*?)</arg>"#).ok());
static CODE_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)```").ok());

/// The first opening tag with a matching close wins; unclosed openers are skipped.
fn parse_function_tag(raw: &str) -> Option<ParsedResponse> {
    let (name, body) = FUNCTION_TAG_OPEN
        .as_ref()?
        .captures_iter(raw)
        .find_map(|open| {
            let whole = open.get(0)?;
            let name = open.get(1)?.as_str();
            let index = open.get(2)?.as_str();
            let rest = &raw[whole.end()..];
            let close = format!("</functions.{name}:{index}>");
            Some((name, &rest[..rest.find(&close)?]))
        })?;

    let args = match serde_json::from_str::<Value>(body.trim()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    Some(ParsedResponse::action(name, args))
}

fn parse_react(raw: &str) -> Option<ParsedResponse> {
    if let Some((_, answer)) = raw.split_once("Final Answer:") {
        return Some(ParsedResponse::final_answer(answer.trim()));
    }

    let action = REACT_ACTION.as_ref()?.captures(raw)?;
    let tool_name = action.get(1)?.as_str().trim();

    let args = match REACT_INPUT.as_ref()?.captures(raw).and_then(|c| c.get(1)) {
        Some(input) => {
            let input = input.as_str().trim();
            match serde_json::from_str::<Value>(input) {
                Ok(Value::Object(map)) => map,
                _ => {
                    let mut wrapped = Map::new();
                    wrapped.insert("input".into(), Value::String(input.to_string()));
                    wrapped
                }
            }
        }
        None => Map::new(),
    };

    Some(ParsedResponse::action(tool_name, args))
}

fn parse_json(raw: &str) -> Option<ParsedResponse> {
    let span = JSON_SPAN.as_ref()?.find(raw)?;
    let data = serde_json::from_str::<Value>(span.as_str()).ok()?;
    from_structured(&data)
}

fn parse_xml(raw: &str) -> Option<ParsedResponse> {
    if let Some(answer) = XML_FINAL.as_ref()?.captures(raw).and_then(|c| c.get(1)) {
        return Some(ParsedResponse::final_answer(answer.as_str().trim()));
    }

    let tool = XML_TOOL.as_ref()?.captures(raw)?;
    let tool_name = tool.get(1)?.as_str();

    let mut args = Map::new();
    for arg in XML_ARG.as_ref()?.captures_iter(raw) {
        if let (Some(key), Some(value)) = (arg.get(1), arg.get(2)) {
            args.insert(
                key.as_str().to_string(),
                Value::String(value.as_str().trim().to_string()),
            );
        }
    }
    Some(ParsedResponse::action(tool_name, args))
}

fn parse_code_fence(raw: &str) -> Option<ParsedResponse> {
    let body = CODE_FENCE.as_ref()?.captures(raw)?.get(1)?.as_str().trim();
    match serde_json::from_str::<Value>(body) {
        Ok(data) => from_structured(&data),
        Err(_) => Some(ParsedResponse::final_answer(body)),
    }
}

/// Shared key logic for JSON payloads.
fn from_structured(data: &Value) -> Option<ParsedResponse> {
    let object = data.as_object()?;

    if let Some(answer) = object.get("final_answer") {
        return Some(ParsedResponse::final_answer(value_to_text(answer)));
    }

    let tool_name = ["tool", "action"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|v| is_truthy(v))
        .map(value_to_text)?;

    let args = ["args", "parameters"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|v| v.as_object().cloned())
        .unwrap_or_default();

    Some(ParsedResponse::action(tool_name, args))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

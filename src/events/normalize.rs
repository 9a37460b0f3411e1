//! Raw runtime event objects to [`Event`].

use serde_json::Value;

use super::{
    ContentDelta, Event, EventMeta, ReasoningCompleted, ReasoningStep, RunCancelled,
    RunCompleted, RunError, RunPaused, RunStarted, ToolCallCompleted, ToolCallStarted, ToolInfo,
    UnknownEvent,
};

/// Longest tool output shown in a presentation view, in characters.
pub const DISPLAY_LIMIT: usize = 500;

const UNKNOWN_TOOL: &str = "Unknown Tool";
const UNAVAILABLE_TOOL: &str = "Tool Info Unavailable";

/// Normalize one raw runtime event.
///
/// Never fails: a value with no recognizable kind becomes [`Event::Unknown`] carrying the
/// incoming tag and a textual rendering of its content.
pub fn normalize(raw: &Value) -> Event {
    if !raw.is_object() {
        return Event::Unknown(UnknownEvent {
            meta: EventMeta::default(),
            raw_event: None,
            raw_content: text_of(raw),
        });
    }

    let tag = extract_str(raw, &["event", "type"]);
    let meta = extract_meta(raw);

    match tag.map(canonical_kind).as_deref().unwrap_or("") {
        "runstarted" => Event::RunStarted(RunStarted {
            meta,
            model: extract_text(raw, &["model"]),
            model_provider: extract_text(raw, &["model_provider", "modelProvider"]),
        }),
        "runresponsecontent" | "runresponse" | "runcontent" | "content" | "contentdelta" => {
            Event::ContentDelta(ContentDelta {
                meta,
                content: extract_text(raw, &["content"]),
                content_type: extract_text(raw, &["content_type"]),
                thinking: extract_text(raw, &["thinking"]),
            })
        }
        "runcompleted" | "runresponsecompleted" => Event::RunCompleted(RunCompleted {
            meta,
            content: extract_text(raw, &["content"]),
            content_type: extract_text(raw, &["content_type"]),
            reasoning_content: extract_text(raw, &["reasoning_content"]),
            thinking: extract_text(raw, &["thinking"]),
        }),
        "runerror" => Event::RunError(RunError {
            meta,
            error_message: extract_text(raw, &["content", "error", "error_message", "message"]),
        }),
        "runcancelled" | "runcanceled" => Event::RunCancelled(RunCancelled {
            meta,
            reason: extract_text(raw, &["reason", "content"]),
        }),
        "runpaused" => Event::RunPaused(RunPaused {
            meta,
            tools: raw
                .get("tools")
                .and_then(|v| v.as_array())
                .map(|tools| tools.iter().map(tool_info).collect()),
        }),
        "runcontinued" => Event::RunContinued(meta),
        "reasoningstarted" => Event::ReasoningStarted(meta),
        "reasoningstep" => Event::ReasoningStep(ReasoningStep {
            meta,
            content: extract_text(raw, &["content"]),
            content_type: extract_text(raw, &["content_type"]),
            reasoning_content: extract_text(raw, &["reasoning_content"]),
        }),
        "reasoningcompleted" => Event::ReasoningCompleted(ReasoningCompleted {
            meta,
            content: extract_text(raw, &["content"]),
            content_type: extract_text(raw, &["content_type"]),
        }),
        "toolcallstarted" => Event::ToolCallStarted(ToolCallStarted {
            meta,
            tool: present(raw.get("tool")).map(tool_info),
        }),
        "toolcallcompleted" => {
            let tool = present(raw.get("tool"));
            let result = tool
                .and_then(|t| present(t.get("result")))
                .or_else(|| present(raw.get("result")))
                .and_then(text_of);
            Event::ToolCallCompleted(ToolCallCompleted {
                meta,
                tool: tool.map(tool_info),
                result,
            })
        }
        "memoryupdatestarted" | "updatingmemory" => Event::MemoryUpdateStarted(meta),
        "memoryupdatecompleted" => Event::MemoryUpdateCompleted(meta),
        _ => Event::Unknown(UnknownEvent {
            meta,
            raw_event: tag.map(|t| t.to_string()),
            raw_content: extract_text(raw, &["content"]),
        }),
    }
}

/// Best-effort tool descriptor.
///
/// Objects yield their name and arguments, a bare string is taken as the name, and
/// anything else becomes a placeholder whose summary is the descriptor's text.
pub fn tool_info(value: &Value) -> ToolInfo {
    match value {
        Value::Object(_) => {
            let function = value.get("function");
            let name = extract_str(value, &["tool_name", "name"])
                .or_else(|| function.and_then(|f| extract_str(f, &["name"])))
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(UNKNOWN_TOOL)
                .to_string();
            let args = ["tool_args", "args", "arguments"]
                .iter()
                .find_map(|key| present(value.get(*key)))
                .or_else(|| function.and_then(|f| present(f.get("arguments"))))
                .cloned();
            ToolInfo {
                name,
                args,
                summary: None,
            }
        }
        Value::String(name) if !name.trim().is_empty() => ToolInfo {
            name: name.clone(),
            args: None,
            summary: None,
        },
        other => ToolInfo {
            name: UNAVAILABLE_TOOL.to_string(),
            args: None,
            summary: text_of(other).map(|s| truncate_for_display(&s, DISPLAY_LIMIT)),
        },
    }
}

/// Cut `text` to at most `limit` characters, marking the cut with an ellipsis.
pub fn truncate_for_display(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Lowercase and drop separators so `RunStarted`, `run_started` and `run-started` agree.
fn canonical_kind(tag: &str) -> String {
    tag.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn extract_meta(raw: &Value) -> EventMeta {
    EventMeta {
        timestamp: ["created_at", "timestamp"]
            .iter()
            .find_map(|key| raw.get(*key).and_then(timestamp_of)),
        agent_id: extract_text(raw, &["agent_id", "agentId"]),
        run_id: extract_text(raw, &["run_id", "runId"]),
        session_id: extract_text(raw, &["session_id", "sessionId"]),
    }
}

fn timestamp_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok().or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.timestamp())
        }),
        _ => None,
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn extract_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    for key in keys {
        if let Some(v) = value.get(*key).and_then(|v| v.as_str()) {
            return Some(v);
        }
    }
    None
}

/// First present key, rendered as text when it is not already a string.
fn extract_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| present(value.get(*key)))
        .and_then(text_of)
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

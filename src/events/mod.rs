//! Agent run events.
//!
//! The runtime emits loosely structured event objects; [`normalize`] turns each one into
//! an [`Event`], a closed set of kinds with typed payloads. Every optional payload field is
//! an `Option`, and `None` is the explicit marker for "the runtime did not send it". On the
//! wire an event is `{"event": <kind>, "data": {...}}` with absent fields as `null`.

mod normalize;

pub use normalize::{normalize, tool_info, truncate_for_display, DISPLAY_LIMIT};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Independent status tracks of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Run,
    Reasoning,
    Tool,
    Memory,
}

/// Fields common to every event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMeta {
    /// Unix seconds at which the runtime created the event.
    pub timestamp: Option<i64>,
    pub agent_id: Option<String>,
    pub run_id: Option<String>,
    pub session_id: Option<String>,
}

/// Best-effort description of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub args: Option<Value>,
    /// Textual stand-in when the runtime's descriptor had no usable structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStarted {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub model: Option<String>,
    pub model_provider: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunCompleted {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub reasoning_content: Option<String>,
    pub thinking: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunError {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunCancelled {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunPaused {
    #[serde(flatten)]
    pub meta: EventMeta,
    /// Tools waiting for external confirmation.
    pub tools: Option<Vec<ToolInfo>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentDelta {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub thinking: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningStep {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub reasoning_content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningCompleted {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub content: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCallStarted {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub tool: Option<ToolInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCallCompleted {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub tool: Option<ToolInfo>,
    /// Full tool output; never truncated here.
    pub result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnknownEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    /// Kind tag as sent by the runtime, if any.
    pub raw_event: Option<String>,
    pub raw_content: Option<String>,
}

/// One normalized run event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
    RunStarted(RunStarted),
    RunCompleted(RunCompleted),
    RunError(RunError),
    RunCancelled(RunCancelled),
    RunPaused(RunPaused),
    RunContinued(EventMeta),
    /// Streamed content fragment.
    #[serde(rename = "content")]
    ContentDelta(ContentDelta),
    ReasoningStarted(EventMeta),
    ReasoningStep(ReasoningStep),
    ReasoningCompleted(ReasoningCompleted),
    ToolCallStarted(ToolCallStarted),
    ToolCallCompleted(ToolCallCompleted),
    MemoryUpdateStarted(EventMeta),
    MemoryUpdateCompleted(EventMeta),
    Unknown(UnknownEvent),
}

impl Event {
    /// Wire name of this event's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RunStarted(_) => "run_started",
            Event::RunCompleted(_) => "run_completed",
            Event::RunError(_) => "run_error",
            Event::RunCancelled(_) => "run_cancelled",
            Event::RunPaused(_) => "run_paused",
            Event::RunContinued(_) => "run_continued",
            Event::ContentDelta(_) => "content",
            Event::ReasoningStarted(_) => "reasoning_started",
            Event::ReasoningStep(_) => "reasoning_step",
            Event::ReasoningCompleted(_) => "reasoning_completed",
            Event::ToolCallStarted(_) => "tool_call_started",
            Event::ToolCallCompleted(_) => "tool_call_completed",
            Event::MemoryUpdateStarted(_) => "memory_update_started",
            Event::MemoryUpdateCompleted(_) => "memory_update_completed",
            Event::Unknown(_) => "unknown",
        }
    }

    pub fn meta(&self) -> &EventMeta {
        match self {
            Event::RunStarted(e) => &e.meta,
            Event::RunCompleted(e) => &e.meta,
            Event::RunError(e) => &e.meta,
            Event::RunCancelled(e) => &e.meta,
            Event::RunPaused(e) => &e.meta,
            Event::ContentDelta(e) => &e.meta,
            Event::ReasoningStep(e) => &e.meta,
            Event::ReasoningCompleted(e) => &e.meta,
            Event::ToolCallStarted(e) => &e.meta,
            Event::ToolCallCompleted(e) => &e.meta,
            Event::Unknown(e) => &e.meta,
            Event::RunContinued(meta)
            | Event::ReasoningStarted(meta)
            | Event::MemoryUpdateStarted(meta)
            | Event::MemoryUpdateCompleted(meta) => meta,
        }
    }

    /// Lane whose status this event drives. Content deltas and unknown kinds drive none.
    pub fn lane(&self) -> Option<Lane> {
        match self {
            Event::RunStarted(_)
            | Event::RunCompleted(_)
            | Event::RunError(_)
            | Event::RunCancelled(_)
            | Event::RunPaused(_)
            | Event::RunContinued(_) => Some(Lane::Run),
            Event::ReasoningStarted(_) | Event::ReasoningStep(_) | Event::ReasoningCompleted(_) => {
                Some(Lane::Reasoning)
            }
            Event::ToolCallStarted(_) | Event::ToolCallCompleted(_) => Some(Lane::Tool),
            Event::MemoryUpdateStarted(_) | Event::MemoryUpdateCompleted(_) => Some(Lane::Memory),
            Event::ContentDelta(_) | Event::Unknown(_) => None,
        }
    }

    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::RunCompleted(_) | Event::RunError(_) | Event::RunCancelled(_)
        )
    }

    /// A run error raised on this side of the runtime boundary.
    pub fn run_error(meta: EventMeta, message: impl Into<String>) -> Self {
        Event::RunError(RunError {
            meta,
            error_message: Some(message.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape_is_event_and_data() {
        let event = Event::RunStarted(RunStarted {
            meta: EventMeta {
                run_id: Some("r1".to_string()),
                ..Default::default()
            },
            model: Some("gemini-2.5-flash".to_string()),
            model_provider: None,
        });

        let wire = serde_json::to_value(&event).unwrap();
        assert_eq!(
            wire,
            json!({
                "event": "run_started",
                "data": {
                    "timestamp": null,
                    "agent_id": null,
                    "run_id": "r1",
                    "session_id": null,
                    "model": "gemini-2.5-flash",
                    "model_provider": null
                }
            })
        );
    }

    #[test]
    fn test_content_delta_uses_content_kind() {
        let event = Event::ContentDelta(ContentDelta {
            content: Some("Hi".to_string()),
            ..Default::default()
        });
        let wire = serde_json::to_value(&event).unwrap();
        assert_eq!(wire["event"], "content");
        assert_eq!(wire["data"]["content"], "Hi");
        assert_eq!(event.kind(), "content");
    }

    #[test]
    fn test_wire_form_deserializes_back() {
        let wire = json!({
            "event": "tool_call_completed",
            "data": { "run_id": "r9", "tool": { "name": "get_problem", "args": { "id": 1 } } }
        });
        let event: Event = serde_json::from_value(wire).unwrap();
        match event {
            Event::ToolCallCompleted(done) => {
                assert_eq!(done.meta.run_id.as_deref(), Some("r9"));
                assert_eq!(done.tool.unwrap().name, "get_problem");
                assert!(done.result.is_none());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_lanes_and_terminal_kinds() {
        assert_eq!(Event::RunContinued(EventMeta::default()).lane(), Some(Lane::Run));
        assert_eq!(
            Event::MemoryUpdateStarted(EventMeta::default()).lane(),
            Some(Lane::Memory)
        );
        assert_eq!(Event::ContentDelta(ContentDelta::default()).lane(), None);
        assert!(Event::run_error(EventMeta::default(), "boom").is_terminal());
        assert!(!Event::RunPaused(RunPaused::default()).is_terminal());
    }
}

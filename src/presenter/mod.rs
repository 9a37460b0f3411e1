//! Per-run presentation state.
//!
//! [`RunView`] folds the events of one run into what a chat UI shows: four status lanes
//! (run, reasoning, tool, memory), the accumulated response, a processing-steps log and
//! side panels for tools, reasoning and events it has no dedicated place for. Each lane
//! moves `Idle -> Active -> {Done, Error}` independently of the others.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::events::{truncate_for_display, Event, Lane, DISPLAY_LIMIT};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneState {
    #[default]
    Idle,
    Active,
    Done,
    Error,
}

impl LaneState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LaneState::Done | LaneState::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Badge shown for a lane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusMessage {
    fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One line of the processing-steps log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub title: String,
    pub details: String,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    /// Seconds between start and completion.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolUsage {
    pub name: String,
    pub args: Option<Value>,
    pub started_at: DateTime<Utc>,
    /// Result cut to the display limit.
    pub result_preview: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningView {
    pub content: Option<String>,
    pub reasoning_content: Option<String>,
}

/// An event shown verbatim because no lane took it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackPanel {
    pub label: String,
    pub event: Event,
}

/// Presentation state of a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunView {
    pub run: LaneState,
    pub reasoning: LaneState,
    pub tool: LaneState,
    pub memory: LaneState,

    pub run_status: Option<StatusMessage>,
    pub reasoning_status: Option<StatusMessage>,
    pub memory_status: Option<StatusMessage>,

    /// Response text as rendered so far.
    pub content: String,
    /// True while fragments may still arrive.
    pub streaming: bool,
    pub model_used: Option<String>,
    /// Tools awaiting confirmation while the run is paused.
    pub paused_tools: Option<Vec<String>>,

    /// Names of tools currently executing; a name appears once per pending call.
    pub active_tools: Vec<String>,
    pub tools_used: Vec<ToolUsage>,
    pub reasoning_steps: Vec<ReasoningView>,
    pub reasoning_step_count: usize,
    pub thinking: Option<String>,

    pub steps: Vec<Step>,
    pub fallback: Vec<FallbackPanel>,
    pub total_events: usize,
    /// Seconds from `begin_run` to `finish` or `fail`.
    pub execution_time: Option<f64>,

    #[serde(skip)]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    streamed: bool,
}

impl RunView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every lane and start the clock.
    pub fn begin_run(&mut self) {
        self.begin_run_at(Utc::now());
    }

    pub fn begin_run_at(&mut self, now: DateTime<Utc>) {
        *self = Self {
            started_at: Some(now),
            streaming: true,
            ..Self::default()
        };
    }

    pub fn lane(&self, lane: Lane) -> LaneState {
        match lane {
            Lane::Run => self.run,
            Lane::Reasoning => self.reasoning,
            Lane::Tool => self.tool,
            Lane::Memory => self.memory,
        }
    }

    pub fn apply(&mut self, event: &Event) {
        self.apply_at(event, Utc::now());
    }

    /// Fold one event into the view.
    pub fn apply_at(&mut self, event: &Event, now: DateTime<Utc>) {
        self.total_events += 1;

        if event.lane() == Some(Lane::Run) && self.run.is_terminal() {
            tracing::warn!(
                "Ignoring {} after the run already ended ({:?})",
                event.kind(),
                self.run
            );
            self.push_fallback(event);
            return;
        }

        match event {
            Event::RunStarted(started) => {
                let model = started.model.as_deref().unwrap_or("Unknown Model");
                self.run = LaneState::Active;
                self.run_status = Some(StatusMessage::new(
                    StatusKind::Info,
                    format!("Started with {}", model),
                ));
                self.model_used = Some(model.to_string());
                self.push_done_step(
                    format!("Starting execution with {}", model),
                    "Initializing agent and tools",
                    now,
                );
            }
            Event::ContentDelta(delta) => {
                if let Some(fragment) = delta.content.as_deref().filter(|c| !c.is_empty()) {
                    self.content.push_str(fragment);
                    self.streamed = true;
                }
                if let Some(thinking) = &delta.thinking {
                    self.thinking = Some(thinking.clone());
                }
            }
            Event::RunCompleted(done) => {
                self.close_last_open_step(now);
                self.push_done_step(
                    "Execution completed successfully",
                    "Response generation finished",
                    now,
                );
                self.run = LaneState::Done;
                self.run_status = Some(StatusMessage::new(
                    StatusKind::Success,
                    "Execution Completed",
                ));
                if !self.streamed {
                    if let Some(content) = &done.content {
                        self.content = content.clone();
                    }
                }
                if self.thinking.is_none() {
                    self.thinking = done
                        .reasoning_content
                        .clone()
                        .or_else(|| done.thinking.clone());
                }
                self.paused_tools = None;
                self.streaming = false;
            }
            Event::RunError(error) => {
                let message = error.error_message.as_deref().unwrap_or("Unknown error");
                self.push_done_step("Error occurred", message, now);
                self.run = LaneState::Error;
                self.run_status = Some(StatusMessage::new(
                    StatusKind::Error,
                    format!("Error: {}", message),
                ));
                self.content = format!("**Error**: {}", message);
                self.paused_tools = None;
                self.streaming = false;
            }
            Event::RunCancelled(cancelled) => {
                let reason = cancelled.reason.as_deref().unwrap_or("No reason provided");
                self.push_done_step("Execution cancelled", reason, now);
                self.run = LaneState::Error;
                self.run_status = Some(StatusMessage::new(
                    StatusKind::Warning,
                    format!("Cancelled: {}", reason),
                ));
                self.paused_tools = None;
                self.streaming = false;
            }
            Event::RunPaused(paused) => {
                let names: Vec<String> = paused
                    .tools
                    .iter()
                    .flatten()
                    .map(|t| t.name.clone())
                    .collect();
                self.steps.push(Step {
                    title: "Execution paused".to_string(),
                    details: format!("{} tools need confirmation", names.len()),
                    completed: false,
                    started_at: now,
                    duration: None,
                });
                self.run = LaneState::Active;
                self.run_status = Some(StatusMessage::new(
                    StatusKind::Warning,
                    format!("Paused ({} tools need confirmation)", names.len()),
                ));
                self.paused_tools = Some(names);
            }
            Event::RunContinued(_) => {
                self.close_last_open_step(now);
                self.push_done_step(
                    "Execution resumed",
                    "Continuing with approved actions",
                    now,
                );
                self.run = LaneState::Active;
                self.run_status = Some(StatusMessage::new(
                    StatusKind::Info,
                    "Execution resumed",
                ));
                self.paused_tools = None;
            }
            Event::ReasoningStarted(_) => {
                self.reasoning = LaneState::Active;
                self.reasoning_status =
                    Some(StatusMessage::new(StatusKind::Info, "Reasoning Active"));
                self.push_open_step(
                    "Starting reasoning process",
                    "Analyzing and planning response",
                    now,
                );
            }
            Event::ReasoningStep(step) => {
                self.reasoning = LaneState::Active;
                self.reasoning_step_count += 1;
                self.reasoning_steps.push(ReasoningView {
                    content: step.content.clone(),
                    reasoning_content: step.reasoning_content.clone(),
                });
                let count = self.reasoning_step_count;
                let open_reasoning = self
                    .steps
                    .last_mut()
                    .filter(|last| !last.completed && is_reasoning_step(last));
                match open_reasoning {
                    Some(last) => last.details = format!("Step {}: Processing...", count),
                    None => self.push_open_step(
                        format!("Reasoning step {}", count),
                        "Processing logical connections",
                        now,
                    ),
                }
            }
            Event::ReasoningCompleted(_) => {
                let count = self.reasoning_step_count;
                self.close_open_step(
                    now,
                    is_reasoning_step,
                    Some(format!("Completed {} reasoning steps", count)),
                );
                self.reasoning = LaneState::Done;
                self.reasoning_status = Some(StatusMessage::new(
                    StatusKind::Success,
                    format!("Reasoning Complete ({} steps)", count),
                ));
            }
            Event::ToolCallStarted(started) => {
                let name = tool_name(started.tool.as_ref().map(|t| t.name.as_str()));
                self.active_tools.push(name.clone());
                self.tools_used.push(ToolUsage {
                    name: name.clone(),
                    args: started.tool.as_ref().and_then(|t| t.args.clone()),
                    started_at: now,
                    result_preview: None,
                    completed: false,
                });
                self.tool = LaneState::Active;
                self.push_open_step(
                    format!("Using tool: {}", name),
                    "Executing tool function",
                    now,
                );
            }
            Event::ToolCallCompleted(done) => {
                let name = tool_name(done.tool.as_ref().map(|t| t.name.as_str()));
                if let Some(pos) = self.active_tools.iter().position(|n| *n == name) {
                    self.active_tools.remove(pos);
                }

                let preview = done
                    .result
                    .as_deref()
                    .map(|r| truncate_for_display(r, DISPLAY_LIMIT));
                match self
                    .tools_used
                    .iter_mut()
                    .rev()
                    .find(|u| u.name == name && !u.completed)
                {
                    Some(usage) => {
                        usage.result_preview = preview;
                        usage.completed = true;
                    }
                    None => {
                        tracing::warn!("Tool {} completed without a matching start", name);
                        self.tools_used.push(ToolUsage {
                            name: name.clone(),
                            args: done.tool.as_ref().and_then(|t| t.args.clone()),
                            started_at: now,
                            result_preview: preview,
                            completed: true,
                        });
                    }
                }

                let title = format!("Using tool: {}", name);
                self.close_open_step(
                    now,
                    |step| step.title == title,
                    Some("Tool execution completed successfully".to_string()),
                );
                self.tool = if self.active_tools.is_empty() {
                    LaneState::Done
                } else {
                    LaneState::Active
                };
            }
            Event::MemoryUpdateStarted(_) => {
                self.memory = LaneState::Active;
                self.memory_status = Some(StatusMessage::new(
                    StatusKind::Info,
                    "Memory Update Active",
                ));
                self.push_open_step("Updating memory", "Storing conversation context", now);
            }
            Event::MemoryUpdateCompleted(_) => {
                self.close_open_step(
                    now,
                    |step| step.title == "Updating memory",
                    Some("Memory updated successfully".to_string()),
                );
                self.memory = LaneState::Done;
                self.memory_status =
                    Some(StatusMessage::new(StatusKind::Success, "Memory Updated"));
            }
            Event::Unknown(_) => self.push_fallback(event),
        }
    }

    pub fn finish(&mut self) {
        self.finish_at(Utc::now());
    }

    /// Close open steps and append the summary line.
    pub fn finish_at(&mut self, now: DateTime<Utc>) {
        let total = self.elapsed(now);
        self.execution_time = Some(total);
        self.streaming = false;
        if self.steps.is_empty() {
            return;
        }
        for step in self.steps.iter_mut().filter(|s| !s.completed) {
            step.completed = true;
            step.duration = Some(seconds_between(step.started_at, now));
        }
        self.push_done_step(
            "All processing completed",
            format!("Total execution time: {:.2}s", total),
            now,
        );
    }

    pub fn fail(&mut self, error: &str) {
        self.fail_at(error, Utc::now());
    }

    /// Render a failure of the stream itself.
    pub fn fail_at(&mut self, error: &str, now: DateTime<Utc>) {
        self.content = format!("**Streaming Error**: {}", error);
        self.push_done_step("Processing failed", error, now);
        self.run = LaneState::Error;
        self.run_status = Some(StatusMessage::new(
            StatusKind::Error,
            format!("Stream Failed: {}", error),
        ));
        self.execution_time = Some(self.elapsed(now));
        self.streaming = false;
    }

    fn elapsed(&self, now: DateTime<Utc>) -> f64 {
        self.started_at
            .map(|start| seconds_between(start, now))
            .unwrap_or(0.0)
    }

    fn push_fallback(&mut self, event: &Event) {
        let label = match event {
            Event::Unknown(unknown) => unknown
                .raw_event
                .clone()
                .unwrap_or_else(|| event.kind().to_string()),
            other => other.kind().to_string(),
        };
        self.fallback.push(FallbackPanel {
            label,
            event: event.clone(),
        });
    }

    fn push_done_step(
        &mut self,
        title: impl Into<String>,
        details: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.steps.push(Step {
            title: title.into(),
            details: details.into(),
            completed: true,
            started_at: now,
            duration: Some(0.0),
        });
    }

    fn push_open_step(
        &mut self,
        title: impl Into<String>,
        details: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.steps.push(Step {
            title: title.into(),
            details: details.into(),
            completed: false,
            started_at: now,
            duration: None,
        });
    }

    fn close_last_open_step(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.steps.last_mut().filter(|s| !s.completed) {
            last.completed = true;
            last.duration = Some(seconds_between(last.started_at, now));
        }
    }

    fn close_open_step<F>(&mut self, now: DateTime<Utc>, matches: F, details: Option<String>)
    where
        F: Fn(&Step) -> bool,
    {
        if let Some(step) = self
            .steps
            .iter_mut()
            .rev()
            .find(|s| !s.completed && matches(s))
        {
            step.completed = true;
            step.duration = Some(seconds_between(step.started_at, now));
            if let Some(details) = details {
                step.details = details;
            }
        }
    }
}

fn is_reasoning_step(step: &Step) -> bool {
    step.title.to_lowercase().contains("reasoning")
}

fn tool_name(name: Option<&str>) -> String {
    name.unwrap_or("Unknown Tool").to_string()
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds() as f64 / 1000.0).max(0.0)
}

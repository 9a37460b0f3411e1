//! The DSA notes agent.
//!
//! A [`DsaAgent`] is one fully described runtime agent for a (user, session) pair and a
//! fixed set of [`AgentSettings`]. It is cheap to keep around and is reused across runs of
//! the same session; [`AgentRegistry`] handles reuse and rebuilds.

mod error;
mod model;
mod prompt;
mod registry;

pub use error::AgentError;
pub use model::{ModelId, MODEL_PROVIDER};
pub use prompt::{AGENT_DESCRIPTION, AGENT_ID, AGENT_INSTRUCTIONS, AGENT_NAME};
pub use registry::AgentRegistry;

use futures::{Stream, StreamExt};

use crate::config::{Config, Credentials};
use crate::events::{normalize, Event, EventMeta};
use crate::framework::{AgentSpec, FrameworkRef, ModelSpec, ToolkitSpec};
use crate::mcp::ToolGateway;
use crate::memory::{MemorySettings, StorageSettings, HISTORY_RUNS};
use crate::monitor;

/// Debug flag used when a caller does not choose one.
pub const DEFAULT_DEBUG_MODE: bool = true;

/// Identity of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentKey {
    pub user_id: String,
    pub session_id: String,
}

impl AgentKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// Everything about an agent that may change between runs of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub model: ModelId,
    pub debug_mode: bool,
    pub credentials: Credentials,
}

pub struct DsaAgent {
    framework: FrameworkRef,
    key: AgentKey,
    settings: AgentSettings,
    spec: AgentSpec,
}

impl DsaAgent {
    pub fn new(
        framework: FrameworkRef,
        config: &Config,
        key: AgentKey,
        settings: AgentSettings,
    ) -> Result<Self, AgentError> {
        tracing::info!(
            "Initializing DSA Agent for user_id={}, session_id={}, model_id={}, debug_mode={}",
            key.user_id,
            key.session_id,
            settings.model,
            settings.debug_mode
        );
        let spec = monitor::time_component("DsaAgent::build_spec", || {
            build_spec(config, &key, &settings)
        })?;
        Ok(Self {
            framework,
            key,
            settings,
            spec,
        })
    }

    pub fn key(&self) -> &AgentKey {
        &self.key
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Description sent to the runtime on every run.
    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    /// Run to completion and return the response text.
    pub async fn run(&self, message: &str) -> Result<String, AgentError> {
        tracing::info!(
            "Starting non-streaming agent execution for user {}, session {}",
            self.key.user_id,
            self.key.session_id
        );
        tracing::debug!("Message length: {} characters", message.len());

        let output = monitor::timed("DsaAgent::run", self.framework.run(&self.spec, message))
            .await
            .map_err(|e| {
                tracing::error!("Error in non-streaming agent execution: {:#}", e);
                AgentError::Run {
                    message: format!("{:#}", e),
                }
            })?;

        let content = output.content.unwrap_or_default();
        tracing::info!(
            "Agent execution completed. Response length: {} characters",
            content.len()
        );
        Ok(content)
    }

    /// Start a run and stream its normalized events.
    ///
    /// The stream carries at most one terminal event. A runtime failure before the run
    /// ends, or a stream that stops early while the run is not paused, is reported as a
    /// single `run_error`.
    pub fn stream(&self, message: &str) -> impl Stream<Item = Event> + Send + 'static {
        let framework = self.framework.clone();
        let spec = self.spec.clone();
        let message = message.to_string();

        async_stream::stream! {
            tracing::info!(
                "Starting streaming agent execution for user {}, session {}",
                spec.user_id,
                spec.session_id
            );
            let meta = EventMeta {
                agent_id: Some(AGENT_ID.to_string()),
                session_id: Some(spec.session_id.clone()),
                ..EventMeta::default()
            };

            let mut raw = match monitor::timed("DsaAgent::stream", framework.stream(&spec, &message)).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!("Error starting streaming agent execution: {:#}", e);
                    yield Event::run_error(meta, format!("{:#}", e));
                    return;
                }
            };

            let mut event_count = 0usize;
            let mut ended = false;
            let mut paused = false;

            while let Some(item) = raw.next().await {
                let value = match item {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::error!("Error in streaming agent execution: {:#}", e);
                        if !ended {
                            yield Event::run_error(meta.clone(), format!("{:#}", e));
                        }
                        return;
                    }
                };

                event_count += 1;
                let event = normalize(&value);
                tracing::debug!("DSA Agent (streaming event #{}): {}", event_count, event.kind());

                if event.is_terminal() {
                    if ended {
                        tracing::warn!("Dropping second terminal event {}", event.kind());
                        continue;
                    }
                    ended = true;
                }
                match &event {
                    Event::RunPaused(_) => paused = true,
                    Event::RunContinued(_) => paused = false,
                    _ => {}
                }
                yield event;
            }

            tracing::info!("Streaming execution completed. Total events: {}", event_count);
            if !ended {
                if paused {
                    tracing::info!("Run paused awaiting confirmation");
                } else {
                    tracing::warn!("Agent runtime stream ended before a terminal event");
                    yield Event::run_error(meta, "stream ended before the run finished");
                }
            }
        }
    }
}

fn build_spec(
    config: &Config,
    key: &AgentKey,
    settings: &AgentSettings,
) -> Result<AgentSpec, AgentError> {
    let gateway = ToolGateway::for_credentials(&config.gateway, &settings.credentials)?;
    let model_id = settings.model.as_str();

    Ok(AgentSpec {
        name: AGENT_NAME.to_string(),
        description: AGENT_DESCRIPTION.to_string(),
        instructions: AGENT_INSTRUCTIONS.to_string(),
        model: ModelSpec {
            id: model_id.to_string(),
            provider: MODEL_PROVIDER.to_string(),
            api_key: settings.credentials.gemini_api_key.clone(),
        },
        user_id: key.user_id.clone(),
        session_id: key.session_id.clone(),
        tools: vec![
            ToolkitSpec::Thinking {
                think: true,
                add_instructions: true,
            },
            ToolkitSpec::Mcp {
                servers: gateway.servers,
            },
        ],
        memory: MemorySettings::new(&config.database, model_id),
        storage: StorageSettings::new(&config.database),
        add_history_to_messages: true,
        num_history_runs: HISTORY_RUNS,
        markdown: true,
        add_datetime_to_instructions: true,
        store_events: true,
        stream_intermediate_steps: true,
        debug_mode: settings.debug_mode,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::tests::{base_env, config_from};
    use crate::config::LeetCodeSite;
    use crate::framework::fake::{ScriptedFramework, Step};
    use crate::mcp::McpTransport;
    use serde_json::json;
    use std::sync::Arc;

    pub(crate) fn credentials() -> Credentials {
        Credentials {
            gemini_api_key: "gemini-key".to_string(),
            lc_site: LeetCodeSite::Global,
            lc_session: "lc-session".to_string(),
            gh_token: "ghp_token".to_string(),
        }
    }

    pub(crate) fn settings(model: ModelId) -> AgentSettings {
        AgentSettings {
            model,
            debug_mode: true,
            credentials: credentials(),
        }
    }

    fn agent_with(framework: ScriptedFramework) -> (Arc<ScriptedFramework>, DsaAgent) {
        let framework = Arc::new(framework);
        let agent = DsaAgent::new(
            framework.clone(),
            &config_from(&base_env()),
            AgentKey::new("user-1", "session-1"),
            settings(ModelId::Gemini25Pro),
        )
        .unwrap();
        (framework, agent)
    }

    async fn collect_events(agent: &DsaAgent, message: &str) -> Vec<Event> {
        agent.stream(message).collect().await
    }

    #[test]
    fn test_spec_describes_agent() {
        let (_, agent) = agent_with(ScriptedFramework::with_events(vec![]));
        let spec = agent.spec();

        assert_eq!(spec.name, "DSA Agent");
        assert_eq!(spec.model.id, "gemini-2.5-pro");
        assert_eq!(spec.model.provider, "google");
        assert_eq!(spec.model.api_key, "gemini-key");
        assert_eq!(spec.user_id, "user-1");
        assert_eq!(spec.session_id, "session-1");
        assert_eq!(spec.num_history_runs, 10);
        assert_eq!(spec.memory.table_name, "user_memories");
        assert_eq!(spec.memory.model_id, "gemini-2.5-pro");
        assert_eq!(spec.storage.table_name, "agent_sessions");
        assert!(spec.debug_mode && spec.store_events && spec.stream_intermediate_steps);
        assert!(spec.instructions.contains("DSA Notes Agent"));

        assert_eq!(
            spec.tools[0],
            ToolkitSpec::Thinking {
                think: true,
                add_instructions: true
            }
        );
        match &spec.tools[1] {
            ToolkitSpec::Mcp { servers } => {
                assert_eq!(servers.len(), 2);
                assert!(servers
                    .iter()
                    .all(|s| s.transport == McpTransport::StreamableHttp));
            }
            other => panic!("unexpected toolkit {:?}", other),
        }
    }

    #[test]
    fn test_spec_debug_output_hides_api_key() {
        let (_, agent) = agent_with(ScriptedFramework::with_events(vec![]));
        let debug = format!("{:?}", agent.spec().model);
        assert!(!debug.contains("gemini-key"));
    }

    #[tokio::test]
    async fn test_run_returns_content() {
        let (framework, agent) = agent_with(ScriptedFramework::with_output(Some("# Two Sum")));
        assert_eq!(agent.run("I solved #1").await.unwrap(), "# Two Sum");

        let calls = framework.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "I solved #1");
    }

    #[tokio::test]
    async fn test_run_missing_content_is_empty() {
        let (_, agent) = agent_with(ScriptedFramework::with_output(None));
        assert_eq!(agent.run("hi").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_run_failure_is_not_retried() {
        let (framework, agent) = agent_with(ScriptedFramework::failing("quota exceeded"));
        let err = agent.run("hi").await.unwrap_err();
        match err {
            AgentError::Run { message } => assert!(message.contains("quota exceeded")),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(framework.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_normalizes_events() {
        let (_, agent) = agent_with(ScriptedFramework::with_events(vec![
            json!({ "event": "RunStarted", "model": "gemini-2.5-pro" }),
            json!({ "event": "RunResponseContent", "content": "Hello" }),
            json!({ "event": "RunResponseContent", "content": " world" }),
            json!({ "event": "RunCompleted", "content": "Hello world" }),
        ]));
        let events = collect_events(&agent, "hi").await;
        let names: Vec<_> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(names, vec!["run_started", "content", "content", "run_completed"]);

        let streamed: String = events
            .iter()
            .filter_map(|e| match e {
                Event::ContentDelta(d) => d.content.clone(),
                _ => None,
            })
            .collect();
        match events.last() {
            Some(Event::RunCompleted(done)) => assert_eq!(done.content.as_deref(), Some(streamed.as_str())),
            other => panic!("unexpected last event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_failure_becomes_run_error() {
        let (_, agent) = agent_with(ScriptedFramework::with_steps(vec![
            Step::Event(json!({ "event": "RunStarted" })),
            Step::Fail("connection reset".to_string()),
            Step::Event(json!({ "event": "RunCompleted" })),
        ]));
        let events = collect_events(&agent, "hi").await;
        assert_eq!(events.len(), 2);
        match &events[1] {
            Event::RunError(error) => {
                assert!(error.error_message.as_deref().unwrap().contains("connection reset"));
                assert_eq!(error.meta.agent_id.as_deref(), Some("dsa-agent"));
                assert_eq!(error.meta.session_id.as_deref(), Some("session-1"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_ending_early_is_an_error() {
        let (_, agent) = agent_with(ScriptedFramework::with_events(vec![
            json!({ "event": "RunStarted" }),
            json!({ "event": "RunResponseContent", "content": "Hel" }),
        ]));
        let events = collect_events(&agent, "hi").await;
        match events.last() {
            Some(Event::RunError(error)) => assert_eq!(
                error.error_message.as_deref(),
                Some("stream ended before the run finished")
            ),
            other => panic!("unexpected last event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_paused_stream_ends_quietly() {
        let (_, agent) = agent_with(ScriptedFramework::with_events(vec![
            json!({ "event": "RunStarted" }),
            json!({ "event": "RunPaused", "tools": [{ "tool_name": "push_files" }] }),
        ]));
        let events = collect_events(&agent, "hi").await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind(), "run_paused");
    }

    #[tokio::test]
    async fn test_single_terminal_event() {
        let (_, agent) = agent_with(ScriptedFramework::with_steps(vec![
            Step::Event(json!({ "event": "RunStarted" })),
            Step::Event(json!({ "event": "RunCompleted", "content": "ok" })),
            Step::Event(json!({ "event": "MemoryUpdateCompleted" })),
            Step::Event(json!({ "event": "RunError", "content": "late" })),
            Step::Fail("socket closed".to_string()),
        ]));
        let events = collect_events(&agent, "hi").await;
        let names: Vec<_> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(names, vec!["run_started", "run_completed", "memory_update_completed"]);
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn test_each_stream_call_starts_a_run() {
        let (framework, agent) = agent_with(ScriptedFramework::with_events(vec![
            json!({ "event": "RunCompleted" }),
        ]));
        collect_events(&agent, "first").await;
        collect_events(&agent, "second").await;
        let messages: Vec<_> = framework.calls().into_iter().map(|(_, m)| m).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}

//! Scripted framework for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

use super::{AgentFramework, AgentSpec, ModelSpec, RawEventStream, RunOutput, ToolkitSpec};
use crate::memory::{MemorySettings, StorageSettings};

/// One scripted stream item.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Event(Value),
    Fail(String),
}

/// Replays a fixed script for every call and records what it was asked.
pub(crate) struct ScriptedFramework {
    steps: Vec<Step>,
    output: Result<RunOutput, String>,
    calls: Mutex<Vec<(AgentSpec, String)>>,
}

impl ScriptedFramework {
    pub(crate) fn with_events(events: Vec<Value>) -> Self {
        Self::with_steps(events.into_iter().map(Step::Event).collect())
    }

    pub(crate) fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            output: Ok(RunOutput::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_output(content: Option<&str>) -> Self {
        Self {
            steps: Vec::new(),
            output: Ok(RunOutput {
                content: content.map(|c| c.to_string()),
                run_id: Some("run-1".to_string()),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            steps: vec![Step::Fail(message.to_string())],
            output: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(AgentSpec, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, agent: &AgentSpec, message: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((agent.clone(), message.to_string()));
    }
}

#[async_trait]
impl AgentFramework for ScriptedFramework {
    async fn run(&self, agent: &AgentSpec, message: &str) -> anyhow::Result<RunOutput> {
        self.record(agent, message);
        self.output.clone().map_err(|e| anyhow::anyhow!(e))
    }

    async fn stream(&self, agent: &AgentSpec, message: &str) -> anyhow::Result<RawEventStream> {
        self.record(agent, message);
        let items: Vec<anyhow::Result<Value>> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Event(value) => Ok(value.clone()),
                Step::Fail(message) => Err(anyhow::anyhow!(message.clone())),
            })
            .collect();
        Ok(futures::stream::iter(items).boxed())
    }
}

/// A minimal but complete agent description.
pub(crate) fn sample_spec() -> AgentSpec {
    let db_url = "postgresql+psycopg://postgres@localhost:5432/dsa_agent".to_string();
    AgentSpec {
        name: "DSA Agent".to_string(),
        description: "test agent".to_string(),
        instructions: "be brief".to_string(),
        model: ModelSpec {
            id: "gemini-2.5-flash".to_string(),
            provider: "google".to_string(),
            api_key: "key".to_string(),
        },
        user_id: "user-1".to_string(),
        session_id: "session-1".to_string(),
        tools: vec![ToolkitSpec::Thinking {
            think: true,
            add_instructions: true,
        }],
        memory: MemorySettings {
            db_url: db_url.clone(),
            table_name: "user_memories".to_string(),
            model_id: "gemini-2.5-flash".to_string(),
            enable_user_memories: true,
        },
        storage: StorageSettings {
            db_url,
            table_name: "agent_sessions".to_string(),
        },
        add_history_to_messages: true,
        num_history_runs: 10,
        markdown: true,
        add_datetime_to_instructions: true,
        store_events: true,
        stream_intermediate_steps: true,
        debug_mode: false,
    }
}

//! Seam to the external agent runtime.
//!
//! The runtime owns inference, tool orchestration and the memory/storage tables. This
//! crate describes an agent to it ([`AgentSpec`]), hands it a message and consumes either
//! the final output or the stream of raw event objects it produces.

mod runtime;

#[cfg(test)]
pub(crate) mod fake;

pub use runtime::RuntimeClient;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mcp::McpServer;
use crate::memory::{MemorySettings, StorageSettings};

/// Raw runtime event objects, in emission order.
pub type RawEventStream = BoxStream<'static, anyhow::Result<Value>>;

/// Shared handle to a framework implementation.
pub type FrameworkRef = Arc<dyn AgentFramework>;

/// An agent runtime able to execute runs for a described agent.
#[async_trait]
pub trait AgentFramework: Send + Sync {
    /// Run to completion and return the final output.
    async fn run(&self, agent: &AgentSpec, message: &str) -> anyhow::Result<RunOutput>;

    /// Start a run and return its raw event stream.
    async fn stream(&self, agent: &AgentSpec, message: &str) -> anyhow::Result<RawEventStream>;
}

/// Final output of a non-streaming run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
}

/// Language model backing an agent.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub provider: String,
    pub api_key: String,
}

impl fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSpec")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// A toolkit attached to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolkitSpec {
    /// Scratchpad tool the model uses to think between steps.
    Thinking { think: bool, add_instructions: bool },
    /// Remote MCP servers.
    Mcp { servers: Vec<McpServer> },
}

/// Complete description of an agent as sent to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub model: ModelSpec,
    pub user_id: String,
    pub session_id: String,
    pub tools: Vec<ToolkitSpec>,
    pub memory: MemorySettings,
    pub storage: StorageSettings,
    pub add_history_to_messages: bool,
    pub num_history_runs: u32,
    pub markdown: bool,
    pub add_datetime_to_instructions: bool,
    pub store_events: bool,
    pub stream_intermediate_steps: bool,
    pub debug_mode: bool,
}

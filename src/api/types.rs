//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::agent::ModelId;

/// User id applied when a request does not name one.
pub const DEFAULT_USER_ID: &str = "anonymous";

fn default_stream() -> bool {
    true
}

/// Body of `POST /v1/agents/:agent_id/runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
    pub message: String,
    #[serde(default = "default_stream")]
    pub stream: bool,
    #[serde(default)]
    pub model: ModelId,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Non-streaming run result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub content: String,
    pub user_id: String,
    pub session_id: String,
    pub model: ModelId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

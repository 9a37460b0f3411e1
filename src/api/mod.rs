//! HTTP API for running the agent.
//!
//! - `POST /v1/agents/:agent_id/runs`: run the agent, streaming events or returning the
//!   final response
//! - `GET /health`

mod routes;
mod runs;
mod types;

pub use routes::{router, serve, shutdown_signal, AppState};
pub use types::*;

//! Agent run endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::StreamExt;
use uuid::Uuid;

use super::routes::AppState;
use super::types::{RunRequest, RunResponse, DEFAULT_USER_ID};
use crate::agent::{AgentKey, AgentSettings, AGENT_ID, DEFAULT_DEBUG_MODE};

const USER_ID_HEADER: &str = "x-user-id";
const SESSION_ID_HEADER: &str = "x-session-id";

/// Run the agent on one message.
///
/// Streaming runs answer with server-sent events, one normalized event per `data:` line.
/// The resolved user and session ids are echoed in `x-user-id` / `x-session-id`.
pub async fn create_run(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    Json(req): Json<RunRequest>,
) -> Result<Response, (StatusCode, String)> {
    if agent_id != AGENT_ID {
        return Err((StatusCode::NOT_FOUND, format!("Agent {} not found", agent_id)));
    }

    let user_id = non_blank(req.user_id).unwrap_or_else(|| DEFAULT_USER_ID.to_string());
    let (session_id, one_off) = match non_blank(req.session_id) {
        Some(session_id) => (session_id, false),
        None => (Uuid::new_v4().to_string(), true),
    };
    tracing::debug!(
        "Run request: user_id={}, session_id={}, model={}, stream={}",
        user_id,
        session_id,
        req.model,
        req.stream
    );

    let settings = AgentSettings {
        model: req.model,
        debug_mode: DEFAULT_DEBUG_MODE,
        credentials: state.credentials.clone(),
    };
    let key = AgentKey::new(user_id.clone(), session_id.clone());
    // A generated session id is never sent back in, so its agent is never reused.
    let agent = if one_off {
        state.registry.build(key, settings)
    } else {
        state.registry.get_or_build(key, settings).await
    }
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut response = if req.stream {
        let events = agent.stream(&req.message).map(|event| SseEvent::default().json_data(&event));
        Sse::new(events)
            .keep_alive(KeepAlive::default())
            .into_response()
    } else {
        let content = agent
            .run(&req.message)
            .await
            .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;
        Json(RunResponse {
            content,
            user_id: user_id.clone(),
            session_id: session_id.clone(),
            model: req.model,
        })
        .into_response()
    };

    let headers = response.headers_mut();
    for (name, value) in [(USER_ID_HEADER, &user_id), (SESSION_ID_HEADER, &session_id)] {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    Ok(response)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

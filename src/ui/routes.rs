//! Web UI routes.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        Html, Json,
    },
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::session::{
    ChatMessage, ChatSession, ChatSettings, SessionStats, SettingsStatus, DEFAULT_SHOW_EVENTS,
};
use crate::agent::{AgentKey, AgentRegistry, AgentSettings, ModelId, DEFAULT_DEBUG_MODE};
use crate::api::shutdown_signal;
use crate::config::{Config, LeetCodeSite};
use crate::framework::{FrameworkRef, RuntimeClient};
use crate::presenter::RunView;

const PAGE: &str = include_str!("page.html");

const PAGE_TITLE: &str = "DSA Notes Agent";

const MAIN_DESCRIPTION: &str = "**Your personal assistant for creating organized Data Structures & Algorithms notes!**\n\nThis agent helps you create comprehensive notes for coding problems you solve on platforms like LeetCode, HackerRank, and more.";

const CHAT_INPUT_PLACEHOLDER: &str = "Tell me about a problem you solved or need help with...";

const USAGE_INSTRUCTIONS: &str = "**Quick Setup:**
1. Add your Gemini API key
2. Add your LeetCode session token
3. Add your GitHub personal access token

**How to Use:**
Just tell me about any LeetCode problem you've solved! I'll automatically:
- Create organized notes in markdown format
- Set up a GitHub repository if needed
- Save everything with proper naming and structure

**Examples:**
- \"I solved LeetCode #1 Two Sum\"
- \"Help me create notes for problem 206 Reverse Linked List\"
- \"Just completed Binary Search problem #704\"";

/// Shared UI state.
pub struct UiState {
    pub config: Arc<Config>,
    pub registry: AgentRegistry,
    /// Chat sessions keyed by the browser's client id.
    pub sessions: RwLock<HashMap<String, ChatSession>>,
}

impl UiState {
    pub fn new(config: Arc<Config>, framework: FrameworkRef) -> Self {
        Self {
            registry: AgentRegistry::new(framework, Arc::clone(&config)),
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

pub fn router(state: Arc<UiState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ui/config", get(ui_config))
        .route("/ui/settings", post(update_settings))
        .route("/ui/chat", post(chat))
        .route("/ui/session", get(get_session))
        .route("/ui/session/new", post(new_session))
        .route("/ui/session/clear-status", post(clear_status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web UI server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let framework: FrameworkRef = Arc::new(RuntimeClient::new(config.runtime_url.clone()));
    tracing::info!("Using agent runtime at {}", config.runtime_url);

    let missing = config.credentials.missing();
    if !missing.is_empty() {
        tracing::info!(
            "Credentials not set in the environment, users must provide them: {}",
            missing.join(", ")
        );
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(UiState::new(Arc::new(config), framework));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Chat UI listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct EnvCredentials {
    pub gemini_api_key: bool,
    pub lc_session: bool,
    pub gh_token: bool,
}

#[derive(Debug, Serialize)]
pub struct UiConfigResponse {
    pub title: &'static str,
    pub description: &'static str,
    pub instructions: &'static str,
    pub placeholder: &'static str,
    pub model_options: Vec<ModelId>,
    pub default_model: ModelId,
    pub default_debug_mode: bool,
    pub default_show_events: bool,
    pub lc_sites: Vec<LeetCodeSite>,
    pub default_lc_site: LeetCodeSite,
    /// Which credentials the server environment already provides.
    pub env_credentials: EnvCredentials,
}

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub client_id: String,
    #[serde(flatten)]
    pub settings: ChatSettings,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub client_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    pub client_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: Option<String>,
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    pub stats: Option<SessionStats>,
}

impl From<&ChatSession> for SessionResponse {
    fn from(session: &ChatSession) -> Self {
        Self {
            user_id: session.user_id.clone(),
            session_id: session.session_id.clone(),
            messages: session.messages.clone(),
            stats: session.statistics(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(PAGE)
}

async fn ui_config(State(state): State<Arc<UiState>>) -> Json<UiConfigResponse> {
    let env = &state.config.credentials;
    let present = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.trim().is_empty());
    Json(UiConfigResponse {
        title: PAGE_TITLE,
        description: MAIN_DESCRIPTION,
        instructions: USAGE_INSTRUCTIONS,
        placeholder: CHAT_INPUT_PLACEHOLDER,
        model_options: ModelId::ALL.to_vec(),
        default_model: ModelId::default(),
        default_debug_mode: DEFAULT_DEBUG_MODE,
        default_show_events: DEFAULT_SHOW_EVENTS,
        lc_sites: LeetCodeSite::ALL.to_vec(),
        default_lc_site: env.lc_site,
        env_credentials: EnvCredentials {
            gemini_api_key: present(&env.gemini_api_key),
            lc_session: present(&env.lc_session),
            gh_token: present(&env.gh_token),
        },
    })
}

async fn update_settings(
    State(state): State<Arc<UiState>>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<SettingsStatus>, (StatusCode, String)> {
    let client_id = require_client_id(&req.client_id)?;
    let mut sessions = state.sessions.write().await;
    let session = sessions.entry(client_id).or_default();
    Ok(Json(
        session.apply_settings(req.settings, &state.config.credentials),
    ))
}

async fn get_session(
    State(state): State<Arc<UiState>>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let client_id = require_client_id(&query.client_id)?;
    let sessions = state.sessions.read().await;
    let response = match sessions.get(&client_id) {
        Some(session) => SessionResponse::from(session),
        None => SessionResponse::from(&ChatSession::default()),
    };
    Ok(Json(response))
}

async fn new_session(
    State(state): State<Arc<UiState>>,
    Json(query): Json<ClientQuery>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let client_id = require_client_id(&query.client_id)?;
    let mut sessions = state.sessions.write().await;
    let session = sessions.entry(client_id).or_default();
    let previous = AgentKey::new(
        session.user_id.clone().unwrap_or_default(),
        session.session_id.clone(),
    );
    session.reset();
    tracing::info!("Started new session {}", session.session_id);
    let response = SessionResponse::from(&*session);
    drop(sessions);

    state.registry.remove(&previous).await;
    Ok(Json(response))
}

async fn clear_status(
    State(state): State<Arc<UiState>>,
    Json(query): Json<ClientQuery>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let client_id = require_client_id(&query.client_id)?;
    let mut sessions = state.sessions.write().await;
    let response = match sessions.get_mut(&client_id) {
        Some(session) => {
            session.clear_execution_status();
            SessionResponse::from(&*session)
        }
        None => SessionResponse::from(&ChatSession::default()),
    };
    Ok(Json(response))
}

/// Run the agent for one chat message.
///
/// The stream carries a `view` event with the [`RunView`] snapshot after every agent
/// event, a `raw` event with the event itself when show-events is on, and a final `done`
/// event with the stored assistant message.
async fn chat(
    State(state): State<Arc<UiState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, (StatusCode, String)> {
    let client_id = require_client_id(&req.client_id)?;
    if req.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message is empty".to_string()));
    }

    let (key, settings, show_events) = {
        let mut sessions = state.sessions.write().await;
        let session = sessions.get_mut(&client_id).ok_or((
            StatusCode::BAD_REQUEST,
            "Settings have not been configured".to_string(),
        ))?;
        let chat_settings = session.settings.clone().ok_or((
            StatusCode::BAD_REQUEST,
            "Settings have not been configured".to_string(),
        ))?;
        let credentials = chat_settings
            .effective(&state.config.credentials)
            .require()
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        let user_id = session.user_id.clone().unwrap_or_default();

        session.messages.push(ChatMessage::user(req.message.clone()));
        (
            AgentKey::new(user_id, session.session_id.clone()),
            AgentSettings {
                model: chat_settings.model,
                debug_mode: chat_settings.debug_mode,
                credentials,
            },
            chat_settings.show_events,
        )
    };

    let agent = state.registry.get_or_build(key.clone(), settings).await;
    let message = req.message;

    let stream = async_stream::stream! {
        let mut view = RunView::new();
        view.begin_run();

        match agent {
            Ok(agent) => {
                let events = agent.stream(&message);
                futures::pin_mut!(events);
                while let Some(event) = events.next().await {
                    view.apply(&event);
                    if show_events {
                        if let Some(raw) = sse_json("raw", &event) {
                            yield Ok(raw);
                        }
                    }
                    if let Some(snapshot) = sse_json("view", &view) {
                        yield Ok(snapshot);
                    }
                }
                view.finish();
            }
            Err(e) => {
                tracing::error!("Failed to prepare agent: {}", e);
                view.fail(&e.to_string());
            }
        }

        if let Some(snapshot) = sse_json("view", &view) {
            yield Ok(snapshot);
        }

        let reply = ChatMessage::assistant(view.content.clone(), view);
        {
            let mut sessions = state.sessions.write().await;
            match sessions.get_mut(&client_id) {
                Some(session) if session.session_id == key.session_id => {
                    session.messages.push(reply.clone());
                }
                _ => tracing::info!(
                    "Session {} was replaced during the run, reply not stored",
                    key.session_id
                ),
            }
        }

        if let Some(done) = sse_json("done", &reply) {
            yield Ok(done);
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn require_client_id(client_id: &str) -> Result<String, (StatusCode, String)> {
    let client_id = client_id.trim();
    if client_id.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "client_id is required".to_string()));
    }
    Ok(client_id.to_string())
}

fn sse_json<T: Serialize>(name: &str, value: &T) -> Option<SseEvent> {
    match SseEvent::default().event(name).json_data(value) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::error!("Failed to encode {} event: {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{base_env, config_from};
    use crate::framework::fake::ScriptedFramework;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state(framework: ScriptedFramework) -> Arc<UiState> {
        Arc::new(UiState::new(
            Arc::new(config_from(&base_env())),
            Arc::new(framework),
        ))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    /// (event name, data) pairs of an SSE body.
    fn sse_events(text: &str) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        let mut name = String::new();
        for line in text.lines() {
            if let Some(n) = line.strip_prefix("event: ") {
                name = n.to_string();
            } else if let Some(data) = line.strip_prefix("data: ") {
                out.push((name.clone(), serde_json::from_str(data).unwrap()));
            }
        }
        out
    }

    fn full_settings(client_id: &str) -> Value {
        json!({
            "client_id": client_id,
            "model": "gemini-2.5-flash",
            "debug_mode": false,
            "show_events": true,
            "gemini_api_key": "gemini-key",
            "lc_site": "global",
            "lc_session": "lc-session",
            "gh_token": "ghp_token"
        })
    }

    #[tokio::test]
    async fn test_index_serves_page() {
        let app = router(state(ScriptedFramework::with_events(vec![])));
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("DSA Notes Agent"));
    }

    #[tokio::test]
    async fn test_ui_config() {
        let app = router(state(ScriptedFramework::with_events(vec![])));
        let response = app
            .oneshot(Request::get("/ui/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["model_options"], json!(["gemini-2.5-flash", "gemini-2.5-pro"]));
        assert_eq!(body["default_model"], "gemini-2.5-flash");
        assert_eq!(body["default_debug_mode"], true);
        assert_eq!(body["default_show_events"], false);
        assert_eq!(body["lc_sites"], json!(["global", "cn"]));
        assert_eq!(body["env_credentials"]["gh_token"], false);
    }

    #[tokio::test]
    async fn test_settings_validation() {
        let app = router(state(ScriptedFramework::with_events(vec![])));
        let response = app
            .clone()
            .oneshot(post_json(
                "/ui/settings",
                json!({ "client_id": "browser-1", "gemini_api_key": "key" }),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["config_valid"], false);
        assert_eq!(body["missing"], json!(["LeetCode session token", "GitHub token"]));

        let response = app
            .oneshot(post_json("/ui/settings", full_settings("browser-1")))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["config_valid"], true);
        assert_eq!(body["user_id"], "user-76a578ec9039");
    }

    #[tokio::test]
    async fn test_chat_requires_valid_settings() {
        let app = router(state(ScriptedFramework::with_events(vec![])));
        let response = app
            .clone()
            .oneshot(post_json(
                "/ui/chat",
                json!({ "client_id": "browser-1", "message": "hi" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        app.clone()
            .oneshot(post_json(
                "/ui/settings",
                json!({ "client_id": "browser-1", "lc_session": "s" }),
            ))
            .await
            .unwrap();
        let response = app
            .oneshot(post_json(
                "/ui/chat",
                json!({ "client_id": "browser-1", "message": "hi" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Gemini API key"));
    }

    #[tokio::test]
    async fn test_chat_streams_views_and_stores_reply() {
        let app = router(state(ScriptedFramework::with_events(vec![
            json!({ "event": "RunStarted", "model": "gemini-2.5-flash" }),
            json!({ "event": "ToolCallStarted", "tool": { "tool_name": "get_problem" } }),
            json!({ "event": "ToolCallCompleted", "tool": { "tool_name": "get_problem", "result": "Two Sum" } }),
            json!({ "event": "RunResponseContent", "content": "Notes " }),
            json!({ "event": "RunResponseContent", "content": "saved" }),
            json!({ "event": "RunCompleted", "content": "Notes saved" }),
        ])));
        app.clone()
            .oneshot(post_json("/ui/settings", full_settings("browser-1")))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(post_json(
                "/ui/chat",
                json!({ "client_id": "browser-1", "message": "I solved Two Sum" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let events = sse_events(&body_text(response).await);

        let raw_count = events.iter().filter(|(n, _)| n == "raw").count();
        let views: Vec<&Value> = events
            .iter()
            .filter(|(n, _)| n == "view")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(raw_count, 6);
        assert_eq!(views.len(), 7);
        assert_eq!(views[1]["tool"], "active");
        let last = views.last().unwrap();
        assert_eq!(last["run"], "done");
        assert_eq!(last["tool"], "done");
        assert_eq!(last["content"], "Notes saved");

        let (name, done) = events.last().unwrap();
        assert_eq!(name, "done");
        assert_eq!(done["role"], "assistant");
        assert_eq!(done["content"], "Notes saved");

        let response = app
            .oneshot(
                Request::get("/ui/session?client_id=browser-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let session = body_json(response).await;
        assert_eq!(session["user_id"], "user-76a578ec9039");
        assert_eq!(session["messages"].as_array().unwrap().len(), 2);
        assert_eq!(session["stats"]["total_responses"], 1);
        assert_eq!(session["stats"]["total_tools"], 1);
        assert_eq!(session["stats"]["total_events"], 6);
    }

    #[tokio::test]
    async fn test_new_session_and_clear_status() {
        let app = router(state(ScriptedFramework::with_events(vec![
            json!({ "event": "RunCompleted", "content": "ok" }),
        ])));
        app.clone()
            .oneshot(post_json("/ui/settings", full_settings("browser-1")))
            .await
            .unwrap();
        let response = app
            .clone()
            .oneshot(post_json(
                "/ui/chat",
                json!({ "client_id": "browser-1", "message": "hi" }),
            ))
            .await
            .unwrap();
        body_text(response).await;

        let cleared = body_json(
            app.clone()
                .oneshot(post_json(
                    "/ui/session/clear-status",
                    json!({ "client_id": "browser-1" }),
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(cleared["messages"].as_array().unwrap().len(), 2);
        assert!(cleared["messages"][1].get("execution").is_none());

        let fresh = body_json(
            app.oneshot(post_json(
                "/ui/session/new",
                json!({ "client_id": "browser-1" }),
            ))
            .await
            .unwrap(),
        )
        .await;
        assert_ne!(fresh["session_id"], cleared["session_id"]);
        assert_eq!(fresh["messages"], json!([]));
        assert!(fresh["stats"].is_null());
        assert_eq!(fresh["user_id"], "user-76a578ec9039");
    }

    #[tokio::test]
    async fn test_unknown_client_reads_do_not_create_sessions() {
        let state = state(ScriptedFramework::with_events(vec![]));
        let app = router(Arc::clone(&state));
        for client in ["a", "b", "c"] {
            let response = app
                .clone()
                .oneshot(
                    Request::get(format!("/ui/session?client_id={}", client))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            let body = body_json(response).await;
            assert_eq!(body["messages"], json!([]));
            assert!(body["user_id"].is_null());

            app.clone()
                .oneshot(post_json(
                    "/ui/session/clear-status",
                    json!({ "client_id": client }),
                ))
                .await
                .unwrap();
        }
        assert!(state.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_new_session_drops_previous_agent() {
        let state = state(ScriptedFramework::with_events(vec![
            json!({ "event": "RunCompleted", "content": "ok" }),
        ]));
        let app = router(Arc::clone(&state));
        app.clone()
            .oneshot(post_json("/ui/settings", full_settings("browser-1")))
            .await
            .unwrap();
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(post_json(
                    "/ui/chat",
                    json!({ "client_id": "browser-1", "message": "hi" }),
                ))
                .await
                .unwrap();
            body_text(response).await;
        }
        assert_eq!(state.registry.len().await, 1);

        app.oneshot(post_json(
            "/ui/session/new",
            json!({ "client_id": "browser-1" }),
        ))
        .await
        .unwrap();
        assert_eq!(state.registry.len().await, 0);
    }
}

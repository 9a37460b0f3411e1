//! Browser chat UI.
//!
//! Serves a single page plus a small JSON/SSE API. Each browser identifies itself with a
//! client id kept in local storage; its settings, conversation and statistics live in a
//! [`ChatSession`] on the server.

mod routes;
mod session;

pub use routes::{router, serve, UiState};
pub use session::{
    generate_user_id, ChatMessage, ChatSession, ChatSettings, Role, SessionStats,
    SettingsStatus, DEFAULT_SHOW_EVENTS,
};

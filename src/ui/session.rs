//! Per-browser chat sessions.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{ModelId, DEFAULT_DEBUG_MODE};
use crate::config::{CredentialDefaults, LeetCodeSite};
use crate::presenter::RunView;

/// Whether raw events are shown alongside the view by default.
pub const DEFAULT_SHOW_EVENTS: bool = false;

/// Stable user id derived from the tool credentials.
pub fn generate_user_id(lc_session: &str, gh_token: &str) -> String {
    let digest = format!("{:x}", md5::compute(format!("{}-{}", lc_session, gh_token)));
    format!("user-{}", &digest[..12])
}

/// Settings chosen in the sidebar. Blank credential fields fall back to the environment.
#[derive(Clone, PartialEq, Deserialize)]
pub struct ChatSettings {
    #[serde(default)]
    pub model: ModelId,
    #[serde(default = "default_debug_mode")]
    pub debug_mode: bool,
    #[serde(default)]
    pub show_events: bool,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub lc_site: LeetCodeSite,
    #[serde(default)]
    pub lc_session: Option<String>,
    #[serde(default)]
    pub gh_token: Option<String>,
}

fn default_debug_mode() -> bool {
    DEFAULT_DEBUG_MODE
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: ModelId::default(),
            debug_mode: DEFAULT_DEBUG_MODE,
            show_events: DEFAULT_SHOW_EVENTS,
            gemini_api_key: None,
            lc_site: LeetCodeSite::default(),
            lc_session: None,
            gh_token: None,
        }
    }
}

impl fmt::Debug for ChatSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSettings")
            .field("model", &self.model)
            .field("debug_mode", &self.debug_mode)
            .field("show_events", &self.show_events)
            .field("lc_site", &self.lc_site)
            .finish_non_exhaustive()
    }
}

impl ChatSettings {
    /// Credentials after filling blanks from the environment.
    pub fn effective(&self, defaults: &CredentialDefaults) -> CredentialDefaults {
        fn pick(own: &Option<String>, fallback: &Option<String>) -> Option<String> {
            own.as_ref()
                .filter(|v| !v.trim().is_empty())
                .or(fallback.as_ref())
                .cloned()
        }
        CredentialDefaults {
            gemini_api_key: pick(&self.gemini_api_key, &defaults.gemini_api_key),
            lc_site: self.lc_site,
            lc_session: pick(&self.lc_session, &defaults.lc_session),
            gh_token: pick(&self.gh_token, &defaults.gh_token),
        }
    }
}

/// Result of validating settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsStatus {
    pub config_valid: bool,
    pub missing: Vec<String>,
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Final presentation state of the run that produced this message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<RunView>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            execution: None,
        }
    }

    pub fn assistant(content: impl Into<String>, execution: RunView) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            execution: Some(execution),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_messages: usize,
    pub total_responses: usize,
    pub total_tools: usize,
    pub total_events: usize,
    /// Mean over responses with a positive execution time.
    pub avg_execution_time: f64,
}

/// One browser's conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub settings: Option<ChatSettings>,
    pub user_id: Option<String>,
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            settings: None,
            user_id: None,
            session_id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
        }
    }
}

impl ChatSession {
    /// Store new settings and re-derive the user id.
    pub fn apply_settings(
        &mut self,
        settings: ChatSettings,
        defaults: &CredentialDefaults,
    ) -> SettingsStatus {
        let effective = settings.effective(defaults);
        let missing: Vec<String> = effective.missing().into_iter().map(String::from).collect();
        let user_id = generate_user_id(
            effective.lc_session.as_deref().unwrap_or_default(),
            effective.gh_token.as_deref().unwrap_or_default(),
        );
        if self.user_id.as_deref() != Some(user_id.as_str()) {
            tracing::info!("User id for this browser is now {}", user_id);
        }

        self.user_id = Some(user_id.clone());
        self.settings = Some(settings);
        SettingsStatus {
            config_valid: missing.is_empty(),
            missing,
            user_id,
        }
    }

    /// Start a new conversation. Settings are kept.
    pub fn reset(&mut self) {
        self.session_id = Uuid::new_v4().to_string();
        self.messages.clear();
    }

    pub fn clear_execution_status(&mut self) {
        for message in &mut self.messages {
            message.execution = None;
        }
    }

    /// `None` until the first response.
    pub fn statistics(&self) -> Option<SessionStats> {
        let responses: Vec<&ChatMessage> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        if responses.is_empty() {
            return None;
        }

        let mut total_tools = 0;
        let mut total_events = 0;
        let mut timed = Vec::new();
        for view in responses.iter().filter_map(|m| m.execution.as_ref()) {
            total_tools += view.tools_used.len();
            total_events += view.total_events;
            if let Some(secs) = view.execution_time.filter(|t| *t > 0.0) {
                timed.push(secs);
            }
        }
        let avg_execution_time = if timed.is_empty() {
            0.0
        } else {
            timed.iter().sum::<f64>() / timed.len() as f64
        };

        Some(SessionStats {
            total_messages: self.messages.len(),
            total_responses: responses.len(),
            total_tools,
            total_events,
            avg_execution_time,
        })
    }
}

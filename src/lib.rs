//! # DSA Notes Agent
//!
//! A notes assistant for people practising data structures and algorithms.
//! The agent looks up solved problems through a LeetCode tool service and
//! saves organized markdown notes to GitHub through a second tool service.
//! The agent loop itself runs in an external agent runtime; this crate
//! configures it, normalizes what it streams back and presents it.
//!
//! This library provides:
//! - A REST API for running the agent (`dsa-agent-api`)
//! - A browser chat UI with live execution status (`dsa-agent-ui`)
//! - Event normalization from the runtime's loose payloads into [`Event`]
//! - A presentation state machine ([`RunView`]) driven by those events
//!
//! ## Architecture
//!
//! ```text
//!   REST API ─┐                     ┌──────────────────┐
//!             ├──▶ AgentRegistry ──▶│ DsaAgent         │──▶ agent runtime
//!   Chat UI ──┘                     │ (normalize)      │     (HTTP + SSE)
//!      ▲                            └────────┬─────────┘
//!      │                                     │ Event
//!      └────────────── RunView ◀─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use dsa_notes_agent::{AgentRegistry, Config, RunView};
//! use dsa_notes_agent::agent::{AgentKey, AgentSettings, ModelId};
//! use dsa_notes_agent::framework::RuntimeClient;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Arc::new(Config::from_env(8000)?);
//! let framework = Arc::new(RuntimeClient::new(config.runtime_url.clone()));
//! let registry = AgentRegistry::new(framework, Arc::clone(&config));
//!
//! let settings = AgentSettings {
//!     model: ModelId::Gemini25Flash,
//!     debug_mode: false,
//!     credentials: config.credentials.require()?,
//! };
//! let agent = registry
//!     .get_or_build(AgentKey::new("user-1", "session-1"), settings)
//!     .await?;
//!
//! let mut view = RunView::new();
//! view.begin_run();
//! let events = agent.stream("I solved LeetCode #1 Two Sum");
//! futures::pin_mut!(events);
//! while let Some(event) = events.next().await {
//!     view.apply(&event);
//! }
//! view.finish();
//! println!("{}", view.content);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod events;
pub mod framework;
pub mod logging;
pub mod mcp;
pub mod memory;
pub mod monitor;
pub mod presenter;
pub mod ui;

pub use agent::{AgentRegistry, DsaAgent};
pub use config::Config;
pub use events::{normalize, Event};
pub use presenter::RunView;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{AgentError, AgentKey, AgentSettings, DsaAgent};
use crate::config::Config;
use crate::framework::FrameworkRef;

/// Long-lived agents, one per conversation.
///
/// An agent is reused while its settings are unchanged and rebuilt otherwise. The lock is
/// only held for lookup and replacement, never across a run.
pub struct AgentRegistry {
    framework: FrameworkRef,
    config: Arc<Config>,
    agents: RwLock<HashMap<AgentKey, Arc<DsaAgent>>>,
}

impl AgentRegistry {
    pub fn new(framework: FrameworkRef, config: Arc<Config>) -> Self {
        Self {
            framework,
            config,
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Agent for `key`, reusing the registered one while its settings are unchanged.
    pub async fn get_or_build(
        &self,
        key: AgentKey,
        settings: AgentSettings,
    ) -> Result<Arc<DsaAgent>, AgentError> {
        {
            let agents = self.agents.read().await;
            if let Some(agent) = agents.get(&key) {
                if agent.settings() == &settings {
                    return Ok(Arc::clone(agent));
                }
            }
        }

        let agent = self.build(key.clone(), settings)?;

        let mut agents = self.agents.write().await;
        if agents.insert(key.clone(), Arc::clone(&agent)).is_some() {
            tracing::info!(
                "Rebuilt agent for user {}, session {} after a settings change",
                key.user_id,
                key.session_id
            );
        }
        Ok(agent)
    }

    /// Agent for a conversation no later call can name. It is not registered.
    pub fn build(
        &self,
        key: AgentKey,
        settings: AgentSettings,
    ) -> Result<Arc<DsaAgent>, AgentError> {
        Ok(Arc::new(DsaAgent::new(
            Arc::clone(&self.framework),
            &self.config,
            key,
            settings,
        )?))
    }

    /// Forget the agent for a conversation, if any.
    pub async fn remove(&self, key: &AgentKey) -> bool {
        let removed = self.agents.write().await.remove(key).is_some();
        if removed {
            tracing::debug!(
                "Dropped agent for user {}, session {}; {} cached",
                key.user_id,
                key.session_id,
                self.len().await
            );
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }
}

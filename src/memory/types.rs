//! Types for the memory subsystem.

use serde::{Deserialize, Serialize};

use crate::config::DatabaseConfig;

/// Table holding long-lived user memories.
pub const MEMORY_TABLE: &str = "user_memories";
/// Table holding per-session chat history.
pub const SESSION_TABLE: &str = "agent_sessions";
/// Number of prior runs replayed into each prompt.
pub const HISTORY_RUNS: u32 = 10;

/// Build the database connection string.
///
/// The password segment is omitted entirely when the password is empty.
pub fn database_url(db: &DatabaseConfig) -> String {
    let password = if db.password.is_empty() {
        String::new()
    } else {
        format!(":{}", db.password)
    };
    format!(
        "{}://{}{}@{}:{}/{}",
        db.driver, db.user, password, db.host, db.port, db.database
    )
}

/// Memory store handed to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySettings {
    pub db_url: String,
    pub table_name: String,
    /// Model used by the runtime's memory manager to extract user memories.
    pub model_id: String,
    /// Run the memory manager after each response.
    pub enable_user_memories: bool,
}

/// Session storage handed to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    pub db_url: String,
    pub table_name: String,
}

impl MemorySettings {
    pub fn new(db: &DatabaseConfig, model_id: impl Into<String>) -> Self {
        Self {
            db_url: database_url(db),
            table_name: MEMORY_TABLE.to_string(),
            model_id: model_id.into(),
            enable_user_memories: true,
        }
    }
}

impl StorageSettings {
    pub fn new(db: &DatabaseConfig) -> Self {
        Self {
            db_url: database_url(db),
            table_name: SESSION_TABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(password: &str) -> DatabaseConfig {
        DatabaseConfig {
            driver: "postgresql+psycopg".to_string(),
            user: "postgres".to_string(),
            password: password.to_string(),
            host: "localhost".to_string(),
            port: 5432,
            database: "dsa_agent".to_string(),
        }
    }

    #[test]
    fn test_database_url_with_password() {
        assert_eq!(
            database_url(&db("pw")),
            "postgresql+psycopg://postgres:pw@localhost:5432/dsa_agent"
        );
    }

    #[test]
    fn test_database_url_without_password() {
        assert_eq!(
            database_url(&db("")),
            "postgresql+psycopg://postgres@localhost:5432/dsa_agent"
        );
    }

    #[test]
    fn test_settings_use_framework_tables() {
        let memory = MemorySettings::new(&db("pw"), "gemini-2.5-flash");
        let storage = StorageSettings::new(&db("pw"));
        assert_eq!(memory.table_name, "user_memories");
        assert_eq!(storage.table_name, "agent_sessions");
        assert!(memory.enable_user_memories);
        assert_eq!(memory.db_url, storage.db_url);
    }
}

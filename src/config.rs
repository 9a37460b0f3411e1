//! Process configuration.
//!
//! Values are read once at startup from environment variables (a `.env` file in the
//! working directory is loaded first when present) and then passed by reference to the
//! components that need them. A missing required variable is a startup failure, never a
//! request-time one.
//!
//! Recognised variables:
//! - `GEMINI_API_KEY`, `LC_SESSION`, `GH_TOKEN`, `LC_SITE` - agent credentials
//! - `DB_DRIVER`, `DB_USER`, `DB_PASS`, `DB_HOST`, `DB_PORT`, `DB_DATABASE` - memory database
//! - `SMITHERY_API_KEY`, `SMITHERY_PROFILE`, `LC_MCP_BASE_URL`, `GH_MCP_BASE_URL` - tool gateway
//! - `AGENT_RUNTIME_URL` - external agent runtime
//! - `HOST`, `PORT`, `LOG_LEVEL` - process settings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default address of the external agent runtime.
pub const DEFAULT_RUNTIME_URL: &str = "http://localhost:7777";

/// Configuration failures. All of them are fatal at process start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    Missing { var: &'static str },

    #[error("Invalid value for {var} ({value:?}): {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Missing required credentials: {}", .missing.join(", "))]
    MissingCredentials { missing: Vec<&'static str> },
}

/// LeetCode site selector passed to the coding-platform tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeetCodeSite {
    #[default]
    Global,
    Cn,
}

impl LeetCodeSite {
    pub const ALL: [LeetCodeSite; 2] = [LeetCodeSite::Global, LeetCodeSite::Cn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Cn => "cn",
        }
    }
}

impl fmt::Display for LeetCodeSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeetCodeSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "cn" => Ok(Self::Cn),
            other => Err(format!("expected \"global\" or \"cn\", got {:?}", other)),
        }
    }
}

/// Parts of the memory/storage database connection string.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub driver: String,
    pub user: String,
    /// May be empty, in which case the password segment is omitted from the URL.
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

/// Remote tool-protocol gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub profile: String,
    /// Gateway endpoint for the coding-platform (LeetCode) server.
    pub leetcode_base_url: String,
    /// Gateway endpoint for the source-hosting (GitHub) server.
    pub github_base_url: String,
}

/// Credentials the environment may provide. The web UI lets users fill the gaps.
#[derive(Debug, Clone, Default)]
pub struct CredentialDefaults {
    pub gemini_api_key: Option<String>,
    pub lc_site: LeetCodeSite,
    pub lc_session: Option<String>,
    pub gh_token: Option<String>,
}

/// A complete set of agent credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub gemini_api_key: String,
    pub lc_site: LeetCodeSite,
    pub lc_session: String,
    pub gh_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("gemini_api_key", &"<redacted>")
            .field("lc_site", &self.lc_site)
            .field("lc_session", &"<redacted>")
            .field("gh_token", &"<redacted>")
            .finish()
    }
}

impl CredentialDefaults {
    /// Names of the credentials that are still missing, in display order.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.gemini_api_key) {
            missing.push("Gemini API key");
        }
        if is_blank(&self.lc_session) {
            missing.push("LeetCode session token");
        }
        if is_blank(&self.gh_token) {
            missing.push("GitHub token");
        }
        missing
    }

    /// Turn the defaults into a complete credential set.
    pub fn require(&self) -> Result<Credentials, ConfigError> {
        match (&self.gemini_api_key, &self.lc_session, &self.gh_token) {
            (Some(key), Some(session), Some(token))
                if !key.trim().is_empty()
                    && !session.trim().is_empty()
                    && !token.trim().is_empty() =>
            {
                Ok(Credentials {
                    gemini_api_key: key.clone(),
                    lc_site: self.lc_site,
                    lc_session: session.clone(),
                    gh_token: token.clone(),
                })
            }
            _ => Err(ConfigError::MissingCredentials {
                missing: self.missing(),
            }),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Process-wide configuration, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Base URL of the external agent runtime.
    pub runtime_url: String,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub credentials: CredentialDefaults,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `default_port` differs per entry point (API vs. web UI).
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(default_port, |key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(default_port: u16, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let database = DatabaseConfig {
            driver: env.or("DB_DRIVER", "postgresql+psycopg"),
            user: env.or("DB_USER", "postgres"),
            password: env.required_allow_empty("DB_PASS")?,
            host: env.or("DB_HOST", "localhost"),
            port: env.parsed("DB_PORT", 5432)?,
            database: env.or("DB_DATABASE", "dsa_agent"),
        };

        let gateway = GatewayConfig {
            api_key: env.required("SMITHERY_API_KEY")?,
            profile: env.required("SMITHERY_PROFILE")?,
            leetcode_base_url: env.required("LC_MCP_BASE_URL")?,
            github_base_url: env.required("GH_MCP_BASE_URL")?,
        };

        let credentials = CredentialDefaults {
            gemini_api_key: env.optional("GEMINI_API_KEY"),
            lc_site: env.parsed("LC_SITE", LeetCodeSite::Global)?,
            lc_session: env.optional("LC_SESSION"),
            gh_token: env.optional("GH_TOKEN"),
        };

        Ok(Self {
            host: env.or("HOST", "0.0.0.0"),
            port: env.parsed("PORT", default_port)?,
            log_level: env.or("LOG_LEVEL", "INFO"),
            runtime_url: env.or("AGENT_RUNTIME_URL", DEFAULT_RUNTIME_URL),
            database,
            gateway,
            credentials,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, var: &'static str) -> Option<String> {
        (self.lookup)(var).filter(|v| !v.trim().is_empty())
    }

    fn or(&self, var: &'static str, default: &str) -> String {
        self.optional(var).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.optional(var).ok_or(ConfigError::Missing { var })
    }

    fn required_allow_empty(&self, var: &'static str) -> Result<String, ConfigError> {
        (self.lookup)(var).ok_or(ConfigError::Missing { var })
    }

    fn parsed<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(var) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        }
    }
}

//! Types describing MCP servers handed to the agent runtime.

use serde::{Deserialize, Serialize};
use url::Url;

/// Transport the runtime should use for an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum McpTransport {
    StreamableHttp,
}

/// One remote MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServer {
    /// Short name used in logs ("leetcode", "github").
    pub name: String,
    /// Full gateway URL, including the encoded server config and gateway credentials.
    pub url: Url,
    pub transport: McpTransport,
}

impl McpServer {
    /// URL without its query string, safe to log.
    pub fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }
}

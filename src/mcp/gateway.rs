//! Gateway URL construction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use url::Url;

use super::types::{McpServer, McpTransport};
use crate::config::{Credentials, GatewayConfig};

/// Build a gateway URL for one tool server.
///
/// The server config is serialized to JSON and base64 encoded; the gateway API key and
/// profile ride along as query parameters.
pub fn gateway_url(
    base_url: &str,
    config: &Value,
    api_key: &str,
    profile: &str,
) -> Result<Url, url::ParseError> {
    let encoded = STANDARD.encode(config.to_string());
    let mut url = Url::parse(base_url)?;
    url.query_pairs_mut()
        .append_pair("config", &encoded)
        .append_pair("api_key", api_key)
        .append_pair("profile", profile);
    Ok(url)
}

/// The set of MCP servers one agent is wired to.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolGateway {
    pub servers: Vec<McpServer>,
}

impl ToolGateway {
    /// LeetCode and GitHub servers for the given credentials.
    pub fn for_credentials(
        gateway: &GatewayConfig,
        credentials: &Credentials,
    ) -> Result<Self, url::ParseError> {
        let leetcode = gateway_url(
            &gateway.leetcode_base_url,
            &json!({
                "site": credentials.lc_site.as_str(),
                "session": credentials.lc_session,
            }),
            &gateway.api_key,
            &gateway.profile,
        )?;

        let github = gateway_url(
            &gateway.github_base_url,
            &json!({ "githubPersonalAccessToken": credentials.gh_token }),
            &gateway.api_key,
            &gateway.profile,
        )?;

        let servers = vec![
            McpServer {
                name: "leetcode".to_string(),
                url: leetcode,
                transport: McpTransport::StreamableHttp,
            },
            McpServer {
                name: "github".to_string(),
                url: github,
                transport: McpTransport::StreamableHttp,
            },
        ];

        for server in &servers {
            tracing::debug!("{} MCP URL: {}", server.name, server.redacted_url());
        }

        Ok(Self { servers })
    }
}

//! MCP (Model Context Protocol) tool gateway wiring.
//!
//! The agent reaches its external tools (LeetCode and GitHub servers) through a hosted
//! tool-protocol gateway. This module only builds the gateway endpoints the runtime
//! connects to; the protocol itself is spoken by the runtime.

mod gateway;
mod types;

pub use gateway::{gateway_url, ToolGateway};
pub use types::*;

//! The remote MCP server as the model sees it: a tool descriptor attached to
//! each request. The model API performs the actual tool calls.

pub mod registration;

pub const MCP_TOOL_TYPE: &str = "mcp";
pub const MCP_ENDPOINT_PATH: &str = "mcp";

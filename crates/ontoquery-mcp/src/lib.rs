//! Ontoquery MCP - Model Context Protocol server
//!
//! Exposes subgraph queries, object queries, condition compilation and
//! type-path listing as MCP tools over JSON-RPC on stdio.

pub mod handlers;
pub mod server;
pub mod tools;
pub mod transport;

pub use handlers::{ToolCallRequest, ToolCallResponse, ToolHandler};
pub use server::McpServer;

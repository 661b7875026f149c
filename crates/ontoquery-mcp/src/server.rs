//! MCP server implementation

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::handlers::{ToolCallRequest, ToolHandler};
use crate::tools::get_tools;
use crate::transport::{
    Incoming, JsonRpcRequest, JsonRpcResponse, StdioTransport, INTERNAL_ERROR, INVALID_PARAMS,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

const SERVER_NAME: &str = "ontoquery";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP Server for Ontoquery
pub struct McpServer {
    handler: ToolHandler,
}

impl McpServer {
    pub fn new(handler: ToolHandler) -> Self {
        Self { handler }
    }

    /// Start the MCP server on stdio
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        tracing::info!("Starting MCP server on stdio");
        self.serve(StdioTransport::stdio()).await
    }

    /// Answer requests until the transport reaches EOF
    pub async fn serve<R, W>(&self, mut transport: StdioTransport<R, W>) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let response = match transport.read_request().await {
                Ok(Some(Incoming::Request(request))) => {
                    tracing::debug!("Received request: {}", request.method);
                    self.handle_request(request).await
                }
                Ok(Some(Incoming::Malformed(reason))) => {
                    tracing::warn!("Malformed request: {}", reason);
                    Some(JsonRpcResponse::error(
                        serde_json::Value::Null,
                        PARSE_ERROR,
                        format!("Parse error: {}", reason),
                    ))
                }
                Ok(None) => {
                    tracing::info!("EOF on input, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read request: {}", e);
                    return Err(e.into());
                }
            };

            if let Some(response) = response {
                if let Err(e) = transport.write_response(&response).await {
                    tracing::error!("Failed to write response: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Handle one request; notifications get no response
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            tracing::debug!("Notification: {}", request.method);
            return None;
        };

        Some(match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": get_tools() })),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "ping" => JsonRpcResponse::success(id, json!({})),
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        })
    }

    fn handle_initialize(&self, id: serde_json::Value) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            }
        });
        JsonRpcResponse::success(id, result)
    }

    async fn handle_tools_call(&self, id: serde_json::Value, params: serde_json::Value) -> JsonRpcResponse {
        let request: ToolCallRequest = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
        };

        tracing::debug!("Tool call: {} with args: {}", request.name, request.arguments);
        let response = self.handler.handle(request).await;

        match serde_json::to_value(response) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {}", e)),
        }
    }
}

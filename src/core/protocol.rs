/// MCP JSON-RPC 2.0 Protocol Layer
///
/// This module contains:
/// - JSON-RPC 2.0 request/response structures
/// - The method router shared by the HTTP and STDIO transports
/// - Conversion of typed tool errors into the JSON-RPC envelope
///
/// Tool outcomes stay typed (`Result<ToolResult, ToolError>`) until they
/// reach `tool_outcome_response`, the only place they become JSON.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::dispatcher::{Dispatcher, ToolResult};
use crate::core::error::ToolError;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// State shared by every request: server metadata plus the dispatcher.
#[derive(Clone)]
pub struct ServerContext {
    /// Server name as reported in MCP initialize responses
    pub server_name: String,
    /// Server version string as reported in MCP initialize responses
    pub server_version: String,
    pub dispatcher: Arc<Dispatcher>,
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// `id` is None for notifications, which never receive a response.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    /// JSON-RPC version identifier, must be "2.0"
    pub jsonrpc: String,
    /// Request ID for correlating responses. None only when the member is
    /// absent; an explicit `"id": null` is still a request.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    pub method: String,
    /// Method-specific parameters as JSON value
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Carries either a result or an error, never both.
#[derive(Serialize, Debug, PartialEq)]
pub struct MCPResponse {
    jsonrpc: String,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

impl MCPResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: MCPError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug, PartialEq)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MCPError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default = "empty_object")]
    arguments: Value,
}

fn empty_object() -> Value {
    json!({})
}

/// Route one request to its method handler.
///
/// Returns None for notifications.
pub fn route(ctx: &ServerContext, req: MCPRequest) -> Option<MCPResponse> {
    let Some(id) = req.id else {
        tracing::debug!(method = %req.method, "Notification received");
        return None;
    };
    let id = Some(id);

    if req.jsonrpc != JSONRPC_VERSION {
        return Some(MCPResponse::failure(
            id,
            MCPError::new(INVALID_REQUEST, format!("Unsupported jsonrpc version: {}", req.jsonrpc)),
        ));
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(ctx, id),
        "ping" => MCPResponse::success(id, json!({})),
        "tools/list" => handle_tools_list(ctx, id),
        "tools/call" => handle_tools_call(ctx, id, req.params),
        _ => MCPResponse::failure(
            id,
            MCPError::new(METHOD_NOT_FOUND, format!("Method not found: {}", req.method)),
        ),
    };
    Some(response)
}

/// Parse one raw message and route it.
///
/// Text that is not JSON gets a parse error with a null `id`. JSON that is
/// not a valid request gets an invalid-request error echoing its `id`, or
/// null when none can be recovered.
pub fn handle_message(ctx: &ServerContext, raw: &str) -> Option<MCPResponse> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => handle_value(ctx, value),
        Err(e) => {
            tracing::warn!(error = %e, "Parse error");
            Some(MCPResponse::failure(
                Some(Value::Null),
                MCPError::new(PARSE_ERROR, format!("Parse error: {}", e)),
            ))
        }
    }
}

/// Validate an already parsed JSON value as a request and route it.
pub fn handle_value(ctx: &ServerContext, value: Value) -> Option<MCPResponse> {
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    match serde_json::from_value::<MCPRequest>(value) {
        Ok(req) => route(ctx, req),
        Err(e) => {
            tracing::warn!(error = %e, "Invalid request");
            Some(MCPResponse::failure(
                Some(id),
                MCPError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
            ))
        }
    }
}

/// Handle MCP initialize method.
///
/// Returns the protocol version, server capabilities, and server information.
fn handle_initialize(ctx: &ServerContext, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": ctx.server_name,
                "version": ctx.server_version
            }
        }),
    )
}

/// Handle MCP tools/list method.
fn handle_tools_list(ctx: &ServerContext, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(id, json!({ "tools": ctx.dispatcher.list_tools() }))
}

/// Handle MCP tools/call method.
fn handle_tools_call(ctx: &ServerContext, id: Option<Value>, params: Option<Value>) -> MCPResponse {
    let Some(params) = params else {
        return MCPResponse::failure(id, MCPError::new(INVALID_PARAMS, "Invalid params"));
    };
    let CallParams { name, arguments } = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => {
            return MCPResponse::failure(
                id,
                MCPError::new(INVALID_PARAMS, format!("Invalid params: {}", e)),
            );
        }
    };

    let outcome = ctx.dispatcher.call_tool(&name, arguments);
    if let Err(e) = &outcome {
        tracing::warn!(tool = %name, kind = e.kind(), error = %e, "Tool call failed");
    }
    tool_outcome_response(id, outcome)
}

/// Convert a tool outcome into its JSON-RPC envelope.
///
/// Unknown tools and invalid arguments are protocol errors. Handler failures
/// are reported inside the result with `isError: true`, as MCP expects for
/// errors the model may act on.
pub fn tool_outcome_response(id: Option<Value>, outcome: Result<ToolResult, ToolError>) -> MCPResponse {
    match outcome {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => MCPResponse::success(id, value),
            Err(e) => MCPResponse::failure(id, MCPError::new(INTERNAL_ERROR, format!("Internal error: {}", e))),
        },
        Err(e) => {
            let message = e.to_string();
            match e {
                ToolError::ToolNotFound { name } => MCPResponse::failure(
                    id,
                    MCPError::new(METHOD_NOT_FOUND, message).with_data(json!({ "tool": name })),
                ),
                ToolError::SchemaViolation { tool, violations } => MCPResponse::failure(
                    id,
                    MCPError::new(INVALID_PARAMS, message)
                        .with_data(json!({ "tool": tool, "violations": violations })),
                ),
                ToolError::HandlerExecutionError { cause, .. } => MCPResponse::success(
                    id,
                    json!({
                        "content": [
                            {
                                "type": "text",
                                "text": format!("Error: {}", cause)
                            }
                        ],
                        "isError": true
                    }),
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ToolConfig;
    use crate::tools;

    fn context() -> ServerContext {
        let dispatcher = tools::initialize_tools(&ToolConfig::default()).unwrap();
        ServerContext {
            server_name: "custom-mcp-server".to_string(),
            server_version: "1.0.0".to_string(),
            dispatcher: Arc::new(dispatcher),
        }
    }

    fn call(raw: &str) -> Value {
        let response = handle_message(&context(), raw).expect("expected a response");
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn initialize_reports_server_info() {
        let response = call(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], "custom-mcp-server");
        assert_eq!(response["result"]["serverInfo"]["version"], "1.0.0");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn tools_list_advertises_camel_case_schemas() {
        let response = call(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#);
        let tools = response["result"]["tools"].as_array().unwrap();
        let custom = tools.iter().find(|t| t["name"] == "custom_tool").unwrap();
        assert_eq!(custom["inputSchema"]["required"], json!(["input"]));
        assert_eq!(custom["inputSchema"]["properties"]["input"]["type"], "string");
    }

    #[test]
    fn tools_call_returns_text_content() {
        let response = call(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"custom_tool","arguments":{"input":"abc"}}}"#,
        );
        assert_eq!(response["id"], 3);
        assert_eq!(
            response["result"],
            json!({
                "content": [{ "type": "text", "text": "Processed: abc" }],
                "isError": false
            })
        );
        assert!(response.get("error").is_none());
    }

    #[test]
    fn unknown_tool_is_a_structured_error() {
        let response = call(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"missing_tool","arguments":{}}}"#,
        );
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Unknown tool: missing_tool");
        assert_eq!(response["error"]["data"]["tool"], "missing_tool");
        assert!(response.get("result").is_none());
    }

    #[test]
    fn missing_argument_lists_field() {
        let response = call(
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"custom_tool"}}"#,
        );
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
        assert_eq!(
            response["error"]["data"]["violations"],
            json!([{ "field": "input", "problem": { "kind": "missing" } }])
        );
        assert!(response.get("result").is_none());
    }

    #[test]
    fn handler_failure_is_reported_in_result() {
        let response = tool_outcome_response(
            Some(json!(9)),
            Err(ToolError::HandlerExecutionError {
                tool: "custom_tool".to_string(),
                cause: "quota exceeded".into(),
            }),
        );
        let response = serde_json::to_value(response).unwrap();
        assert_eq!(
            response["result"],
            json!({
                "content": [{ "type": "text", "text": "Error: quota exceeded" }],
                "isError": true
            })
        );
        assert!(response.get("error").is_none());
    }

    #[test]
    fn missing_params_is_invalid_params() {
        let response = call(r#"{"jsonrpc":"2.0","id":6,"method":"tools/call"}"#);
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let response = call(r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#);
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Method not found: resources/list");
    }

    #[test]
    fn wrong_jsonrpc_version_is_invalid_request() {
        let response = call(r#"{"jsonrpc":"1.0","id":8,"method":"ping"}"#);
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
    }

    #[test]
    fn ping_returns_empty_result() {
        let response = call(r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#);
        assert_eq!(response["result"], json!({}));
        assert_eq!(response["id"], "p");
    }

    #[test]
    fn notifications_get_no_response() {
        let ctx = context();
        assert!(handle_message(&ctx, r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).is_none());
    }

    #[test]
    fn valid_json_without_method_is_invalid_request() {
        let response = call(r#"{"jsonrpc":"2.0","id":10}"#);
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
        assert_eq!(response["id"], 10);

        let response = call(r#"[1, 2, 3]"#);
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
        assert!(response["id"].is_null());
    }

    #[test]
    fn broken_json_is_parse_error_with_null_id() {
        let response = call(r#"{"jsonrpc":"2.0","id":11,"method":"#);
        assert_eq!(response["error"]["code"], PARSE_ERROR);
        assert!(response["id"].is_null());
        assert!(response.get("result").is_none());

        let response = call("not json");
        assert_eq!(response["error"]["code"], PARSE_ERROR);
    }

    #[test]
    fn null_id_is_a_request_not_a_notification() {
        let response = call(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#);
        assert_eq!(response["result"], json!({}));
        assert_eq!(response.get("id"), Some(&Value::Null));

        let ctx = context();
        let req: MCPRequest = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
        assert!(req.id.is_none());
        assert!(route(&ctx, req).is_none());
    }
}

/// Tool Dispatcher
///
/// The dispatcher owns the handler table and runs a call through the fixed
/// pipeline: resolve the tool, validate arguments, invoke the handler, then
/// normalize whatever the handler returned into a `ToolResult`.
///
/// Tools are registered in pairs (definition + handler) through
/// `ToolSetBuilder`, which produces the read-only `Registry` and the
/// `Dispatcher` in one step so the two can never disagree about which names
/// exist.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{HandlerError, RegistryError, ToolError};
use crate::core::registry::{Registry, ToolCallRequest, ToolDefinition};

/// Tool handler function type.
///
/// Handlers are boxed closures that take the validated JSON arguments and
/// return either a JSON value (normalized into content blocks) or an error.
/// They must be Send + Sync so one dispatcher can serve every HTTP worker.
pub type ToolHandler = Box<dyn Fn(Value) -> Result<Value, HandlerError> + Send + Sync>;

/// A tagged unit of result payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

/// Successful outcome of a tool call: a non-empty, ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    content: Vec<ContentBlock>,
    #[serde(rename = "isError")]
    is_error: bool,
}

impl ToolResult {
    fn from_blocks(mut content: Vec<ContentBlock>) -> Self {
        if content.is_empty() {
            content.push(ContentBlock::text(""));
        }
        Self { content, is_error: false }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_blocks(vec![ContentBlock::text(text)])
    }

    pub fn content(&self) -> &[ContentBlock] {
        &self.content
    }

    /// Normalize a handler's return value.
    ///
    /// Strings become a single text block verbatim. Values that already carry
    /// content blocks (a bare array of blocks, or an object with a `content`
    /// array) are kept as they are. Everything else is rendered as compact
    /// JSON text.
    ///
    /// An object flagged `"isError": true` is a failure, not a result: its
    /// text blocks (or its JSON text) become the error message.
    pub fn from_value(value: Value) -> Result<Self, HandlerError> {
        if let Value::String(text) = value {
            return Ok(Self::text(text));
        }

        let flagged = value.get("isError").and_then(Value::as_bool).unwrap_or(false);
        let blocks = match &value {
            Value::Array(_) => Some(&value),
            Value::Object(object) => object.get("content").filter(|c| c.is_array()),
            _ => None,
        }
        .and_then(|b| Vec::<ContentBlock>::deserialize(b).ok());

        match (flagged, blocks) {
            (true, Some(blocks)) if !blocks.is_empty() => Err(join_text(&blocks).into()),
            (true, _) => Err(value.to_string().into()),
            (false, Some(blocks)) => Ok(Self::from_blocks(blocks)),
            (false, None) => Ok(Self::text(value.to_string())),
        }
    }
}

fn join_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => text.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collects tool definitions and their handlers during startup.
#[derive(Default)]
pub struct ToolSetBuilder {
    definitions: Vec<ToolDefinition>,
    handlers: HashMap<String, ToolHandler>,
    duplicate: Option<String>,
}

impl ToolSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool definition together with the handler that executes it.
    pub fn register(&mut self, tool: ToolDefinition, handler: ToolHandler) -> &mut Self {
        let name = tool.name.clone();
        if self.handlers.insert(name.clone(), handler).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(name);
        }
        self.definitions.push(tool);
        self
    }

    /// Freeze the tool set. Fails if any name was registered twice.
    pub fn build(self) -> Result<Dispatcher, RegistryError> {
        if let Some(name) = self.duplicate {
            return Err(RegistryError::DuplicateTool(name));
        }
        let registry = Registry::from_definitions(self.definitions)?;
        Ok(Dispatcher {
            registry: Arc::new(registry),
            handlers: self.handlers,
        })
    }
}

/// Validates and executes tool calls.
///
/// Holds no mutable state, so `handle` may be called from any number of
/// threads at once.
pub struct Dispatcher {
    registry: Arc<Registry>,
    handlers: HashMap<String, ToolHandler>,
}

impl Dispatcher {
    #[cfg(test)]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn list_tools(&self) -> &[ToolDefinition] {
        self.registry.list_tools()
    }

    /// Execute one tool call.
    pub fn handle(&self, request: &ToolCallRequest) -> Result<ToolResult, ToolError> {
        let definition = self.registry.validate(request)?;

        // The builder inserts a handler for every definition it accepts.
        let handler = self
            .handlers
            .get(&definition.name)
            .ok_or_else(|| ToolError::not_found(&definition.name))?;

        tracing::debug!(tool = %definition.name, "Invoking tool handler");
        handler(request.arguments.clone())
            .and_then(ToolResult::from_value)
            .map_err(|cause| ToolError::HandlerExecutionError {
                tool: definition.name.clone(),
                cause,
            })
    }

    /// Convenience wrapper building the request from its parts.
    pub fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, ToolError> {
        self.handle(&ToolCallRequest::new(name, arguments))
    }
}

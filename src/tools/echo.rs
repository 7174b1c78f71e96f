/// Echo Tool Implementation
///
/// Returns the message it is given, optionally upper-cased, with a
/// configurable prefix from the tool configuration.

use serde_json::Value;

use crate::core::config::ToolConfig;
use crate::core::dispatcher::{ToolHandler, ToolSetBuilder};
use crate::core::error::HandlerError;
use crate::core::registry::ToolDefinition;
use crate::core::schema::{FieldKind, ObjectSchema};

pub const NAME: &str = "echo";

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        "Echo a message back to the client.",
        ObjectSchema::new()
            .required("message", FieldKind::String, "The message to echo")
            .optional("uppercase", FieldKind::Boolean, "Upper-case the message before echoing")
            .closed(),
    )
}

/// Register the echo tool.
///
/// The prefix is read from kmcp.yaml once, at registration time:
/// ```yaml
/// tools:
///   echo:
///     prefix: "Echo: "
/// ```
pub fn register(builder: &mut ToolSetBuilder, config: &ToolConfig) {
    let prefix = config.get_str(NAME, "prefix").unwrap_or_default().to_string();

    let handler: ToolHandler = Box::new(move |args: Value| -> Result<Value, HandlerError> {
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .ok_or("Missing required parameter: message")?;
        let uppercase = args.get("uppercase").and_then(Value::as_bool).unwrap_or(false);

        // Pre-allocate with known capacity to avoid reallocations
        let mut result = String::with_capacity(prefix.len() + message.len());
        result.push_str(&prefix);
        if uppercase {
            result.push_str(&message.to_uppercase());
        } else {
            result.push_str(message);
        }
        Ok(Value::String(result))
    });

    builder.register(definition(), handler);
}

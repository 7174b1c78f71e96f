/// Custom Tool
///
/// Template tool that processes a single string input. The output prefix
/// defaults to "Processed: " and can be changed in kmcp.yaml:
///
/// ```yaml
/// tools:
///   custom_tool:
///     prefix: "Handled: "
/// ```

use serde_json::Value;

use crate::core::config::ToolConfig;
use crate::core::dispatcher::{ToolHandler, ToolSetBuilder};
use crate::core::error::HandlerError;
use crate::core::registry::ToolDefinition;
use crate::core::schema::{FieldKind, ObjectSchema};

pub const NAME: &str = "custom_tool";
const DEFAULT_PREFIX: &str = "Processed: ";

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        "A custom tool for your specific use case",
        ObjectSchema::new().required("input", FieldKind::String, "Input for the custom tool"),
    )
}

pub fn register(builder: &mut ToolSetBuilder, config: &ToolConfig) {
    let prefix = config.get_str(NAME, "prefix").unwrap_or(DEFAULT_PREFIX).to_string();

    let handler: ToolHandler = Box::new(move |args: Value| -> Result<Value, HandlerError> {
        // Validated by the registry before we get here
        let input = args
            .get("input")
            .and_then(Value::as_str)
            .ok_or("input must be a string")?;
        Ok(Value::String(format!("{}{}", prefix, input)))
    });

    builder.register(definition(), handler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatcher::ContentBlock;
    use crate::core::error::{FieldViolation, Problem, ToolError};
    use serde_json::json;

    fn dispatcher(config: &ToolConfig) -> crate::core::dispatcher::Dispatcher {
        let mut builder = ToolSetBuilder::new();
        register(&mut builder, config);
        builder.build().unwrap()
    }

    #[test]
    fn processes_input() {
        let result = dispatcher(&ToolConfig::default())
            .call_tool(NAME, json!({"input": "abc"}))
            .unwrap();
        assert_eq!(result.content(), &[ContentBlock::text("Processed: abc")]);
    }

    #[test]
    fn rejects_missing_input() {
        let err = dispatcher(&ToolConfig::default())
            .call_tool(NAME, json!({}))
            .unwrap_err();
        match err {
            ToolError::SchemaViolation { violations, .. } => {
                assert_eq!(violations, vec![FieldViolation::new("input", Problem::Missing)]);
            }
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn prefix_comes_from_config() {
        let config = ToolConfig::parse("tools:\n  custom_tool:\n    prefix: \"Handled: \"\n").unwrap();
        let result = dispatcher(&config).call_tool(NAME, json!({"input": "x"})).unwrap();
        assert_eq!(result.content(), &[ContentBlock::text("Handled: x")]);
    }
}

/// Tool Registry
///
/// The registry is the read-only catalog of tool definitions. It is built
/// once at startup (see `ToolSetBuilder` in the dispatcher module) and then
/// shared behind an `Arc`; every operation here is a pure read, so concurrent
/// callers never need a lock.

use serde::{Serialize, Serializer, ser::SerializeStruct};
use serde_json::Value;

use crate::core::error::{RegistryError, ToolError};
use crate::core::schema::ObjectSchema;

/// MCP tool definition.
///
/// Serialized as `{name, description, inputSchema}` when listing tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// Unique tool identifier (e.g., "echo", "custom_tool")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// Contract for the tool's arguments
    pub input_schema: ObjectSchema,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: ObjectSchema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

impl Serialize for ToolDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolDefinition", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("inputSchema", &self.input_schema.to_json_schema())?;
        state.end()
    }
}

/// An incoming call: tool name plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self { name: name.into(), arguments }
    }
}

/// Read-only catalog of tool definitions, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    tools: Vec<ToolDefinition>,
}

impl Registry {
    /// Build a registry from definitions, rejecting duplicate names.
    ///
    /// Required parameters are flags on declared fields, so a schema can never
    /// require a parameter it does not declare.
    pub fn from_definitions(tools: Vec<ToolDefinition>) -> Result<Self, RegistryError> {
        for (i, tool) in tools.iter().enumerate() {
            if tools[..i].iter().any(|t| t.name == tool.name) {
                return Err(RegistryError::DuplicateTool(tool.name.clone()));
            }
        }
        Ok(Self { tools })
    }

    /// All definitions in registration order.
    pub fn list_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Look up a definition by name.
    pub fn describe(&self, name: &str) -> Result<&ToolDefinition, ToolError> {
        self.tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ToolError::not_found(name))
    }

    /// Resolve the named tool and check the request's arguments against its
    /// input schema. Does not execute anything.
    pub fn validate(&self, request: &ToolCallRequest) -> Result<&ToolDefinition, ToolError> {
        let definition = self.describe(&request.name)?;
        definition
            .input_schema
            .validate(&request.arguments)
            .map_err(|violations| ToolError::SchemaViolation {
                tool: definition.name.clone(),
                violations,
            })?;
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{FieldViolation, Problem};
    use crate::core::schema::FieldKind;
    use serde_json::json;

    fn custom_tool() -> ToolDefinition {
        ToolDefinition::new(
            "custom_tool",
            "A custom tool for your specific use case",
            ObjectSchema::new().required("input", FieldKind::String, "Input for the custom tool"),
        )
    }

    fn registry() -> Registry {
        Registry::from_definitions(vec![
            custom_tool(),
            ToolDefinition::new("echo", "Echo", ObjectSchema::new()),
        ])
        .unwrap()
    }

    #[test]
    fn lists_in_registration_order() {
        let names: Vec<_> = registry().list_tools().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["custom_tool", "echo"]);
    }

    #[test]
    fn describe_agrees_with_listing() {
        let registry = registry();
        for tool in registry.list_tools() {
            assert_eq!(registry.describe(&tool.name).unwrap(), tool);
        }
    }

    #[test]
    fn describe_unknown_name() {
        let err = registry().describe("missing_tool").unwrap_err();
        assert!(matches!(err, ToolError::ToolNotFound { ref name } if name == "missing_tool"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Registry::from_definitions(vec![custom_tool(), custom_tool()]).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("custom_tool".into()));
    }

    #[test]
    fn validate_reports_field_level_detail() {
        let request = ToolCallRequest::new("custom_tool", json!({}));
        match registry().validate(&request) {
            Err(ToolError::SchemaViolation { tool, violations }) => {
                assert_eq!(tool, "custom_tool");
                assert_eq!(violations, vec![FieldViolation::new("input", Problem::Missing)]);
            }
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn validate_returns_definition_on_success() {
        let request = ToolCallRequest::new("custom_tool", json!({"input": "abc"}));
        assert_eq!(registry().validate(&request).unwrap().name, "custom_tool");
    }

    #[test]
    fn serializes_with_camel_case_schema_key() {
        let value = serde_json::to_value(custom_tool()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "custom_tool",
                "description": "A custom tool for your specific use case",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "input": { "type": "string", "description": "Input for the custom tool" }
                    },
                    "required": ["input"]
                }
            })
        );
    }
}

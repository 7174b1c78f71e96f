/// Error Types for Tool Registration and Dispatch
///
/// `ToolError` is the outcome of a failed tool call. It is returned as a typed
/// value from the dispatcher and only turned into a JSON-RPC envelope by the
/// protocol layer. `RegistryError` covers mistakes made while building the
/// tool catalog at startup.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Boxed error returned by tool handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// One offending argument found during schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted path of the field (e.g. `input`, `address.city`, or `$` for the root)
    pub field: String,
    /// What is wrong with it
    pub problem: Problem,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, problem: Problem) -> Self {
        Self { field: field.into(), problem }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Kind of schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    /// A required field is absent
    Missing,
    /// A field not declared by a closed schema is present
    Unexpected,
    /// The value has the wrong JSON type
    TypeMismatch { expected: String, actual: String },
    /// The value is not one of the allowed enum members
    NotAllowed { allowed: Vec<String> },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Missing => f.write_str("missing"),
            Problem::Unexpected => f.write_str("unexpected"),
            Problem::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch (expected {}, got {})", expected, actual)
            }
            Problem::NotAllowed { allowed } => write!(f, "not one of [{}]", allowed.join(", ")),
        }
    }
}

/// Failure of a single tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name is registered
    #[error("Unknown tool: {name}")]
    ToolNotFound { name: String },

    /// Arguments do not satisfy the tool's input schema
    #[error("Invalid arguments for tool {tool}: {}", join_violations(.violations))]
    SchemaViolation {
        tool: String,
        violations: Vec<FieldViolation>,
    },

    /// The handler ran and failed
    #[error("Tool {tool} failed: {cause}")]
    HandlerExecutionError {
        tool: String,
        #[source]
        cause: HandlerError,
    },
}

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        ToolError::ToolNotFound { name: name.into() }
    }

    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::ToolNotFound { .. } => "tool_not_found",
            ToolError::SchemaViolation { .. } => "schema_violation",
            ToolError::HandlerExecutionError { .. } => "handler_execution_error",
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while assembling the tool catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate tool name '{0}'")]
    DuplicateTool(String),
}

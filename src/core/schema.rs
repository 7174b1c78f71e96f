/// Tool Input Schemas
///
/// A tool's input contract is an `ObjectSchema`: an ordered list of named
/// fields, each described by a `FieldKind`. Schemas are plain data, so adding
/// a tool never adds validation code; `ObjectSchema::validate` interprets any
/// schema against caller-supplied JSON.
///
/// Schemas render to JSON Schema (`to_json_schema`) for `tools/list`.

use serde_json::{Map, Value, json};

use crate::core::error::{FieldViolation, Problem};

/// Primitive or structured type of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    /// Any JSON number
    Number,
    /// JSON number without a fractional part
    Integer,
    Boolean,
    /// String restricted to the listed members
    Enum(Vec<String>),
    /// Nested object validated recursively
    Object(ObjectSchema),
}

impl FieldKind {
    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::Enum(_) => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Object(_) => "object",
        }
    }
}

/// A named field with its kind and whether callers must supply it.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub description: Option<String>,
    pub required: bool,
}

/// Schema for a JSON object argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<Field>,
    /// Reject keys that are not declared
    closed: bool,
}

impl Default for ObjectSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectSchema {
    /// Create an empty, open schema.
    pub fn new() -> Self {
        Self { fields: Vec::new(), closed: false }
    }

    /// Add a required field.
    pub fn required(self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.field(name, kind, description, true)
    }

    /// Add an optional field.
    pub fn optional(self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.field(name, kind, description, false)
    }

    /// Reject undeclared keys during validation.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    fn field(mut self, name: &str, kind: FieldKind, description: &str, required: bool) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            kind,
            description: (!description.is_empty()).then(|| description.to_string()),
            required,
        });
        self
    }

    /// Names of required fields, in declaration order.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|f| f.required).map(|f| f.name.as_str())
    }

    /// Check `value` against this schema, collecting every violation.
    ///
    /// No coercion is performed: `"1"` is not an integer and `1.0` is not a
    /// string.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();
        match value.as_object() {
            Some(object) => self.validate_object(object, "", &mut violations),
            None => violations.push(FieldViolation::new(
                "$",
                Problem::TypeMismatch {
                    expected: "object".to_string(),
                    actual: json_type_name(value).to_string(),
                },
            )),
        }
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    fn validate_object(&self, object: &Map<String, Value>, prefix: &str, out: &mut Vec<FieldViolation>) {
        for field in &self.fields {
            let path = join_path(prefix, &field.name);
            match object.get(&field.name) {
                // Optional fields may be explicitly null
                None | Some(Value::Null) if !field.required => {}
                None => out.push(FieldViolation::new(path, Problem::Missing)),
                Some(value) => check_kind(&field.kind, value, &path, out),
            }
        }

        if self.closed {
            for key in object.keys() {
                if !self.fields.iter().any(|f| &f.name == key) {
                    out.push(FieldViolation::new(join_path(prefix, key), Problem::Unexpected));
                }
            }
        }
    }

    /// Render as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut property = match &field.kind {
                FieldKind::Enum(members) => json!({ "type": "string", "enum": members }),
                FieldKind::Object(nested) => nested.to_json_schema(),
                kind => json!({ "type": kind.type_name() }),
            };
            if let (Some(description), Some(obj)) = (&field.description, property.as_object_mut()) {
                obj.insert("description".to_string(), Value::String(description.clone()));
            }
            properties.insert(field.name.clone(), property);
        }

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "required": self.required_names().collect::<Vec<_>>(),
        });
        if self.closed {
            schema["additionalProperties"] = Value::Bool(false);
        }
        schema
    }
}

fn check_kind(kind: &FieldKind, value: &Value, path: &str, out: &mut Vec<FieldViolation>) {
    let matches = match kind {
        FieldKind::String => value.is_string(),
        FieldKind::Number => value.is_number(),
        FieldKind::Integer => value.is_i64() || value.is_u64(),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Enum(members) => match value.as_str() {
            Some(s) if members.iter().any(|m| m == s) => true,
            Some(_) => {
                out.push(FieldViolation::new(path, Problem::NotAllowed { allowed: members.clone() }));
                return;
            }
            None => false,
        },
        FieldKind::Object(nested) => match value.as_object() {
            Some(object) => {
                nested.validate_object(object, path, out);
                return;
            }
            None => false,
        },
    };

    if !matches {
        out.push(FieldViolation::new(
            path,
            Problem::TypeMismatch {
                expected: kind.type_name().to_string(),
                actual: json_type_name(value).to_string(),
            },
        ));
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() { name.to_string() } else { format!("{}.{}", prefix, name) }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Declarative output shapes and the structural validator behind every step.
//!
//! An [`ExpectedShape`] is plain data: an ordered list of field descriptors.
//! The same description is rendered as a provider response schema (so the
//! model decodes toward it) and is used afterwards to check what came back.

use serde_json::{json, Map, Value};
use std::fmt;

/// Path reported when the decoded value itself is not an object.
pub const ROOT_PATH: &str = "$";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Integer,
    /// Exact, case-sensitive membership in the allowed set.
    Enum(Vec<String>),
    StringList,
    Sequence(ExpectedShape),
    Nested(ExpectedShape),
}

impl FieldKind {
    fn label(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Enum(_) => "enum string",
            FieldKind::StringList => "array of strings",
            FieldKind::Sequence(_) => "array of objects",
            FieldKind::Nested(_) => "object",
        }
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), ShapeViolation> {
        let wrong_kind = || ShapeViolation::wrong_kind(path, self.label());

        match self {
            FieldKind::String => value.as_str().map(|_| ()).ok_or_else(wrong_kind),
            FieldKind::Integer => {
                if value.as_i64().is_some() || value.as_u64().is_some() {
                    Ok(())
                } else {
                    Err(wrong_kind())
                }
            }
            FieldKind::Enum(allowed) => {
                let text = value.as_str().ok_or_else(wrong_kind)?;
                if allowed.iter().any(|a| a == text) {
                    Ok(())
                } else {
                    Err(ShapeViolation::new(
                        path,
                        ViolationReason::NotAllowed {
                            value: text.to_string(),
                        },
                    ))
                }
            }
            FieldKind::StringList => {
                let items = value.as_array().ok_or_else(wrong_kind)?;
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        return Err(ShapeViolation::wrong_kind(
                            &format!("{}[{}]", path, i),
                            "string",
                        ));
                    }
                }
                Ok(())
            }
            FieldKind::Sequence(shape) => {
                let items = value.as_array().ok_or_else(wrong_kind)?;
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    let object = item
                        .as_object()
                        .ok_or_else(|| ShapeViolation::wrong_kind(&item_path, "object"))?;
                    shape.validate_object(object, &item_path)?;
                }
                Ok(())
            }
            FieldKind::Nested(shape) => {
                let object = value.as_object().ok_or_else(wrong_kind)?;
                shape.validate_object(object, path)
            }
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            FieldKind::String => json!({ "type": "string" }),
            FieldKind::Integer => json!({ "type": "integer" }),
            FieldKind::Enum(allowed) => json!({ "type": "string", "enum": allowed }),
            FieldKind::StringList => json!({ "type": "array", "items": { "type": "string" } }),
            FieldKind::Sequence(shape) => json!({ "type": "array", "items": shape.to_json_schema() }),
            FieldKind::Nested(shape) => shape.to_json_schema(),
        }
    }

    fn gemini_schema(&self) -> Value {
        match self {
            FieldKind::String => json!({ "type": "STRING" }),
            FieldKind::Integer => json!({ "type": "INTEGER" }),
            FieldKind::Enum(allowed) => {
                json!({ "type": "STRING", "format": "enum", "enum": allowed })
            }
            FieldKind::StringList => json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
            FieldKind::Sequence(shape) => {
                json!({ "type": "ARRAY", "items": shape.to_gemini_schema() })
            }
            FieldKind::Nested(shape) => shape.to_gemini_schema(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldDescriptor {
    pub fn required(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
        }
    }
}

/// Ordered set of field descriptors a decoded result must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedShape {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl ExpectedShape {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn string(self, name: &str) -> Self {
        self.field(FieldDescriptor::required(name, FieldKind::String))
    }

    pub fn optional_string(self, name: &str) -> Self {
        self.field(FieldDescriptor::optional(name, FieldKind::String))
    }

    pub fn integer(self, name: &str) -> Self {
        self.field(FieldDescriptor::required(name, FieldKind::Integer))
    }

    pub fn enumeration(self, name: &str, allowed: &[&str]) -> Self {
        let allowed = allowed.iter().map(|a| a.to_string()).collect();
        self.field(FieldDescriptor::required(name, FieldKind::Enum(allowed)))
    }

    pub fn string_list(self, name: &str) -> Self {
        self.field(FieldDescriptor::required(name, FieldKind::StringList))
    }

    pub fn optional_string_list(self, name: &str) -> Self {
        self.field(FieldDescriptor::optional(name, FieldKind::StringList))
    }

    pub fn sequence(self, name: &str, item: ExpectedShape) -> Self {
        self.field(FieldDescriptor::required(name, FieldKind::Sequence(item)))
    }

    pub fn nested(self, name: &str, inner: ExpectedShape) -> Self {
        self.field(FieldDescriptor::required(name, FieldKind::Nested(inner)))
    }

    /// Check `value` against this shape.
    ///
    /// Fields are visited in declaration order and nested shapes depth-first,
    /// so the same malformed value always reports the same first violation.
    /// Optional fields may be absent or `null`; required fields may not.
    pub fn validate(&self, value: &Value) -> Result<(), ShapeViolation> {
        let object = value
            .as_object()
            .ok_or_else(|| ShapeViolation::new(ROOT_PATH, ViolationReason::NotAnObject))?;
        self.validate_object(object, "")
    }

    fn validate_object(&self, object: &Map<String, Value>, prefix: &str) -> Result<(), ShapeViolation> {
        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{}.{}", prefix, field.name)
            };

            match object.get(&field.name) {
                None | Some(Value::Null) if !field.required => continue,
                None => return Err(ShapeViolation::new(&path, ViolationReason::Missing)),
                Some(value) => field.kind.check(value, &path)?,
            }
        }
        Ok(())
    }

    /// JSON Schema suitable for strict structured-output modes.
    ///
    /// Strict mode wants every property listed as required, so optional
    /// fields are expressed as nullable instead.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let schema = field.kind.json_schema();
            let schema = if field.required {
                schema
            } else {
                json!({ "anyOf": [schema, { "type": "null" }] })
            };
            properties.insert(field.name.clone(), schema);
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.field_names(),
            "additionalProperties": false
        })
    }

    /// Gemini `responseSchema` (OpenAPI subset) for the same shape.
    pub fn to_gemini_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut schema = field.kind.gemini_schema();
            if !field.required {
                schema["nullable"] = Value::Bool(true);
            }
            properties.insert(field.name.clone(), schema);
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": required,
            "propertyOrdering": self.field_names()
        })
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViolationReason {
    Missing,
    WrongKind { expected: &'static str },
    NotAllowed { value: String },
    NotAnObject,
    /// Structurally valid but could not be converted into the step's output type.
    Undecodable(String),
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::Missing => write!(f, "required field is missing"),
            ViolationReason::WrongKind { expected } => write!(f, "expected {}", expected),
            ViolationReason::NotAllowed { value } => write!(f, "'{}' is not an allowed value", value),
            ViolationReason::NotAnObject => write!(f, "expected an object"),
            ViolationReason::Undecodable(msg) => write!(f, "could not decode: {}", msg),
        }
    }
}

/// First field that failed validation, addressed by its path
/// (`tagline`, `appetizers[2].price`, `colorPalette.primary`).
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeViolation {
    pub path: String,
    pub reason: ViolationReason,
}

impl ShapeViolation {
    pub fn new(path: &str, reason: ViolationReason) -> Self {
        Self {
            path: path.to_string(),
            reason,
        }
    }

    fn wrong_kind(path: &str, expected: &'static str) -> Self {
        Self::new(path, ViolationReason::WrongKind { expected })
    }
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.path, self.reason)
    }
}

//! # Class Schemas
//!
//! Precomputed shape of every configuration class: its fields, their
//! declared types, defaults, constraints and codec preferences. Built once
//! at startup and shared read-only by the decoder, encoder and binder.

use crate::descriptor::{ScalarType, TypeDescriptor};
use crate::validator::Constraint;
use crate::value::{ObjectValue, Value};

/// One declared field of a configuration class.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub ty: TypeDescriptor,
    pub default: Value,
    pub constraints: Vec<Constraint>,
    /// `Some(empty)` means "any registered codec".
    pub codecs: Option<Vec<String>>,
    pub comment: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        let default = default_value(&ty);
        Self {
            name: name.into(),
            ty,
            default,
            constraints: Vec::new(),
            codecs: None,
            comment: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn preferred_codecs<S: AsRef<str>>(mut self, codecs: &[S]) -> Self {
        self.codecs = Some(codecs.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Zero value for primitives, null for everything else.
pub fn default_value(ty: &TypeDescriptor) -> Value {
    match ty {
        TypeDescriptor::Primitive(s) => match s {
            ScalarType::Bool => Value::Bool(false),
            ScalarType::Char => Value::Char('\0'),
            ScalarType::Byte => Value::Byte(0),
            ScalarType::Short => Value::Short(0),
            ScalarType::Int => Value::Int(0),
            ScalarType::Long => Value::Long(0),
            ScalarType::Float => Value::Float(0.0),
            ScalarType::Double => Value::Double(0.0),
        },
        _ => Value::Null,
    }
}

/// A configuration class (or annotation type).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassSchema {
    pub name: String,
    pub parent: Option<String>,
    pub is_abstract: bool,
    pub key_prefix: Option<String>,
    pub fields: Vec<FieldSchema>,
}

impl ClassSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn own_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Enum type and its constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    pub name: String,
    pub constants: Vec<String>,
}

impl EnumSchema {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, constants: &[S]) -> Self {
        Self {
            name: name.into(),
            constants: constants.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    pub fn has_constant(&self, constant: &str) -> bool {
        self.constants.iter().any(|c| c == constant)
    }
}

/// Object populated with field defaults.
pub fn default_object(class: &str, fields: &[&FieldSchema]) -> ObjectValue {
    let mut object = ObjectValue::new(class);
    for field in fields {
        object.fields.insert(field.name.clone(), field.default.clone());
    }
    object
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_defaults() {
        let port = FieldSchema::new("port", TypeDescriptor::Primitive(ScalarType::Int));
        assert_eq!(port.default, Value::Int(0));
        let host = FieldSchema::new("host", TypeDescriptor::String).with_default("localhost");
        assert_eq!(host.default, Value::str("localhost"));
        let boxed = FieldSchema::new("retries", TypeDescriptor::Boxed(ScalarType::Int));
        assert_eq!(boxed.default, Value::Null);
    }

    #[test]
    fn test_class_builder() {
        let schema = ClassSchema::new("app.ServerConfig")
            .key_prefix("server")
            .field(FieldSchema::new("host", TypeDescriptor::String).comment("Bind address"));
        assert_eq!(schema.simple_name(), "ServerConfig");
        assert_eq!(schema.key_prefix.as_deref(), Some("server"));
        assert!(schema.own_field("host").is_some());
        assert!(schema.own_field("port").is_none());
    }

    #[test]
    fn test_enum_constants() {
        let color = EnumSchema::new("app.Color", &["RED", "GREEN"]);
        assert!(color.has_constant("RED"));
        assert!(!color.has_constant("BLUE"));
    }
}

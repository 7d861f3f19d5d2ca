//! # Values
//!
//! Dynamic typed values produced by the decoder and consumed by the encoder.

use crate::descriptor::{ScalarType, TypeDescriptor};
use indexmap::IndexMap;
use std::fmt;

/// Field values of an object or annotation record, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    pub class: String,
    pub fields: IndexMap<String, Value>,
}

impl ObjectValue {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// Arrays remember their element type, so `[array:int]` survives
    /// re-encoding into an `Object` slot.
    Array {
        element: TypeDescriptor,
        items: Vec<Value>,
    },
    List(Vec<Value>),
    /// Unordered; duplicates are removed on decode.
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Object(ObjectValue),
    Enum {
        class: String,
        constant: String,
    },
    Class(String),
    /// Annotation re-modeled as a tagged record.
    Annotation(ObjectValue),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn bytes(bytes: &[u8]) -> Self {
        Value::Array {
            element: TypeDescriptor::Primitive(ScalarType::Byte),
            items: bytes.iter().map(|b| Value::Byte(*b as i8)).collect(),
        }
    }

    pub fn enumeration(class: impl Into<String>, constant: impl Into<String>) -> Self {
        Value::Enum {
            class: class.into(),
            constant: constant.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Byte payload of a `byte[]` value.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Array { element, items }
                if *element == TypeDescriptor::Primitive(ScalarType::Byte)
                    || *element == TypeDescriptor::Boxed(ScalarType::Byte) =>
            {
                items
                    .iter()
                    .map(|v| match v {
                        Value::Byte(b) => Some(*b as u8),
                        _ => None,
                    })
                    .collect()
            }
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            Value::Char(c) => Some(i64::from(u32::from(*c))),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Element count of strings and containers.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Array { items, .. } => Some(items.len()),
            Value::List(items) | Value::Set(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Runtime type of the value, as seen from an `Object` slot.
    pub fn runtime_type(&self) -> TypeDescriptor {
        match self {
            Value::Null => TypeDescriptor::Any,
            Value::Bool(_) => TypeDescriptor::Boxed(ScalarType::Bool),
            Value::Char(_) => TypeDescriptor::Boxed(ScalarType::Char),
            Value::Byte(_) => TypeDescriptor::Boxed(ScalarType::Byte),
            Value::Short(_) => TypeDescriptor::Boxed(ScalarType::Short),
            Value::Int(_) => TypeDescriptor::Boxed(ScalarType::Int),
            Value::Long(_) => TypeDescriptor::Boxed(ScalarType::Long),
            Value::Float(_) => TypeDescriptor::Boxed(ScalarType::Float),
            Value::Double(_) => TypeDescriptor::Boxed(ScalarType::Double),
            Value::Str(_) => TypeDescriptor::String,
            Value::Array { element, .. } => TypeDescriptor::array(element.clone()),
            Value::List(_) => TypeDescriptor::list(TypeDescriptor::Any),
            Value::Set(_) => TypeDescriptor::set(TypeDescriptor::Any),
            Value::Map(_) => TypeDescriptor::map(TypeDescriptor::Any, TypeDescriptor::Any),
            Value::Object(o) => TypeDescriptor::Object(o.class.clone()),
            Value::Enum { class, .. } => TypeDescriptor::Enum(Some(class.clone())),
            Value::Class(_) => TypeDescriptor::Class,
            Value::Annotation(o) => TypeDescriptor::Annotation(Some(o.class.clone())),
        }
    }

    /// Converts to JSON so typed structs can be pulled out with `serde`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Char(c) => Json::String(c.to_string()),
            Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_) => {
                self.as_i64().map(Json::from).unwrap_or(Json::Null)
            }
            Value::Float(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Double(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.clone()),
            Value::Array { items, .. } | Value::List(items) | Value::Set(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => {
                if entries.iter().all(|(k, _)| k.is_key_like()) {
                    Json::Object(
                        entries
                            .iter()
                            .map(|(k, v)| (k.to_string(), v.to_json()))
                            .collect(),
                    )
                } else {
                    Json::Array(
                        entries
                            .iter()
                            .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                            .collect(),
                    )
                }
            }
            Value::Object(o) | Value::Annotation(o) => Json::Object(
                o.fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Enum { constant, .. } => Json::String(constant.clone()),
            Value::Class(name) => Json::String(name.clone()),
        }
    }

    fn is_key_like(&self) -> bool {
        matches!(
            self,
            Value::Str(_)
                | Value::Char(_)
                | Value::Byte(_)
                | Value::Short(_)
                | Value::Int(_)
                | Value::Long(_)
                | Value::Bool(_)
                | Value::Enum { .. }
                | Value::Class(_)
        )
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

fn write_fields(f: &mut fmt::Formatter<'_>, o: &ObjectValue) -> fmt::Result {
    write!(f, "{}{{", o.class)?;
    for (i, (name, value)) in o.fields.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}={}", name, value)?;
    }
    f.write_str("}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::Array { items, .. } | Value::List(items) | Value::Set(items) => {
                write_seq(f, items)
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Object(o) => write_fields(f, o),
            Value::Annotation(o) => {
                f.write_str("@")?;
                write_fields(f, o)
            }
            Value::Enum { constant, .. } => f.write_str(constant),
            Value::Class(name) => f.write_str(name),
        }
    }
}

//! # Type Descriptors
//!
//! Schema-level description of a binding site. The decoder and encoder work
//! only from these descriptors, never from the live value's shape alone.

use std::fmt;

/// Scalar value types. Primitive and boxed forms share a `ScalarType` and
/// differ only in whether `[null]` is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl ScalarType {
    pub fn primitive_name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "boolean",
            ScalarType::Char => "char",
            ScalarType::Byte => "byte",
            ScalarType::Short => "short",
            ScalarType::Int => "int",
            ScalarType::Long => "long",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    pub fn boxed_name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "Boolean",
            ScalarType::Char => "Character",
            ScalarType::Byte => "Byte",
            ScalarType::Short => "Short",
            ScalarType::Int => "Integer",
            ScalarType::Long => "Long",
            ScalarType::Float => "Float",
            ScalarType::Double => "Double",
        }
    }

    pub fn from_primitive_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => ScalarType::Bool,
            "char" => ScalarType::Char,
            "byte" => ScalarType::Byte,
            "short" => ScalarType::Short,
            "int" => ScalarType::Int,
            "long" => ScalarType::Long,
            "float" => ScalarType::Float,
            "double" => ScalarType::Double,
            _ => return None,
        })
    }

    pub fn from_boxed_name(name: &str) -> Option<Self> {
        Some(match name {
            "Boolean" => ScalarType::Bool,
            "Character" => ScalarType::Char,
            "Byte" => ScalarType::Byte,
            "Short" => ScalarType::Short,
            "Integer" => ScalarType::Int,
            "Long" => ScalarType::Long,
            "Float" => ScalarType::Float,
            "Double" => ScalarType::Double,
            _ => return None,
        })
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ScalarType::Bool | ScalarType::Char)
    }
}

/// Coarse shape of a binding site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Any,
    Scalar,
    String,
    Array,
    List,
    Set,
    Map,
    Object,
    Enum,
    Class,
    Annotation,
}

/// Declared type of a field, element, map key or map value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// `Object` or an interface: the runtime type must come from the value.
    Any,
    Primitive(ScalarType),
    Boxed(ScalarType),
    String,
    Array(Box<TypeDescriptor>),
    List(Box<TypeDescriptor>),
    Set(Box<TypeDescriptor>),
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    /// A registered class. Abstract classes are flagged in their schema.
    Object(String),
    /// `None` is the `Enum` base type.
    Enum(Option<String>),
    Class,
    /// `None` is the annotation base type.
    Annotation(Option<String>),
}

impl TypeDescriptor {
    pub fn array(element: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(element))
    }

    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(element))
    }

    pub fn set(element: TypeDescriptor) -> Self {
        TypeDescriptor::Set(Box::new(element))
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Map(Box::new(key), Box::new(value))
    }

    pub fn object(class: impl Into<String>) -> Self {
        TypeDescriptor::Object(class.into())
    }

    pub fn enumeration(class: impl Into<String>) -> Self {
        TypeDescriptor::Enum(Some(class.into()))
    }

    pub fn bytes() -> Self {
        TypeDescriptor::array(TypeDescriptor::Primitive(ScalarType::Byte))
    }

    pub fn kind(&self) -> Kind {
        match self {
            TypeDescriptor::Any => Kind::Any,
            TypeDescriptor::Primitive(_) | TypeDescriptor::Boxed(_) => Kind::Scalar,
            TypeDescriptor::String => Kind::String,
            TypeDescriptor::Array(_) => Kind::Array,
            TypeDescriptor::List(_) => Kind::List,
            TypeDescriptor::Set(_) => Kind::Set,
            TypeDescriptor::Map(..) => Kind::Map,
            TypeDescriptor::Object(_) => Kind::Object,
            TypeDescriptor::Enum(_) => Kind::Enum,
            TypeDescriptor::Class => Kind::Class,
            TypeDescriptor::Annotation(_) => Kind::Annotation,
        }
    }

    pub fn element_type(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Array(e) | TypeDescriptor::List(e) | TypeDescriptor::Set(e) => {
                Some(e)
            }
            _ => None,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeDescriptor::Any)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(_))
    }

    /// Scalars, strings, enums and classes: the values that fit on one line
    /// between separators.
    pub fn is_basic(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Primitive(_)
                | TypeDescriptor::Boxed(_)
                | TypeDescriptor::String
                | TypeDescriptor::Enum(Some(_))
                | TypeDescriptor::Class
        )
    }

    /// Name used inside tags, e.g. `Integer`, `int`, `app.Server`.
    pub fn tag_name(&self) -> String {
        match self {
            TypeDescriptor::Any => "Object".to_string(),
            TypeDescriptor::Primitive(s) => s.primitive_name().to_string(),
            TypeDescriptor::Boxed(s) => s.boxed_name().to_string(),
            TypeDescriptor::String => "String".to_string(),
            TypeDescriptor::Array(e) => format!("[array:{}]", e.tag_name()),
            TypeDescriptor::List(e) if e.is_any() => "list".to_string(),
            TypeDescriptor::List(e) => format!("[list:{}]", e.tag_name()),
            TypeDescriptor::Set(e) if e.is_any() => "set".to_string(),
            TypeDescriptor::Set(e) => format!("[set:{}]", e.tag_name()),
            TypeDescriptor::Map(k, v) if k.is_any() && v.is_any() => "map".to_string(),
            TypeDescriptor::Map(k, v) => format!("[map:{},{}]", k.tag_name(), v.tag_name()),
            TypeDescriptor::Object(name) => name.clone(),
            TypeDescriptor::Enum(Some(name)) => name.clone(),
            TypeDescriptor::Enum(None) => "Enum".to_string(),
            TypeDescriptor::Class => "Class".to_string(),
            TypeDescriptor::Annotation(Some(name)) => name.clone(),
            TypeDescriptor::Annotation(None) => "annotation".to_string(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag_name())
    }
}

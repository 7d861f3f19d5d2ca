//! # Registry
//!
//! The explicit registry passed into the decoder and encoder: class, enum
//! and annotation schemas, the known simple type names, and the codecs.

use crate::codec::CodecRegistry;
use crate::descriptor::{ScalarType, TypeDescriptor};
use crate::schema::{ClassSchema, EnumSchema, FieldSchema, default_object};
use crate::value::ObjectValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Schemas known to the process, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    classes: HashMap<String, Arc<ClassSchema>>,
    annotations: HashMap<String, Arc<ClassSchema>>,
    enums: HashMap<String, Arc<EnumSchema>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class(&mut self, schema: ClassSchema) -> Arc<ClassSchema> {
        let schema = Arc::new(schema);
        self.classes.insert(schema.name.clone(), Arc::clone(&schema));
        schema
    }

    pub fn register_annotation(&mut self, schema: ClassSchema) -> Arc<ClassSchema> {
        let schema = Arc::new(schema);
        self.annotations
            .insert(schema.name.clone(), Arc::clone(&schema));
        schema
    }

    pub fn register_enum(&mut self, schema: EnumSchema) -> Arc<EnumSchema> {
        let schema = Arc::new(schema);
        self.enums.insert(schema.name.clone(), Arc::clone(&schema));
        schema
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ClassSchema>> {
        self.classes.get(name)
    }

    pub fn annotation(&self, name: &str) -> Option<&Arc<ClassSchema>> {
        self.annotations.get(name)
    }

    pub fn enum_schema(&self, name: &str) -> Option<&Arc<EnumSchema>> {
        self.enums.get(name)
    }

    /// Fields of a class including inherited ones, parents first.
    pub fn fields_of(&self, class: &str) -> Vec<&FieldSchema> {
        let mut chain = Vec::new();
        let mut current = self.classes.get(class).or_else(|| self.annotations.get(class));
        while let Some(schema) = current {
            if chain.iter().any(|s: &&Arc<ClassSchema>| s.name == schema.name) {
                break;
            }
            chain.push(schema);
            current = schema.parent.as_deref().and_then(|p| self.classes.get(p));
        }
        chain
            .into_iter()
            .rev()
            .flat_map(|schema| schema.fields.iter())
            .collect()
    }

    pub fn field_of(&self, class: &str, field: &str) -> Option<&FieldSchema> {
        self.fields_of(class).into_iter().find(|f| f.name == field)
    }

    pub fn default_object(&self, class: &str) -> ObjectValue {
        default_object(class, &self.fields_of(class))
    }

    /// Resolves a simple type name or a registered qualified name.
    pub fn resolve_type_name(&self, name: &str) -> Option<TypeDescriptor> {
        let name = name.trim();
        if let Some(known) = simple_type(name) {
            return Some(known);
        }
        if self.classes.contains_key(name) {
            return Some(TypeDescriptor::Object(name.to_string()));
        }
        if self.enums.contains_key(name) {
            return Some(TypeDescriptor::Enum(Some(name.to_string())));
        }
        if self.annotations.contains_key(name) {
            return Some(TypeDescriptor::Annotation(Some(name.to_string())));
        }
        None
    }

    /// Whether `name` is a loadable class, enum or annotation.
    pub fn has_type(&self, name: &str) -> bool {
        self.classes.contains_key(name)
            || self.enums.contains_key(name)
            || self.annotations.contains_key(name)
            || simple_type(name).is_some()
    }

    /// False when the declared type gives no concrete runtime class:
    /// `Object`, abstract classes, and the enum and annotation base types.
    pub fn is_concrete(&self, ty: &TypeDescriptor) -> bool {
        match ty {
            TypeDescriptor::Any | TypeDescriptor::Enum(None) | TypeDescriptor::Annotation(None) => {
                false
            }
            TypeDescriptor::Object(name) => self.classes.get(name).is_none_or(|c| !c.is_abstract),
            _ => true,
        }
    }

    /// `isAssignableFrom`: can a `sub` value live in a `sup` slot?
    pub fn is_assignable(&self, sup: &TypeDescriptor, sub: &TypeDescriptor) -> bool {
        if sup == sub || sup.is_any() {
            return true;
        }
        match (sup, sub) {
            (TypeDescriptor::Object(sup_name), TypeDescriptor::Object(sub_name)) => {
                let mut current = self.classes.get(sub_name);
                let mut hops = 0;
                while let Some(schema) = current {
                    if schema.name == *sup_name {
                        return true;
                    }
                    hops += 1;
                    if hops > 64 {
                        break;
                    }
                    current = schema.parent.as_deref().and_then(|p| self.classes.get(p));
                }
                false
            }
            (TypeDescriptor::Enum(None), TypeDescriptor::Enum(Some(_))) => true,
            (TypeDescriptor::Annotation(None), TypeDescriptor::Annotation(Some(_))) => true,
            (TypeDescriptor::Primitive(a), TypeDescriptor::Boxed(b))
            | (TypeDescriptor::Boxed(a), TypeDescriptor::Primitive(b)) => a == b,
            (TypeDescriptor::Array(a), TypeDescriptor::Array(b)) => self.is_assignable(a, b),
            (TypeDescriptor::List(_), TypeDescriptor::List(_))
            | (TypeDescriptor::Set(_), TypeDescriptor::Set(_))
            | (TypeDescriptor::Map(..), TypeDescriptor::Map(..)) => true,
            _ => false,
        }
    }
}

/// The known simple type names.
pub fn simple_type(name: &str) -> Option<TypeDescriptor> {
    if let Some(s) = ScalarType::from_boxed_name(name) {
        return Some(TypeDescriptor::Boxed(s));
    }
    if let Some(s) = ScalarType::from_primitive_name(name) {
        return Some(TypeDescriptor::Primitive(s));
    }
    Some(match name {
        "String" | "string" => TypeDescriptor::String,
        "Class" | "class" => TypeDescriptor::Class,
        "List" | "list" => TypeDescriptor::list(TypeDescriptor::Any),
        "Set" | "set" => TypeDescriptor::set(TypeDescriptor::Any),
        "Map" | "map" => TypeDescriptor::map(TypeDescriptor::Any, TypeDescriptor::Any),
        "Object" => TypeDescriptor::Any,
        _ => return None,
    })
}

/// Type schemas and codecs, shared by decoder and encoder.
#[derive(Debug, Default)]
pub struct Registry {
    pub types: TypeRegistry,
    pub codecs: CodecRegistry,
}

impl Registry {
    pub fn new(types: TypeRegistry, codecs: CodecRegistry) -> Self {
        Self { types, codecs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animals() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.register_class(
            ClassSchema::new("app.Animal")
                .abstract_class()
                .field(FieldSchema::new("name", TypeDescriptor::String)),
        );
        types.register_class(
            ClassSchema::new("app.Dog")
                .extends("app.Animal")
                .field(FieldSchema::new("good", TypeDescriptor::Primitive(ScalarType::Bool))),
        );
        types.register_class(ClassSchema::new("app.Cat").extends("app.Animal"));
        types
    }

    #[test]
    fn test_inherited_fields() {
        let types = animals();
        let names: Vec<_> = types.fields_of("app.Dog").iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["name", "good"]);
    }

    #[test]
    fn test_is_assignable() {
        let types = animals();
        let animal = TypeDescriptor::object("app.Animal");
        let dog = TypeDescriptor::object("app.Dog");
        let cat = TypeDescriptor::object("app.Cat");
        assert!(types.is_assignable(&animal, &dog));
        assert!(!types.is_assignable(&dog, &animal));
        assert!(!types.is_assignable(&dog, &cat));
        assert!(types.is_assignable(&TypeDescriptor::Any, &cat));
    }

    #[test]
    fn test_is_concrete() {
        let types = animals();
        assert!(!types.is_concrete(&TypeDescriptor::Any));
        assert!(!types.is_concrete(&TypeDescriptor::object("app.Animal")));
        assert!(types.is_concrete(&TypeDescriptor::object("app.Dog")));
        assert!(types.is_concrete(&TypeDescriptor::list(TypeDescriptor::Any)));
    }

    #[test]
    fn test_resolve_type_name() {
        let types = animals();
        assert_eq!(
            types.resolve_type_name("Integer"),
            Some(TypeDescriptor::Boxed(ScalarType::Int))
        );
        assert_eq!(
            types.resolve_type_name("int"),
            Some(TypeDescriptor::Primitive(ScalarType::Int))
        );
        assert_eq!(
            types.resolve_type_name("app.Dog"),
            Some(TypeDescriptor::object("app.Dog"))
        );
        assert_eq!(types.resolve_type_name("app.Missing"), None);
    }
}

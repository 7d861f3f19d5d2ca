//! # Type Recognition
//!
//! Infers the concrete type of a raw value when the declared type is
//! `Object`, abstract, or an enum/annotation base type. Dispatch order:
//! the tag vocabulary first, then codec names, then type names. A codec
//! name therefore wins over a class of the same name.

use crate::descriptor::TypeDescriptor;
use crate::registry::Registry;
use crate::tag::{self, Tag, parse_tag};
use hotconf_errors::BindingError;

pub struct TypeRecognizer<'a> {
    registry: &'a Registry,
}

impl<'a> TypeRecognizer<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Returns the concrete type for `raw` bound at a `declared` site.
    pub fn recognize(
        &self,
        path: &str,
        raw: &str,
        declared: &TypeDescriptor,
    ) -> Result<TypeDescriptor, BindingError> {
        let types = &self.registry.types;
        if types.is_concrete(declared) {
            // A concrete class slot still honors an explicit subclass tag.
            return match (declared, parse_tag(raw)) {
                (
                    TypeDescriptor::Object(_),
                    Some(
                        explicit @ Tag {
                            name: tag::OBJECT,
                            payload: Some(_),
                        },
                    ),
                )
                | (
                    TypeDescriptor::Annotation(Some(_)),
                    Some(
                        explicit @ Tag {
                            name: tag::ANNOTATION,
                            payload: Some(_),
                        },
                    ),
                ) => {
                    let recognized = self.recognize_tag(path, &explicit, declared)?;
                    self.assignable(path, declared, recognized)
                }
                _ => Ok(declared.clone()),
            };
        }
        let recognized = match parse_tag(raw) {
            None => match declared {
                TypeDescriptor::Enum(None) => self.qualified_enum_type(path, raw.trim())?,
                _ => TypeDescriptor::String,
            },
            Some(tag) if tag.is_empty() => TypeDescriptor::String,
            Some(tag) if tag.is_null() => return Ok(declared.clone()),
            Some(tag) => self.recognize_tag(path, &tag, declared)?,
        };
        self.assignable(path, declared, recognized)
    }

    fn assignable(
        &self,
        path: &str,
        declared: &TypeDescriptor,
        recognized: TypeDescriptor,
    ) -> Result<TypeDescriptor, BindingError> {
        if self.registry.types.is_assignable(declared, &recognized) {
            Ok(recognized)
        } else {
            Err(BindingError::ShapeMismatch {
                path: path.to_string(),
                expected: declared.tag_name(),
                found: recognized.tag_name(),
            })
        }
    }

    fn recognize_tag(
        &self,
        path: &str,
        tag: &Tag<'_>,
        declared: &TypeDescriptor,
    ) -> Result<TypeDescriptor, BindingError> {
        match (tag.name, tag.payload) {
            (tag::ARRAY, None) => Ok(TypeDescriptor::array(TypeDescriptor::Any)),
            (tag::ARRAY, Some(payload)) => {
                Ok(TypeDescriptor::array(self.resolve_type_name(path, payload)?))
            }
            (tag::LIST, payload) => Ok(TypeDescriptor::list(self.optional_type(path, payload)?)),
            (tag::SET, payload) => Ok(TypeDescriptor::set(self.optional_type(path, payload)?)),
            (tag::MAP, None) => Ok(TypeDescriptor::map(TypeDescriptor::Any, TypeDescriptor::Any)),
            (tag::MAP, Some(payload)) => self.map_type(path, payload),
            (tag::OBJECT, Some(payload)) => match self.resolve_type_name(path, payload)? {
                object @ TypeDescriptor::Object(_) => Ok(object),
                other => Err(BindingError::ShapeMismatch {
                    path: path.to_string(),
                    expected: "object".to_string(),
                    found: other.tag_name(),
                }),
            },
            (tag::ANNOTATION, Some(payload)) => {
                let name = payload.trim();
                match self.registry.types.annotation(name) {
                    Some(_) => Ok(TypeDescriptor::Annotation(Some(name.to_string()))),
                    None => Err(unresolvable(path, name)),
                }
            }
            (tag::OBJECT | tag::ANNOTATION | "", None) => Err(BindingError::UnresolvableType {
                path: path.to_string(),
                name: format!("{} (no concrete type for {})", tag, declared.tag_name()),
            }),
            (tag::ENUM, Some(payload)) => self.qualified_enum_type(path, payload.trim()),
            (name, _) => {
                if let Some(value_type) = self.registry.codecs.value_type(name) {
                    return Ok(value_type);
                }
                self.resolve_type_name(path, name)
            }
        }
    }

    /// Resolves a type written inside a tag payload: a simple name, a
    /// registered class, enum or annotation, or a nested container tag such
    /// as `[array:int]` or `[map:String,Integer]`.
    pub fn resolve_type_name(
        &self,
        path: &str,
        name: &str,
    ) -> Result<TypeDescriptor, BindingError> {
        let name = name.trim();
        if let Some(nested) = parse_tag(name) {
            return match (nested.name, nested.payload) {
                (tag::ARRAY, payload) => {
                    Ok(TypeDescriptor::array(self.optional_type(path, payload)?))
                }
                (tag::LIST, payload) => Ok(TypeDescriptor::list(self.optional_type(path, payload)?)),
                (tag::SET, payload) => Ok(TypeDescriptor::set(self.optional_type(path, payload)?)),
                (tag::MAP, None) => {
                    Ok(TypeDescriptor::map(TypeDescriptor::Any, TypeDescriptor::Any))
                }
                (tag::MAP, Some(payload)) => self.map_type(path, payload),
                (tag::OBJECT, Some(payload)) => self.resolve_type_name(path, payload),
                _ => Err(BindingError::MalformedTag {
                    path: path.to_string(),
                    raw: name.to_string(),
                }),
            };
        }
        self.registry
            .types
            .resolve_type_name(name)
            .ok_or_else(|| unresolvable(path, name))
    }

    fn optional_type(
        &self,
        path: &str,
        payload: Option<&str>,
    ) -> Result<TypeDescriptor, BindingError> {
        match payload {
            Some(p) if !p.trim().is_empty() => self.resolve_type_name(path, p),
            _ => Ok(TypeDescriptor::Any),
        }
    }

    fn map_type(&self, path: &str, payload: &str) -> Result<TypeDescriptor, BindingError> {
        match tag::split_type_pair(payload) {
            Some((key, value)) => Ok(TypeDescriptor::map(
                self.optional_type(path, Some(key))?,
                self.optional_type(path, Some(value))?,
            )),
            None => Err(BindingError::MalformedTag {
                path: path.to_string(),
                raw: format!("[map:{}]", payload),
            }),
        }
    }

    /// `app.Color.RED` names the enum `app.Color`.
    fn qualified_enum_type(&self, path: &str, text: &str) -> Result<TypeDescriptor, BindingError> {
        let (class, _) = text
            .rsplit_once('.')
            .ok_or_else(|| unresolvable(path, text))?;
        match self.registry.types.enum_schema(class) {
            Some(_) => Ok(TypeDescriptor::Enum(Some(class.to_string()))),
            None => Err(unresolvable(path, class)),
        }
    }
}

fn unresolvable(path: &str, name: &str) -> BindingError {
    BindingError::UnresolvableType {
        path: path.to_string(),
        name: name.to_string(),
    }
}

//! # Encoder
//!
//! Typed values back to flat `(path, raw)` pairs. The first pair of every
//! [`Encoder::encode`] result is the value's own line; expanded containers
//! follow with their children in order.

use crate::compact::{common_type, is_compact, is_compact_text};
use crate::decoder::{DEFAULT_MAX_MAP_SEARCH_DEPTH, MAX_MAP_SEARCH_DEPTH_LIMIT};
use crate::descriptor::TypeDescriptor;
use crate::registry::Registry;
use crate::schema::FieldSchema;
use crate::settings::GeneratorOptions;
use crate::tag::{self, render_parts};
use crate::value::{ObjectValue, Value};
use std::cmp::Ordering;
use std::mem::discriminant;

pub struct Encoder<'a> {
    registry: &'a Registry,
    options: &'a GeneratorOptions,
    max_map_search_depth: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(registry: &'a Registry, options: &'a GeneratorOptions) -> Self {
        Self {
            registry,
            options,
            max_map_search_depth: DEFAULT_MAX_MAP_SEARCH_DEPTH,
        }
    }

    /// Map keys with this many dots or more are written in the entries
    /// form, since the decoder stops its direct-key search there.
    pub fn with_max_map_search_depth(mut self, depth: usize) -> Self {
        self.max_map_search_depth = depth.clamp(1, MAX_MAP_SEARCH_DEPTH_LIMIT);
        self
    }

    pub fn encode_field(&self, path: &str, field: &FieldSchema, value: &Value) -> Vec<(String, String)> {
        self.encode(path, value, &field.ty, field.codecs.as_deref())
    }

    /// Encodes `value` declared as `declared`. `codecs` is the field's codec
    /// preference; `Some(&[])` accepts any registered codec.
    pub fn encode(
        &self,
        path: &str,
        value: &Value,
        declared: &TypeDescriptor,
        codecs: Option<&[String]>,
    ) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.encode_into(path, value, declared, codecs, &mut out);
        out
    }

    /// True when the declared type alone does not tell the decoder what to
    /// build: an unresolved declared type, or a subclass in a class slot.
    pub fn needs_type_tag(&self, declared: &TypeDescriptor, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        if !self.registry.types.is_concrete(declared) {
            return true;
        }
        match (declared, value) {
            (TypeDescriptor::Object(class), Value::Object(object)) => object.class != *class,
            _ => false,
        }
    }

    fn encode_into(
        &self,
        path: &str,
        value: &Value,
        declared: &TypeDescriptor,
        codecs: Option<&[String]>,
        out: &mut Vec<(String, String)>,
    ) {
        if let Some(encoded) = self.codec_text(value, codecs) {
            out.push((path.to_string(), encoded));
            return;
        }
        match value {
            Value::Array { items, .. } | Value::List(items) | Value::Set(items) => {
                self.encode_collection(path, value, items, declared, codecs, out)
            }
            Value::Map(entries) => self.encode_map(path, value, entries, declared, codecs, out),
            Value::Object(object) => self.encode_object(path, value, object, declared, false, out),
            Value::Annotation(object) => {
                self.encode_object(path, value, object, declared, true, out)
            }
            _ => out.push((path.to_string(), self.leaf_text(value, declared, codecs))),
        }
    }

    fn codec_text(&self, value: &Value, codecs: Option<&[String]>) -> Option<String> {
        let preferred = codecs?;
        if value.is_null() {
            return None;
        }
        let preferred = if preferred.is_empty() {
            self.options.preferred_codec_orders.as_slice()
        } else {
            preferred
        };
        self.registry
            .codecs
            .encode_preferred(preferred, value)
            .map(|(name, encoded)| render_parts(&name, Some(&encoded)))
    }

    /// One-line rendering of a scalar, string, enum or class value.
    fn leaf_text(&self, value: &Value, declared: &TypeDescriptor, codecs: Option<&[String]>) -> String {
        if let Some(encoded) = self.codec_text(value, codecs) {
            return encoded;
        }
        let tagged = self.needs_type_tag(declared, value);
        let literal = |text: String| {
            if tagged {
                render_parts(&value.runtime_type().tag_name(), Some(&text))
            } else {
                text
            }
        };
        match value {
            Value::Null => tag::NULL_TAG.to_string(),
            Value::Str(s) if s.is_empty() => tag::EMPTY_TAG.to_string(),
            Value::Str(s) if tag::is_tag(s) => render_parts("String", Some(s)),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => literal(b.to_string()),
            Value::Char(c) => literal(char_text(*c)),
            Value::Byte(v) => literal(v.to_string()),
            Value::Short(v) => literal(v.to_string()),
            Value::Int(v) => literal(v.to_string()),
            Value::Long(v) => literal(v.to_string()),
            Value::Float(v) => literal(v.to_string()),
            Value::Double(v) => literal(v.to_string()),
            Value::Enum { class, constant } => match declared {
                TypeDescriptor::Enum(None) => format!("{}.{}", class, constant),
                _ if tagged => render_parts(tag::ENUM, Some(&format!("{}.{}", class, constant))),
                _ => constant.clone(),
            },
            Value::Class(name) if tagged => render_parts("Class", Some(name)),
            Value::Class(name) => name.clone(),
            other => other.to_string(),
        }
    }

    fn encode_collection(
        &self,
        path: &str,
        value: &Value,
        items: &[Value],
        declared: &TypeDescriptor,
        codecs: Option<&[String]>,
        out: &mut Vec<(String, String)>,
    ) {
        let (header, readable) = match value {
            Value::Array { .. } => (tag::ARRAY, self.options.readable_array_format),
            Value::Set(_) => (tag::SET, self.options.readable_set_format),
            _ => (tag::LIST, self.options.readable_list_format),
        };
        let tagged = self.needs_type_tag(declared, value);
        if items.is_empty() {
            // `[empty]` reads as a string where the declared type is open.
            let raw = match value {
                _ if !tagged => tag::EMPTY_TAG.to_string(),
                Value::Array { element, .. } if !element.is_any() => {
                    render_parts(header, Some(&element.tag_name()))
                }
                _ => render_parts(header, None),
            };
            out.push((path.to_string(), raw));
            return;
        }
        let declared_element = match (declared.element_type(), value) {
            (Some(element), _) => element.clone(),
            (None, Value::Array { element, .. }) => element.clone(),
            (None, _) => TypeDescriptor::Any,
        };

        let summarized = if self.options.summarize_collection_type
            && !self.registry.types.is_concrete(&declared_element)
        {
            common_type(&self.registry.types, items)
        } else {
            None
        };

        // A single line has no room for the summarized element tag.
        if !readable && !tagged && summarized.is_none() && is_compact(value, false) {
            let texts: Vec<String> = items
                .iter()
                .map(|item| self.leaf_text(item, &declared_element, codecs))
                .collect();
            if let Some(line) = self.compact_line(texts.iter().map(|t| (None, t.as_str()))) {
                out.push((path.to_string(), line));
                return;
            }
        }

        let payload = match (&summarized, value) {
            (Some(common), _) => Some(common.tag_name()),
            (None, Value::Array { element, .. }) if tagged && !element.is_any() => {
                Some(element.tag_name())
            }
            _ => None,
        };
        out.push((path.to_string(), render_parts(header, payload.as_deref())));

        let child_type = summarized.unwrap_or(declared_element);
        let start = self.options.starting_index;
        let width = index_width(items.len(), start);
        for (i, item) in items.iter().enumerate() {
            let child = format!("{}.{:0width$}", path, i + start, width = width);
            self.encode_into(&child, item, &child_type, codecs, out);
        }
    }

    fn encode_map(
        &self,
        path: &str,
        value: &Value,
        entries: &[(Value, Value)],
        declared: &TypeDescriptor,
        codecs: Option<&[String]>,
        out: &mut Vec<(String, String)>,
    ) {
        let tagged = self.needs_type_tag(declared, value);
        if entries.is_empty() {
            let raw = if tagged { tag::MAP } else { tag::EMPTY };
            out.push((path.to_string(), render_parts(raw, None)));
            return;
        }
        let (declared_key, declared_value) = match declared {
            TypeDescriptor::Map(k, v) => (k.as_ref().clone(), v.as_ref().clone()),
            _ => (TypeDescriptor::Any, TypeDescriptor::Any),
        };
        let mut entries: Vec<&(Value, Value)> = entries.iter().collect();
        if self.options.sorted_map_format && keys_comparable(&entries) {
            entries.sort_by(|a, b| compare_keys(&a.0, &b.0));
        }

        let summarize = self.options.summarize_collection_type;
        let summarized_key = if summarize && !self.registry.types.is_concrete(&declared_key) {
            common_type(&self.registry.types, entries.iter().map(|(k, _)| k))
        } else {
            None
        };
        let summarized_value = if summarize && !self.registry.types.is_concrete(&declared_value) {
            common_type(&self.registry.types, entries.iter().map(|(_, v)| v))
        } else {
            None
        };

        if !self.options.readable_map_format
            && !tagged
            && summarized_key.is_none()
            && summarized_value.is_none()
            && is_compact(value, false)
        {
            let texts: Vec<(String, String)> = entries
                .iter()
                .map(|(k, v)| {
                    (
                        self.leaf_text(k, &declared_key, None),
                        self.leaf_text(v, &declared_value, codecs),
                    )
                })
                .collect();
            let line = self.compact_line(texts.iter().map(|(k, v)| (Some(k.as_str()), v.as_str())));
            if let Some(line) = line {
                out.push((path.to_string(), line));
                return;
            }
        }

        let key_type = summarized_key.clone().unwrap_or(declared_key);
        let value_type = summarized_value.clone().unwrap_or(declared_value);
        let announce = tagged || summarized_key.is_some() || summarized_value.is_some();
        let payload = (announce && !(key_type.is_any() && value_type.is_any()))
            .then(|| format!("{},{}", key_type.tag_name(), value_type.tag_name()));
        out.push((path.to_string(), render_parts(tag::MAP, payload.as_deref())));

        if self.options.prefer_key_value_map_format
            && direct_keys_allowed(&entries, self.max_map_search_depth)
        {
            for (k, v) in &entries {
                let child = format!("{}.{}", path, k.as_str().unwrap_or_default());
                self.encode_into(&child, v, &value_type, codecs, out);
            }
            return;
        }
        let start = self.options.starting_index;
        let width = index_width(entries.len(), start);
        for (i, (k, v)) in entries.iter().enumerate() {
            let entry = format!("{}.{:0width$}", path, i + start, width = width);
            out.push((entry.clone(), "[]".to_string()));
            self.encode_into(&format!("{}.key", entry), k, &key_type, None, out);
            self.encode_into(&format!("{}.value", entry), v, &value_type, codecs, out);
        }
    }

    fn encode_object(
        &self,
        path: &str,
        value: &Value,
        object: &ObjectValue,
        declared: &TypeDescriptor,
        annotation: bool,
        out: &mut Vec<(String, String)>,
    ) {
        let types = &self.registry.types;
        let registered = if annotation {
            types.annotation(&object.class).is_some()
        } else {
            types.class(&object.class).is_some()
        };
        let fields: Vec<(&str, TypeDescriptor, Option<&[String]>, &Value)> = if registered {
            types
                .fields_of(&object.class)
                .into_iter()
                .filter_map(|f| {
                    object
                        .get(&f.name)
                        .map(|v| (f.name.as_str(), f.ty.clone(), f.codecs.as_deref(), v))
                })
                .collect()
        } else {
            object
                .fields
                .iter()
                .map(|(name, v)| (name.as_str(), TypeDescriptor::Any, None, v))
                .collect()
        };
        let tagged = self.needs_type_tag(declared, value);

        if !annotation && !self.options.readable_object_format && !tagged && is_compact(value, false)
        {
            let texts: Vec<(&str, String)> = fields
                .iter()
                .map(|(name, ty, codecs, v)| (*name, self.leaf_text(v, ty, *codecs)))
                .collect();
            if let Some(line) = self.compact_line(texts.iter().map(|(n, t)| (Some(*n), t.as_str())))
            {
                out.push((path.to_string(), line));
                return;
            }
        }

        let header = if annotation { tag::ANNOTATION } else { tag::OBJECT };
        let payload = tagged.then_some(object.class.as_str());
        out.push((path.to_string(), render_parts(header, payload)));
        for (name, ty, codecs, v) in &fields {
            self.encode_into(&format!("{}.{}", path, name), v, ty, *codecs, out);
        }
    }

    /// Joins leaves into `a;b` or `k>v;k>v`. `None` when a leaf is not
    /// single-line safe, the line is too long, or it would read as a tag.
    fn compact_line<'t>(&self, parts: impl Iterator<Item = (Option<&'t str>, &'t str)>) -> Option<String> {
        let mut items = Vec::new();
        for (key, text) in parts {
            if !is_compact_text(text, false) {
                return None;
            }
            match key {
                Some(key) if !is_compact_text(key, true) => return None,
                Some(key) => items.push(format!("{}>{}", key, text)),
                None => items.push(text.to_string()),
            }
        }
        let line = items.join(";");
        (line.len() <= self.options.compact_max_length && !tag::is_tag(&line)).then_some(line)
    }
}

fn char_text(c: char) -> String {
    if c.is_ascii_graphic() || c == ' ' {
        format!("'{}'", c)
    } else {
        format!("0x{:X}", u32::from(c))
    }
}

fn index_width(len: usize, start: usize) -> usize {
    (len.saturating_sub(1) + start).to_string().len()
}

/// Keys of one sortable family: strings, integers, floats, booleans,
/// characters, or constants of one enum.
fn keys_comparable(entries: &[&(Value, Value)]) -> bool {
    let Some((first, _)) = entries.first() else {
        return true;
    };
    let sortable = matches!(
        first,
        Value::Str(_)
            | Value::Bool(_)
            | Value::Char(_)
            | Value::Byte(_)
            | Value::Short(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Float(_)
            | Value::Double(_)
            | Value::Enum { .. }
    );
    sortable
        && entries.iter().all(|(k, _)| match (first, k) {
            (Value::Enum { class: a, .. }, Value::Enum { class: b, .. }) => a == b,
            _ => discriminant(first) == discriminant(k),
        })
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Char(x), Value::Char(y)) => x.cmp(y),
        (Value::Enum { constant: x, .. }, Value::Enum { constant: y, .. }) => x.cmp(y),
        _ => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a
                .as_f64()
                .zip(b.as_f64())
                .and_then(|(x, y)| x.partial_cmp(&y))
                .unwrap_or(Ordering::Equal),
        },
    }
}

/// Direct `path.key=value` form needs string keys that survive as property
/// path segments, at least one non-numeric first segment so the decoder does
/// not take the entries form, no key nested under another, and fewer dots
/// per key than the decoder's search depth.
fn direct_keys_allowed(entries: &[&(Value, Value)], max_depth: usize) -> bool {
    let mut keys = Vec::with_capacity(entries.len());
    for (k, _) in entries {
        match k {
            Value::Str(s) if is_prefixed_name(s, max_depth) => keys.push(s.as_str()),
            _ => return false,
        }
    }
    let any_named = keys.iter().any(|k| {
        let first = k.split('.').next().unwrap_or_default();
        !first.bytes().all(|b| b.is_ascii_digit())
    });
    let nested = keys.iter().any(|outer| {
        keys.iter()
            .any(|inner| inner.len() > outer.len() && inner.starts_with(outer) && inner[outer.len()..].starts_with('.'))
    });
    any_named && !nested
}

fn is_prefixed_name(key: &str, max_depth: usize) -> bool {
    !key.is_empty()
        && key.matches('.').count() < max_depth
        && key.split('.').all(|segment| !segment.is_empty())
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '$'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecRegistry, KeyRing};
    use crate::descriptor::ScalarType;
    use crate::registry::TypeRegistry;
    use crate::schema::{ClassSchema, EnumSchema};
    use std::sync::Arc;

    fn registry() -> Registry {
        let mut types = TypeRegistry::new();
        types.register_class(
            ClassSchema::new("app.Endpoint")
                .field(FieldSchema::new("host", TypeDescriptor::String))
                .field(FieldSchema::new("port", TypeDescriptor::Primitive(ScalarType::Int))),
        );
        types.register_class(ClassSchema::new("app.Animal").abstract_class());
        types.register_class(
            ClassSchema::new("app.Dog")
                .extends("app.Animal")
                .field(FieldSchema::new("name", TypeDescriptor::String)),
        );
        types.register_enum(EnumSchema::new("app.Color", &["RED", "GREEN"]));
        let keys = KeyRing::from_hex("00112233445566778899aabbccddeeff", None, None).unwrap();
        Registry::new(types, CodecRegistry::with_defaults(Arc::new(keys)))
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn string_int_map() -> Value {
        Value::Map(vec![
            (Value::str("b"), Value::Int(2)),
            (Value::str("a"), Value::Int(1)),
        ])
    }

    #[test]
    fn test_scalars_and_strings() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let encoder = Encoder::new(&registry, &options);
        let int = TypeDescriptor::Primitive(ScalarType::Int);
        assert_eq!(encoder.encode("p", &Value::Int(5), &int, None), pairs(&[("p", "5")]));
        assert_eq!(
            encoder.encode("p", &Value::Int(5), &TypeDescriptor::Any, None),
            pairs(&[("p", "[Integer:5]")])
        );
        assert_eq!(
            encoder.encode("p", &Value::Null, &TypeDescriptor::String, None),
            pairs(&[("p", "[null]")])
        );
        assert_eq!(
            encoder.encode("p", &Value::str(""), &TypeDescriptor::String, None),
            pairs(&[("p", "[empty]")])
        );
        assert_eq!(
            encoder.encode("p", &Value::str("[null]"), &TypeDescriptor::String, None),
            pairs(&[("p", "[String:[null]]")])
        );
        assert_eq!(
            encoder.encode("p", &Value::Char('\n'), &TypeDescriptor::Primitive(ScalarType::Char), None),
            pairs(&[("p", "0xA")])
        );
    }

    #[test]
    fn test_enums() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let encoder = Encoder::new(&registry, &options);
        let red = Value::enumeration("app.Color", "RED");
        assert_eq!(
            encoder.encode("c", &red, &TypeDescriptor::enumeration("app.Color"), None),
            pairs(&[("c", "RED")])
        );
        assert_eq!(
            encoder.encode("c", &red, &TypeDescriptor::Enum(None), None),
            pairs(&[("c", "app.Color.RED")])
        );
        assert_eq!(
            encoder.encode("c", &red, &TypeDescriptor::Any, None),
            pairs(&[("c", "[Enum:app.Color.RED]")])
        );
    }

    #[test]
    fn test_expanded_map_with_summary() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let encoder = Encoder::new(&registry, &options);
        let ty = TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::Boxed(ScalarType::Int));
        assert_eq!(
            encoder.encode("m", &string_int_map(), &ty, None),
            pairs(&[("m", "[map]"), ("m.a", "1"), ("m.b", "2")])
        );
        let any = TypeDescriptor::map(TypeDescriptor::Any, TypeDescriptor::Any);
        assert_eq!(
            encoder.encode("m", &string_int_map(), &any, None),
            pairs(&[("m", "[map:String,Integer]"), ("m.a", "1"), ("m.b", "2")])
        );
    }

    #[test]
    fn test_compact_map() {
        let registry = registry();
        let options = GeneratorOptions::compact();
        let encoder = Encoder::new(&registry, &options);
        let ty = TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::Boxed(ScalarType::Int));
        assert_eq!(
            encoder.encode("m", &string_int_map(), &ty, None),
            pairs(&[("m", "a>1;b>2")])
        );
    }

    #[test]
    fn test_numeric_keys_use_entries() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let encoder = Encoder::new(&registry, &options);
        let map = Value::Map(vec![
            (Value::str("1"), Value::str("one")),
            (Value::str("2"), Value::str("two")),
        ]);
        let ty = TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::String);
        assert_eq!(
            encoder.encode("m", &map, &ty, None),
            pairs(&[
                ("m", "[map]"),
                ("m.0", "[]"),
                ("m.0.key", "1"),
                ("m.0.value", "one"),
                ("m.1", "[]"),
                ("m.1.key", "2"),
                ("m.1.value", "two"),
            ])
        );
    }

    #[test]
    fn test_direct_keys_follow_search_depth() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let map = Value::Map(vec![
            (Value::str("a"), Value::str("x")),
            (Value::str("k.v"), Value::str("deep")),
        ]);
        let ty = TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::String);

        let encoder = Encoder::new(&registry, &options);
        assert_eq!(
            encoder.encode("m", &map, &ty, None),
            pairs(&[("m", "[map]"), ("m.a", "x"), ("m.k.v", "deep")])
        );

        let shallow = Encoder::new(&registry, &options).with_max_map_search_depth(1);
        let out = shallow.encode("m", &map, &ty, None);
        assert_eq!(
            out,
            pairs(&[
                ("m", "[map]"),
                ("m.0", "[]"),
                ("m.0.key", "a"),
                ("m.0.value", "x"),
                ("m.1", "[]"),
                ("m.1.key", "k.v"),
                ("m.1.value", "deep"),
            ])
        );

        let store: crate::properties::PropertyStore = out.into_iter().collect();
        let decoded = crate::decoder::Decoder::new(&registry, &store)
            .with_max_map_search_depth(1)
            .decode_value("m", "[map]", &ty)
            .unwrap();
        assert!(crate::deep_eq::deep_equals(&decoded, &map));
    }

    #[test]
    fn test_compact_max_length_boundary() {
        let registry = registry();
        let ty = TypeDescriptor::list(TypeDescriptor::String);
        for limit in [100, 80] {
            let options = GeneratorOptions {
                compact_max_length: limit,
                ..GeneratorOptions::compact()
            };
            let encoder = Encoder::new(&registry, &options);

            // `a...a;b` is exactly `limit` characters long.
            let at_limit = "a".repeat(limit - 2);
            let list = Value::List(vec![Value::str(&at_limit), Value::str("b")]);
            let line = format!("{};b", at_limit);
            assert_eq!(line.len(), limit);
            assert_eq!(encoder.encode("l", &list, &ty, None), pairs(&[("l", &line)]));

            let over = "a".repeat(limit - 1);
            let list = Value::List(vec![Value::str(&over), Value::str("b")]);
            assert_eq!(
                encoder.encode("l", &list, &ty, None),
                pairs(&[("l", "[list]"), ("l.0", &over), ("l.1", "b")])
            );
        }
    }

    #[test]
    fn test_list_with_separator_stays_expanded() {
        let registry = registry();
        let options = GeneratorOptions::compact();
        let encoder = Encoder::new(&registry, &options);
        let list = Value::List(vec![Value::str("a;b")]);
        assert_eq!(
            encoder.encode("l", &list, &TypeDescriptor::list(TypeDescriptor::String), None),
            pairs(&[("l", "[list]"), ("l.0", "a;b")])
        );
    }

    #[test]
    fn test_index_padding() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let encoder = Encoder::new(&registry, &options);
        let items: Vec<Value> = (0..11).map(Value::Int).collect();
        let out = encoder.encode(
            "a",
            &Value::Array {
                element: TypeDescriptor::Primitive(ScalarType::Int),
                items,
            },
            &TypeDescriptor::Any,
            None,
        );
        assert_eq!(out[0], ("a".to_string(), "[array:int]".to_string()));
        assert_eq!(out[1], ("a.00".to_string(), "0".to_string()));
        assert_eq!(out[11], ("a.10".to_string(), "10".to_string()));
    }

    #[test]
    fn test_subclass_gets_type_tag() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let encoder = Encoder::new(&registry, &options);
        let dog = Value::Object(ObjectValue::new("app.Dog").with_field("name", Value::str("rex")));
        assert_eq!(
            encoder.encode("pet", &dog, &TypeDescriptor::object("app.Animal"), None),
            pairs(&[("pet", "[object:app.Dog]"), ("pet.name", "rex")])
        );
        assert_eq!(
            encoder.encode("pet", &dog, &TypeDescriptor::object("app.Dog"), None),
            pairs(&[("pet", "[object]"), ("pet.name", "rex")])
        );
    }

    #[test]
    fn test_compact_object() {
        let registry = registry();
        let options = GeneratorOptions::compact();
        let encoder = Encoder::new(&registry, &options);
        let endpoint = Value::Object(
            ObjectValue::new("app.Endpoint")
                .with_field("host", Value::str("h"))
                .with_field("port", Value::Int(80)),
        );
        assert_eq!(
            encoder.encode("e", &endpoint, &TypeDescriptor::object("app.Endpoint"), None),
            pairs(&[("e", "host>h;port>80")])
        );
    }

    #[test]
    fn test_codec_preference() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let encoder = Encoder::new(&registry, &options);
        let field = FieldSchema::new("token", TypeDescriptor::String).preferred_codecs(&["base64"]);
        assert_eq!(
            encoder.encode_field("token", &field, &Value::str("hello")),
            pairs(&[("token", "[base64:aGVsbG8=]")])
        );
        let list_field = FieldSchema::new("tokens", TypeDescriptor::list(TypeDescriptor::String))
            .preferred_codecs(&["base64"]);
        assert_eq!(
            encoder.encode_field("tokens", &list_field, &Value::List(vec![Value::str("hello")])),
            pairs(&[("tokens", "[list]"), ("tokens.0", "[base64:aGVsbG8=]")])
        );
    }

    #[test]
    fn test_empty_containers() {
        let registry = registry();
        let options = GeneratorOptions::default();
        let encoder = Encoder::new(&registry, &options);
        assert_eq!(
            encoder.encode("l", &Value::List(vec![]), &TypeDescriptor::list(TypeDescriptor::String), None),
            pairs(&[("l", "[empty]")])
        );
        assert_eq!(
            encoder.encode("m", &Value::Map(vec![]), &TypeDescriptor::Any, None),
            pairs(&[("m", "[map]")])
        );
    }
}

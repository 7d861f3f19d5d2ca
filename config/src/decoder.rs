//! # Decoder
//!
//! Recursive descent from flat properties to typed values. Each call binds
//! one value against its declared [`TypeDescriptor`] and reports whether it
//! differs from the live value. Errors never escape as panics or partial
//! values: the public entry point folds them into [`BindingOutcome::Invalid`].

use crate::deep_eq::deep_equals;
use crate::descriptor::{ScalarType, TypeDescriptor};
use crate::properties::PropertyStore;
use crate::recognizer::TypeRecognizer;
use crate::registry::{Registry, simple_type};
use crate::schema::{FieldSchema, default_value};
use crate::tag::{self, Tag, parse_tag};
use crate::validator::FieldValidator;
use crate::value::Value;
use hotconf_errors::BindingError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const DEFAULT_MAX_MAP_SEARCH_DEPTH: usize = 10;
pub const MAX_MAP_SEARCH_DEPTH_LIMIT: usize = 20;

/// Result of binding one raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingOutcome {
    Unchanged,
    Changed(Value),
    Invalid(BindingError),
}

impl BindingOutcome {
    pub fn is_invalid(&self) -> bool {
        matches!(self, BindingOutcome::Invalid(_))
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, BindingOutcome::Changed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectionKind {
    Array,
    List,
    Set,
}

pub struct Decoder<'a> {
    registry: &'a Registry,
    store: &'a PropertyStore,
    max_map_search_depth: usize,
    validator: Option<&'a dyn FieldValidator>,
    warnings: RefCell<Vec<BindingError>>,
}

impl<'a> Decoder<'a> {
    pub fn new(registry: &'a Registry, store: &'a PropertyStore) -> Self {
        Self {
            registry,
            store,
            max_map_search_depth: DEFAULT_MAX_MAP_SEARCH_DEPTH,
            validator: None,
            warnings: RefCell::new(Vec::new()),
        }
    }

    /// Clamped to 1..=20.
    pub fn with_max_map_search_depth(mut self, depth: usize) -> Self {
        self.max_map_search_depth = depth.clamp(1, MAX_MAP_SEARCH_DEPTH_LIMIT);
        self
    }

    /// Validator applied to the fields of nested objects.
    pub fn with_validator(mut self, validator: &'a dyn FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Non-fatal problems seen so far, such as unknown single-line fields.
    pub fn take_warnings(&self) -> Vec<BindingError> {
        std::mem::take(&mut *self.warnings.borrow_mut())
    }

    /// Binds `raw` at `path` and compares the result with `current`.
    pub fn decode(
        &self,
        path: &str,
        raw: &str,
        ty: &TypeDescriptor,
        current: &Value,
    ) -> BindingOutcome {
        match self.decode_value(path, raw, ty) {
            Ok(value) if deep_equals(&value, current) => BindingOutcome::Unchanged,
            Ok(value) => BindingOutcome::Changed(value),
            Err(e) => BindingOutcome::Invalid(e),
        }
    }

    /// Binds `raw` at `path` to a value of type `ty`.
    pub fn decode_value(
        &self,
        path: &str,
        raw: &str,
        ty: &TypeDescriptor,
    ) -> Result<Value, BindingError> {
        let raw = raw.trim();
        let tag = parse_tag(raw);

        if tag.is_some_and(|t| t.is_null()) {
            if ty.is_primitive() {
                return Err(BindingError::ShapeMismatch {
                    path: path.to_string(),
                    expected: ty.tag_name(),
                    found: tag::NULL_TAG.to_string(),
                });
            }
            return Ok(Value::Null);
        }

        if let Some(Tag {
            name,
            payload: Some(payload),
        }) = tag
        {
            if self.registry.codecs.contains(name) {
                return self.decode_codec(path, name, payload, ty);
            }
        }

        let recognized = TypeRecognizer::new(self.registry).recognize(path, raw, ty)?;
        match &recognized {
            TypeDescriptor::Primitive(s) | TypeDescriptor::Boxed(s) => {
                self.decode_scalar(path, raw, tag, *s)
            }
            TypeDescriptor::String => Ok(decode_string(raw, tag)),
            TypeDescriptor::Array(e) => {
                self.decode_collection(path, raw, tag, CollectionKind::Array, e)
            }
            TypeDescriptor::List(e) => {
                self.decode_collection(path, raw, tag, CollectionKind::List, e)
            }
            TypeDescriptor::Set(e) => self.decode_collection(path, raw, tag, CollectionKind::Set, e),
            TypeDescriptor::Map(k, v) => self.decode_map(path, raw, tag, k, v),
            TypeDescriptor::Object(class) => self.decode_object(path, raw, tag, class, false),
            TypeDescriptor::Annotation(Some(class)) => {
                self.decode_object(path, raw, tag, class, true)
            }
            TypeDescriptor::Enum(Some(class)) => self.decode_enum(path, raw, tag, class),
            TypeDescriptor::Class => self.decode_class(path, raw, tag),
            TypeDescriptor::Any | TypeDescriptor::Enum(None) | TypeDescriptor::Annotation(None) => {
                Err(BindingError::UnresolvableType {
                    path: path.to_string(),
                    name: raw.to_string(),
                })
            }
        }
    }

    fn decode_codec(
        &self,
        path: &str,
        codec: &str,
        payload: &str,
        ty: &TypeDescriptor,
    ) -> Result<Value, BindingError> {
        let value = self
            .registry
            .codecs
            .decode_tagged(codec, payload)
            .map_err(|e| BindingError::CodecDecodeFailure {
                path: path.to_string(),
                codec: codec.to_string(),
                reason: e.to_string(),
            })?;
        let runtime = value.runtime_type();
        if self.registry.types.is_assignable(ty, &runtime) {
            Ok(value)
        } else {
            Err(BindingError::ShapeMismatch {
                path: path.to_string(),
                expected: ty.tag_name(),
                found: format!("[{}:...] ({})", codec, runtime.tag_name()),
            })
        }
    }

    fn decode_scalar(
        &self,
        path: &str,
        raw: &str,
        tag: Option<Tag<'_>>,
        scalar: ScalarType,
    ) -> Result<Value, BindingError> {
        let text = match tag {
            None => raw,
            Some(t) if t.is_empty() => "",
            Some(Tag {
                name,
                payload: Some(payload),
            }) if matches!(
                simple_type(name),
                Some(TypeDescriptor::Boxed(_) | TypeDescriptor::Primitive(_))
            ) =>
            {
                payload.trim()
            }
            Some(_) => {
                return Err(BindingError::ShapeMismatch {
                    path: path.to_string(),
                    expected: scalar.boxed_name().to_string(),
                    found: raw.to_string(),
                });
            }
        };
        parse_scalar(text, scalar).ok_or_else(|| BindingError::InvalidLiteral {
            path: path.to_string(),
            expected: scalar.primitive_name().to_string(),
            raw: raw.to_string(),
        })
    }

    fn decode_collection(
        &self,
        path: &str,
        raw: &str,
        tag: Option<Tag<'_>>,
        kind: CollectionKind,
        declared_element: &TypeDescriptor,
    ) -> Result<Value, BindingError> {
        let mut element = declared_element.clone();
        let multi_line = match tag {
            Some(t) if t.is_empty() => return Ok(build_collection(kind, declared_element, Vec::new())),
            Some(t) if matches!(t.name, tag::ARRAY | tag::LIST | tag::SET | "") => {
                if let Some(payload) = t.payload.filter(|p| !p.trim().is_empty()) {
                    if !self.registry.types.is_concrete(declared_element) {
                        let hinted =
                            TypeRecognizer::new(self.registry).resolve_type_name(path, payload)?;
                        if self.registry.types.is_assignable(declared_element, &hinted) {
                            element = hinted;
                        }
                    }
                }
                true
            }
            Some(t) if t.is_reserved() => {
                return Err(BindingError::ShapeMismatch {
                    path: path.to_string(),
                    expected: format!("{:?}", kind).to_lowercase(),
                    found: raw.to_string(),
                });
            }
            _ => false,
        };
        if raw.is_empty() {
            return Ok(build_collection(kind, declared_element, Vec::new()));
        }

        let mut items = Vec::new();
        if multi_line {
            let mut children: Vec<(u64, &str)> = self
                .store
                .children(path)
                .into_iter()
                .filter_map(|(segment, key)| segment.parse::<u64>().ok().map(|i| (i, key)))
                .collect();
            children.sort_by_key(|(index, _)| *index);
            for (_, key) in children {
                let item_raw = self.store.get(key).unwrap_or_default();
                items.push(self.decode_element(key, item_raw, &element)?);
            }
        } else {
            for item in split_items(raw) {
                items.push(self.decode_element(path, item, &element)?);
            }
        }
        Ok(build_collection(kind, declared_element, items))
    }

    fn decode_element(
        &self,
        path: &str,
        raw: &str,
        element: &TypeDescriptor,
    ) -> Result<Value, BindingError> {
        if raw.trim().is_empty() && element.is_primitive() {
            return Ok(default_value(element));
        }
        self.decode_value(path, raw, element)
    }

    fn decode_map(
        &self,
        path: &str,
        raw: &str,
        tag: Option<Tag<'_>>,
        declared_key: &TypeDescriptor,
        declared_value: &TypeDescriptor,
    ) -> Result<Value, BindingError> {
        let mut key_ty = declared_key.clone();
        let mut value_ty = declared_value.clone();
        match tag {
            Some(t) if t.is_empty() => return Ok(Value::Map(Vec::new())),
            Some(t) if matches!(t.name, tag::MAP | "") => {
                if let Some((k, v)) = t.payload.and_then(tag::split_type_pair) {
                    let recognizer = TypeRecognizer::new(self.registry);
                    let types = &self.registry.types;
                    if !types.is_concrete(declared_key) {
                        let hinted = recognizer.resolve_type_name(path, k)?;
                        if types.is_assignable(declared_key, &hinted) {
                            key_ty = hinted;
                        }
                    }
                    if !types.is_concrete(declared_value) {
                        let hinted = recognizer.resolve_type_name(path, v)?;
                        if types.is_assignable(declared_value, &hinted) {
                            value_ty = hinted;
                        }
                    }
                }
                let names = self.store.descendants(path);
                if names.is_empty() {
                    return Ok(Value::Map(Vec::new()));
                }
                let entries_mode = names.iter().all(|name| {
                    let first = name.split('.').next().unwrap_or_default();
                    !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit())
                });
                if entries_mode {
                    self.decode_map_entries(path, &names, &key_ty, &value_ty)
                } else {
                    self.decode_map_direct(path, &names, &key_ty, &value_ty)
                }
            }
            Some(_) => Err(BindingError::ShapeMismatch {
                path: path.to_string(),
                expected: "map".to_string(),
                found: raw.to_string(),
            }),
            None if raw.is_empty() => Ok(Value::Map(Vec::new())),
            None => {
                let mut entries = Vec::new();
                for item in split_items(raw) {
                    let (k, v) = split_pair(item).ok_or_else(|| BindingError::ShapeMismatch {
                        path: path.to_string(),
                        expected: "key>value".to_string(),
                        found: item.to_string(),
                    })?;
                    let key = self.decode_value(path, k, &key_ty)?;
                    let value = self.decode_element(path, v, &value_ty)?;
                    insert_entry(&mut entries, key, value);
                }
                Ok(Value::Map(entries))
            }
        }
    }

    /// Entries live at `path.N.key` and `path.N.value`, or on one line at
    /// `path.N` as `key>k;value>v`.
    fn decode_map_entries(
        &self,
        path: &str,
        names: &[&str],
        key_ty: &TypeDescriptor,
        value_ty: &TypeDescriptor,
    ) -> Result<Value, BindingError> {
        let mut ordinals: BTreeMap<u64, &str> = BTreeMap::new();
        for name in names {
            let first = name.split('.').next().unwrap_or_default();
            if let Ok(ordinal) = first.parse::<u64>() {
                ordinals.entry(ordinal).or_insert(first);
            }
        }
        let mut entries = Vec::new();
        for segment in ordinals.values() {
            let entry_path = format!("{}.{}", path, segment);
            let key_path = format!("{}.key", entry_path);
            let value_path = format!("{}.value", entry_path);
            let inline = self
                .store
                .get(&entry_path)
                .map(str::trim)
                .filter(|r| !r.is_empty() && !tag::is_tag(r));
            let (key_raw, value_raw) = match inline {
                Some(line) => {
                    let mut key_raw = None;
                    let mut value_raw = None;
                    for item in split_items(line) {
                        match split_pair(item) {
                            Some(("key", k)) => key_raw = Some(k),
                            Some(("value", v)) => value_raw = Some(v),
                            _ => {}
                        }
                    }
                    (key_raw, value_raw)
                }
                None => (self.store.get(&key_path), self.store.get(&value_path)),
            };
            let (Some(key_raw), Some(value_raw)) = (key_raw, value_raw) else {
                debug!("Skipping incomplete map entry {}", entry_path);
                continue;
            };
            let key = self.decode_value(&key_path, key_raw, key_ty)?;
            let value = self.decode_element(&value_path, value_raw, value_ty)?;
            insert_entry(&mut entries, key, value);
        }
        Ok(Value::Map(entries))
    }

    /// Direct mode: `path.<key>=value`. Keys may contain dots, so candidates
    /// are taken in rounds of increasing dot count. A value that is a tag or
    /// empty owns every key below it, which keeps a nested object's fields
    /// from being read as further map keys. Keys deeper than the search
    /// bound are left unread.
    fn decode_map_direct(
        &self,
        path: &str,
        names: &[&str],
        key_ty: &TypeDescriptor,
        value_ty: &TypeDescriptor,
    ) -> Result<Value, BindingError> {
        let mut entries = Vec::new();
        let mut owned_prefixes: Vec<String> = Vec::new();
        let mut pending: Vec<&str> = names.to_vec();
        let mut dots = 0usize;
        loop {
            let mut deferred = Vec::new();
            for name in pending {
                if owned_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
                    continue;
                }
                if name.matches('.').count() > dots {
                    deferred.push(name);
                    continue;
                }
                let entry_path = format!("{}.{}", path, name);
                let value_raw = self.store.get(&entry_path).unwrap_or_default();
                let key = self.decode_value(&entry_path, name, key_ty)?;
                let value = self.decode_element(&entry_path, value_raw, value_ty)?;
                let value_raw = value_raw.trim();
                if value_raw.is_empty() || tag::is_tag(value_raw) {
                    owned_prefixes.push(format!("{}.", name));
                }
                insert_entry(&mut entries, key, value);
            }
            dots += 1;
            if deferred.is_empty() {
                break;
            }
            if dots >= self.max_map_search_depth {
                debug!(
                    "Map {} search stopped at depth {}; {} keys left unread",
                    path,
                    dots,
                    deferred.len()
                );
                break;
            }
            pending = deferred;
        }
        Ok(Value::Map(entries))
    }

    fn decode_object(
        &self,
        path: &str,
        raw: &str,
        tag: Option<Tag<'_>>,
        class: &str,
        annotation: bool,
    ) -> Result<Value, BindingError> {
        let types = &self.registry.types;
        let schema = if annotation {
            types.annotation(class)
        } else {
            types.class(class)
        }
        .ok_or_else(|| BindingError::UnresolvableType {
            path: path.to_string(),
            name: class.to_string(),
        })?;
        if schema.is_abstract {
            return Err(BindingError::ShapeMismatch {
                path: path.to_string(),
                expected: format!("concrete subclass of {}", class),
                found: raw.to_string(),
            });
        }
        let fields = types.fields_of(class);
        let mut object = types.default_object(class);

        match tag {
            Some(t) if t.is_empty() => {}
            Some(_) => {
                for field in &fields {
                    let key = format!("{}.{}", path, field.name);
                    if let Some(field_raw) = self.store.get(&key) {
                        let value = self.decode_value(&key, field_raw, &field.ty)?;
                        self.validate_nested(class, field, &value)?;
                        object.fields.insert(field.name.clone(), value);
                    }
                }
            }
            None if raw.is_empty() => {}
            None => {
                for item in split_items(raw) {
                    let Some((name, value_raw)) = split_pair(item) else {
                        return Err(BindingError::ShapeMismatch {
                            path: path.to_string(),
                            expected: "field>value".to_string(),
                            found: item.to_string(),
                        });
                    };
                    let Some(field) = fields.iter().find(|f| f.name == name) else {
                        warn!("Unknown field {} for {} at {}", name, class, path);
                        self.warnings.borrow_mut().push(BindingError::UnknownField {
                            class: class.to_string(),
                            field: name.to_string(),
                        });
                        continue;
                    };
                    let key = format!("{}.{}", path, name);
                    let value = self.decode_element(&key, value_raw, &field.ty)?;
                    self.validate_nested(class, field, &value)?;
                    object.fields.insert(field.name.clone(), value);
                }
            }
        }
        Ok(if annotation {
            Value::Annotation(object)
        } else {
            Value::Object(object)
        })
    }

    fn validate_nested(
        &self,
        class: &str,
        field: &FieldSchema,
        value: &Value,
    ) -> Result<(), BindingError> {
        match self.validator {
            Some(validator) => {
                validator
                    .validate(field, value)
                    .map_err(|e| BindingError::ValidationRejected {
                        field: format!("{}.{}", class, field.name),
                        reason: e.to_string(),
                    })
            }
            None => Ok(()),
        }
    }

    fn decode_enum(
        &self,
        path: &str,
        raw: &str,
        tag: Option<Tag<'_>>,
        class: &str,
    ) -> Result<Value, BindingError> {
        let text = match tag {
            Some(Tag {
                payload: Some(payload),
                ..
            }) => payload.trim(),
            Some(_) => {
                return Err(BindingError::ShapeMismatch {
                    path: path.to_string(),
                    expected: class.to_string(),
                    found: raw.to_string(),
                });
            }
            None => raw,
        };
        let constant = text.rsplit('.').next().unwrap_or(text).trim();
        let schema = self
            .registry
            .types
            .enum_schema(class)
            .ok_or_else(|| BindingError::UnresolvableType {
                path: path.to_string(),
                name: class.to_string(),
            })?;
        if !schema.has_constant(constant) {
            return Err(BindingError::UnresolvableType {
                path: path.to_string(),
                name: format!("{}.{}", class, constant),
            });
        }
        Ok(Value::enumeration(class, constant))
    }

    fn decode_class(
        &self,
        path: &str,
        raw: &str,
        tag: Option<Tag<'_>>,
    ) -> Result<Value, BindingError> {
        let name = match tag {
            Some(Tag {
                payload: Some(payload),
                ..
            }) => payload.trim(),
            Some(_) => {
                return Err(BindingError::ShapeMismatch {
                    path: path.to_string(),
                    expected: "Class".to_string(),
                    found: raw.to_string(),
                });
            }
            None => raw,
        };
        if self.registry.types.has_type(name) {
            Ok(Value::Class(name.to_string()))
        } else {
            Err(BindingError::UnresolvableType {
                path: path.to_string(),
                name: name.to_string(),
            })
        }
    }
}

fn build_collection(kind: CollectionKind, element: &TypeDescriptor, items: Vec<Value>) -> Value {
    match kind {
        CollectionKind::Array => Value::Array {
            element: element.clone(),
            items,
        },
        CollectionKind::List => Value::List(items),
        CollectionKind::Set => {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.iter().any(|u| deep_equals(u, &item)) {
                    unique.push(item);
                }
            }
            Value::Set(unique)
        }
    }
}

fn insert_entry(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match entries.iter_mut().find(|(k, _)| deep_equals(k, &key)) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

fn decode_string(raw: &str, tag: Option<Tag<'_>>) -> Value {
    match tag {
        Some(t) if t.is_empty() => Value::Str(String::new()),
        Some(Tag {
            name: "String" | "string",
            payload: Some(payload),
        }) => Value::Str(payload.to_string()),
        _ => Value::Str(raw.to_string()),
    }
}

/// Splits a single-line value on `;`, trimming each item. Trailing empty
/// items are dropped.
pub(crate) fn split_items(raw: &str) -> Vec<&str> {
    let mut items: Vec<&str> = raw.split(';').map(str::trim).collect();
    while items.len() > 1 && items.last().is_some_and(|s| s.is_empty()) {
        items.pop();
    }
    items
}

/// Splits `key>value`; runs of `>` count as one separator and `key>` gives
/// an empty value.
pub(crate) fn split_pair(item: &str) -> Option<(&str, &str)> {
    let idx = item.find('>')?;
    let key = item[..idx].trim();
    let value = item[idx..].trim_start_matches('>').trim();
    Some((key, value))
}

/// Integer literal with optional sign and `0x`, `#` or leading-zero octal
/// radix prefixes.
pub(crate) fn parse_integer(text: &str) -> Option<i128> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .or_else(|| body.strip_prefix('#'))
    {
        (16, hex)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from(u64::from_str_radix(digits, radix).ok()?);
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Some('\0'),
        (Some(c), None) => Some(c),
        _ => {
            if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
                let mut inner_chars = inner.chars();
                if let (Some(c), None) = (inner_chars.next(), inner_chars.next()) {
                    return Some(c);
                }
            }
            parse_integer(text)
                .and_then(|code| u32::try_from(code).ok())
                .and_then(char::from_u32)
        }
    }
}

fn parse_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().or_else(|| {
        text.strip_suffix(['f', 'F', 'd', 'D'])
            .and_then(|t| t.parse::<f64>().ok())
    })
}

/// Parses a scalar literal. Empty numeric text is zero; booleans accept
/// only `true` and `false`.
pub(crate) fn parse_scalar(text: &str, scalar: ScalarType) -> Option<Value> {
    let text = text.trim();
    let numeric = if text.is_empty() { "0" } else { text };
    match scalar {
        ScalarType::Bool => match text {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ScalarType::Char => parse_char(text).map(Value::Char),
        ScalarType::Byte => parse_integer(numeric)
            .and_then(|v| i8::try_from(v).ok())
            .map(Value::Byte),
        ScalarType::Short => parse_integer(numeric)
            .and_then(|v| i16::try_from(v).ok())
            .map(Value::Short),
        ScalarType::Int => parse_integer(numeric)
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int),
        ScalarType::Long => parse_integer(numeric)
            .and_then(|v| i64::try_from(v).ok())
            .map(Value::Long),
        ScalarType::Float => parse_float(numeric).map(|v| Value::Float(v as f32)),
        ScalarType::Double => parse_float(numeric).map(Value::Double),
    }
}

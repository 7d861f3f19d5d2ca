//! Single-line eligibility and collection type summarization.
//!
//! A value may be written on one line only when every leaf renders without
//! the characters the single-line grammar splits on, and no container sits
//! inside another.

use crate::descriptor::TypeDescriptor;
use crate::registry::TypeRegistry;
use crate::value::Value;

const VALUE_SEPARATORS: [char; 5] = [';', '>', '#', '\n', '\r'];
const KEY_SEPARATORS: [char; 3] = ['=', ' ', '\t'];

/// Structural check: containers hold only leaves, annotations never
/// compact, and nothing compact may itself be nested. String leaves must be
/// non-empty, untrimmed-safe and must not start with `[`.
pub fn is_compact(value: &Value, nested: bool) -> bool {
    match value {
        Value::Array { items, .. } | Value::List(items) | Value::Set(items) => {
            !nested && items.iter().all(|item| is_compact(item, true))
        }
        Value::Map(entries) => {
            !nested
                && entries
                    .iter()
                    .all(|(k, v)| is_compact(k, true) && is_compact(v, true))
        }
        Value::Object(object) => !nested && object.fields.values().all(|v| is_compact(v, true)),
        Value::Annotation(_) => false,
        Value::Str(s) if nested => !s.is_empty() && !s.starts_with('[') && s.trim() == s,
        _ => true,
    }
}

/// Text check on a rendered leaf. Keys additionally reject `=` and blanks.
pub fn is_compact_text(text: &str, for_keys: bool) -> bool {
    if text.contains(VALUE_SEPARATORS) || text.trim() != text {
        return false;
    }
    !(for_keys && text.contains(KEY_SEPARATORS))
}

/// Narrowest runtime type every non-null item is assignable to. `None` when
/// the items conflict, are all null, or only `Object` would fit.
pub fn common_type<'a>(
    types: &TypeRegistry,
    items: impl IntoIterator<Item = &'a Value>,
) -> Option<TypeDescriptor> {
    let mut common: Option<TypeDescriptor> = None;
    for item in items {
        if item.is_null() {
            continue;
        }
        let ty = item.runtime_type();
        common = match common {
            None => Some(ty),
            Some(current) if types.is_assignable(&current, &ty) => Some(current),
            Some(current) if types.is_assignable(&ty, &current) => Some(ty),
            Some(_) => return None,
        };
    }
    common.filter(|t| !t.is_any())
}

//! Structural equality for change detection.
//!
//! Lists and arrays compare in order, sets by multiset containment and maps
//! by key presence plus per-key value equality. Floats compare by bit
//! pattern so a reloaded `NaN` is not reported as a change.

use crate::value::{ObjectValue, Value};

pub fn deep_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits() || x == y,
        (Value::Double(x), Value::Double(y)) => x.to_bits() == y.to_bits() || x == y,
        (Value::Array { items: a, .. }, Value::Array { items: b, .. }) => sequence_equals(a, b),
        (Value::List(a), Value::List(b)) => sequence_equals(a, b),
        (Value::Set(a), Value::Set(b)) => set_equals(a, b),
        (Value::Map(a), Value::Map(b)) => map_equals(a, b),
        (Value::Object(a), Value::Object(b)) | (Value::Annotation(a), Value::Annotation(b)) => {
            object_equals(a, b)
        }
        _ => a == b,
    }
}

fn sequence_equals(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equals(x, y))
}

fn set_equals(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut matched = vec![false; b.len()];
    'outer: for x in a {
        for (i, y) in b.iter().enumerate() {
            if !matched[i] && deep_equals(x, y) {
                matched[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

/// Looks up `key` in an entry list by structural equality.
pub fn map_get<'a>(entries: &'a [(Value, Value)], key: &Value) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(k, _)| deep_equals(k, key))
        .map(|(_, v)| v)
}

fn map_equals(a: &[(Value, Value)], b: &[(Value, Value)]) -> bool {
    a.len() == b.len()
        && a.iter().all(|(k, v)| match map_get(b, k) {
            Some(other) => deep_equals(v, other),
            None => false,
        })
}

fn object_equals(a: &ObjectValue, b: &ObjectValue) -> bool {
    a.class == b.class
        && a.fields.len() == b.fields.len()
        && a.fields.iter().all(|(name, v)| match b.fields.get(name) {
            Some(other) => deep_equals(v, other),
            None => false,
        })
}

//! # Tag Grammar
//!
//! Bracketed type tags embedded in property values: `[null]`, `[empty]`,
//! `[array:int]`, `[map:String,Integer]`, `[secret:...]` and so on.

use std::fmt;

pub const NULL: &str = "null";
pub const EMPTY: &str = "empty";
pub const ARRAY: &str = "array";
pub const LIST: &str = "list";
pub const SET: &str = "set";
pub const MAP: &str = "map";
pub const OBJECT: &str = "object";
pub const ANNOTATION: &str = "annotation";
pub const ENUM: &str = "Enum";

pub const NULL_TAG: &str = "[null]";
pub const EMPTY_TAG: &str = "[empty]";

/// A parsed `[name]` or `[name:payload]` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub name: &'a str,
    pub payload: Option<&'a str>,
}

impl<'a> Tag<'a> {
    pub fn new(name: &'a str, payload: Option<&'a str>) -> Self {
        Self { name, payload }
    }

    pub fn is_null(&self) -> bool {
        self.name == NULL && self.payload.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.name == EMPTY && self.payload.is_none()
    }

    /// Names owned by the grammar itself and never resolved as classes.
    pub fn is_reserved(&self) -> bool {
        is_reserved_name(self.name)
    }
}

impl fmt::Display for Tag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload {
            Some(payload) => write!(f, "[{}:{}]", self.name, payload),
            None => write!(f, "[{}]", self.name),
        }
    }
}

pub fn is_reserved_name(name: &str) -> bool {
    matches!(
        name,
        NULL | EMPTY | ARRAY | LIST | SET | MAP | OBJECT | ANNOTATION
    )
}

/// Parses `s` as a tag.
///
/// A string is a tag when, trimmed, it is at least two characters long,
/// starts with `[`, ends with `]`, and the opening bracket is only closed by
/// the final character. Nested tags such as `[array:[array:int]]` qualify;
/// `[a];[b]` does not.
pub fn parse_tag(s: &str) -> Option<Tag<'_>> {
    let s = s.trim();
    if s.len() < 2 || !s.starts_with('[') || !s.ends_with(']') {
        return None;
    }
    let mut depth = 0usize;
    let last = s.len() - 1;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 && i != last {
                    return None;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    let interior = &s[1..last];
    Some(match interior.find(':') {
        Some(idx) => Tag::new(interior[..idx].trim(), Some(&interior[idx + 1..])),
        None => Tag::new(interior.trim(), None),
    })
}

pub fn is_tag(s: &str) -> bool {
    parse_tag(s).is_some()
}

/// Renders a tag back to text; the inverse of [`parse_tag`].
pub fn render(tag: &Tag<'_>) -> String {
    tag.to_string()
}

pub fn render_parts(name: &str, payload: Option<&str>) -> String {
    Tag::new(name, payload).to_string()
}

/// Splits a tag payload on top-level commas, ignoring commas nested in
/// brackets. Used for `[map:K,V]`.
pub fn split_type_pair(payload: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, c) in payload.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                return Some((payload[..i].trim(), payload[i + 1..].trim()));
            }
            _ => {}
        }
    }
    None
}

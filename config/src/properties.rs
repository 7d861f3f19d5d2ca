//! # Canonical Properties
//!
//! The flat dot-keyed string map shared by every file format, plus the INI
//! adapter that reads and writes it directly.

use hotconf_errors::LoadError;
use indexmap::IndexMap;

/// Ordered `PropertyPath -> raw value` map. Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    entries: IndexMap<String, String>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Inserts only when the key is absent.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every key under `path.`, returned as the remainder after the prefix.
    pub fn descendants(&self, path: &str) -> Vec<&str> {
        let prefix = format!("{}.", path);
        self.entries
            .keys()
            .filter_map(|k| k.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.is_empty())
            .collect()
    }

    /// Keys exactly one segment below `path`, as `(segment, full key)`.
    pub fn children(&self, path: &str) -> Vec<(&str, &str)> {
        let prefix = format!("{}.", path);
        self.entries
            .keys()
            .filter_map(|k| {
                k.strip_prefix(prefix.as_str())
                    .filter(|rest| !rest.is_empty() && !rest.contains('.'))
                    .map(|rest| (rest, k.as_str()))
            })
            .collect()
    }

    /// Copies every entry of `other` over this store.
    pub fn extend_from(&mut self, other: &PropertyStore) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }
}

impl FromIterator<(String, String)> for PropertyStore {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A line of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyLine {
    Comment(String),
    Blank,
    Entry { key: String, value: String },
}

impl PropertyLine {
    pub fn entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        PropertyLine::Entry {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A file syntax that can be translated to and from canonical properties.
pub trait SyntaxAdapter: Send + Sync {
    /// File extensions handled, lowercase and without the dot.
    fn extensions(&self) -> &'static [&'static str];

    fn to_canonical_properties(&self, text: &str) -> Result<PropertyStore, LoadError>;

    fn render(&self, lines: &[PropertyLine]) -> String;
}

/// The INI-style adapter. Its syntax is the canonical form itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniAdapter;

impl SyntaxAdapter for IniAdapter {
    fn extensions(&self) -> &'static [&'static str] {
        &["ini", "properties", "props", "conf", "cfg"]
    }

    fn to_canonical_properties(&self, text: &str) -> Result<PropertyStore, LoadError> {
        Ok(parse_properties(text))
    }

    fn render(&self, lines: &[PropertyLine]) -> String {
        render_properties(lines)
    }
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Parses properties text: `key=value`, `key: value` or `key value`, with
/// `#`/`!` comments, trailing-backslash continuations and escapes.
pub fn parse_properties(text: &str) -> PropertyStore {
    let mut store = PropertyStore::new();
    let mut logical = String::new();
    let mut continuing = false;

    for raw_line in text.lines() {
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim_start();
        if !continuing {
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            logical.clear();
        }
        if ends_with_continuation(trimmed) {
            logical.push_str(&trimmed[..trimmed.len() - 1]);
            continuing = true;
            continue;
        }
        logical.push_str(trimmed);
        continuing = false;
        let (key, value) = split_key_value(&logical);
        store.insert(unescape(&key), unescape(&value));
    }
    if continuing && !logical.is_empty() {
        let (key, value) = split_key_value(&logical);
        store.insert(unescape(&key), unescape(&value));
    }
    store
}

fn split_key_value(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }
    let key = line[..key_end].to_string();
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\u{c}']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\u{c}']);
    }
    (key, rest.to_string())
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Escapes a value for a properties line.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '=' | ':' | ' ' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push_str(&escape_value(c.encode_utf8(&mut [0; 4]))),
        }
    }
    out
}

/// Renders lines with CRLF endings.
pub fn render_properties(lines: &[PropertyLine]) -> String {
    let mut out = String::new();
    for line in lines {
        match line {
            PropertyLine::Comment(text) => {
                for part in text.lines() {
                    out.push_str("# ");
                    out.push_str(part);
                    out.push_str("\r\n");
                }
            }
            PropertyLine::Blank => out.push_str("\r\n"),
            PropertyLine::Entry { key, value } => {
                out.push_str(&escape_key(key));
                out.push('=');
                out.push_str(&escape_value(value));
                out.push_str("\r\n");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let store = parse_properties(
            "# comment\r\n! also comment\r\nhost=localhost\r\nport : 8080\r\nname value\r\n\r\nempty=\r\n",
        );
        assert_eq!(store.get("host"), Some("localhost"));
        assert_eq!(store.get("port"), Some("8080"));
        assert_eq!(store.get("name"), Some("value"));
        assert_eq!(store.get("empty"), Some(""));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_parse_escapes_and_continuation() {
        let store = parse_properties("motd=line1\\nline2\\ttab\nlong=a;\\\n    b;c\nuni=\\u00e9\n");
        assert_eq!(store.get("motd"), Some("line1\nline2\ttab"));
        assert_eq!(store.get("long"), Some("a;b;c"));
        assert_eq!(store.get("uni"), Some("é"));
    }

    #[test]
    fn test_last_write_wins() {
        let store = parse_properties("a=1\na=2\n");
        assert_eq!(store.get("a"), Some("2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_children_and_descendants() {
        let mut store = PropertyStore::new();
        store.insert("list", "[list]");
        store.insert("list.0", "a");
        store.insert("list.1", "b");
        store.insert("list.1.x", "nested");
        store.insert("listing", "other");
        let children: Vec<_> = store.children("list").into_iter().map(|(s, _)| s).collect();
        assert_eq!(children, vec!["0", "1"]);
        assert_eq!(store.descendants("list"), vec!["0", "1", "1.x"]);
    }

    #[test]
    fn test_render_round_trip() {
        let lines = vec![
            PropertyLine::Comment("Server settings".to_string()),
            PropertyLine::entry("motd", "hello\nworld\\"),
            PropertyLine::Blank,
            PropertyLine::entry("path", "C:\\temp"),
        ];
        let text = render_properties(&lines);
        assert_eq!(
            text,
            "# Server settings\r\nmotd=hello\\nworld\\\\\r\n\r\npath=C:\\\\temp\r\n"
        );
        let store = parse_properties(&text);
        assert_eq!(store.get("motd"), Some("hello\nworld\\"));
        assert_eq!(store.get("path"), Some("C:\\temp"));
    }

    #[test]
    fn test_ini_adapter_extensions() {
        assert!(IniAdapter.extensions().contains(&"ini"));
        let store = IniAdapter.to_canonical_properties("a=1").unwrap();
        assert_eq!(store.get("a"), Some("1"));
    }
}

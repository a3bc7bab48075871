//! # Line Locator
//!
//! `serde_yaml` and `serde_json` decode to plain value trees without
//! source positions. The locator scans the raw text a second time and
//! records the 1-based line on which each mapping key and sequence item
//! starts, keyed by its path from the document root.
//!
//! JSON is tokenized completely. YAML is scanned line by line and covers
//! block-style mappings and sequences (including compact `- key: v` items
//! and sequences at the same indentation as their key). Block scalars
//! (`|`, `>`) are skipped, and the contents of flow collections (`[..]`,
//! `{..}`) get no positions of their own.

use std::collections::HashMap;

/// One step of a path from the document root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Path-to-line table for one document.
#[derive(Debug, Default)]
pub struct LineMap {
    lines: HashMap<Vec<Segment>, u32>,
}

impl LineMap {
    /// Line of the key or item at `path`, if it was located.
    pub fn line(&self, path: &[Segment]) -> Option<u32> {
        self.lines.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn record(&mut self, path: &[Segment], line: u32) {
        self.lines.entry(path.to_vec()).or_insert(line);
    }

    /// Locate keys and elements in JSON text.
    pub fn json(text: &str) -> Self {
        let mut scanner = JsonScanner {
            bytes: text.as_bytes(),
            pos: 0,
            line: 1,
            path: Vec::new(),
            map: LineMap::default(),
        };
        scanner.value();
        scanner.map
    }

    /// Locate keys and items in block-style YAML text.
    pub fn yaml(text: &str) -> Self {
        let mut scanner = YamlScanner::default();
        for (i, raw) in text.lines().enumerate() {
            scanner.line(u32::try_from(i + 1).unwrap_or(u32::MAX), raw);
        }
        scanner.map
    }
}

// ── JSON ────────────────────────────────────────────────────────────

struct JsonScanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    path: Vec<Segment>,
    map: LineMap,
}

impl JsonScanner<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.bump();
        }
    }

    fn value(&mut self) {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.object(),
            Some(b'[') => self.array(),
            Some(b'"') => {
                self.string();
            }
            Some(_) => {
                while let Some(b) = self.peek() {
                    if matches!(b, b',' | b']' | b'}' | b' ' | b'\t' | b'\r' | b'\n') {
                        break;
                    }
                    self.bump();
                }
            }
            None => {}
        }
    }

    fn object(&mut self) {
        self.bump();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return,
                Some(b'}') => {
                    self.bump();
                    return;
                }
                Some(b'"') => {
                    let line = self.line;
                    let key = self.string();
                    self.skip_ws();
                    if self.peek() == Some(b':') {
                        self.bump();
                    }
                    self.path.push(Segment::Key(key));
                    self.map.record(&self.path, line);
                    self.value();
                    self.path.pop();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn array(&mut self) {
        self.bump();
        let mut index = 0;
        loop {
            self.skip_ws();
            match self.peek() {
                None => return,
                Some(b']') => {
                    self.bump();
                    return;
                }
                Some(b',') => {
                    self.bump();
                }
                Some(_) => {
                    self.path.push(Segment::Index(index));
                    self.map.record(&self.path, self.line);
                    let before = self.pos;
                    self.value();
                    self.path.pop();
                    index += 1;
                    if self.pos == before {
                        self.bump();
                    }
                }
            }
        }
    }

    /// Consume a string literal and return its decoded contents.
    fn string(&mut self) -> String {
        self.bump();
        let mut out: Vec<u8> = Vec::new();
        while let Some(b) = self.bump() {
            match b {
                b'"' => break,
                b'\\' => match self.bump() {
                    Some(b'n') => out.push(b'\n'),
                    Some(b't') => out.push(b'\t'),
                    Some(b'r') => out.push(b'\r'),
                    Some(b'b') => out.push(0x08),
                    Some(b'f') => out.push(0x0c),
                    Some(b'u') => {
                        let mut code = 0u32;
                        for _ in 0..4 {
                            let digit = self.bump().and_then(|h| char::from(h).to_digit(16));
                            code = code * 16 + digit.unwrap_or(0);
                        }
                        let c = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    }
                    Some(other) => out.push(other),
                    None => break,
                },
                other => out.push(other),
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

// ── YAML ────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Frame {
    indent: usize,
    path: Vec<Segment>,
    /// Next item index when the frame is a sequence.
    next_index: Option<usize>,
}

#[derive(Debug, Default)]
struct YamlScanner {
    frames: Vec<Frame>,
    /// Path and owner indent of a key or item whose value is a nested block.
    pending: Option<(usize, Vec<Segment>)>,
    /// Owner indent of a block scalar whose body is being skipped.
    block_scalar: Option<usize>,
    /// Open brackets of a multi-line flow collection.
    flow_depth: i32,
    map: LineMap,
}

impl YamlScanner {
    fn line(&mut self, number: u32, raw: &str) {
        let content = raw.trim_start_matches(' ');
        let indent = raw.len() - content.len();
        let content = content.trim_end();

        if self.flow_depth > 0 {
            self.flow_depth += bracket_balance(content);
            return;
        }
        if let Some(owner) = self.block_scalar {
            if content.is_empty() || indent > owner {
                return;
            }
            self.block_scalar = None;
        }
        if content.is_empty()
            || content.starts_with('#')
            || content.starts_with("---")
            || content.starts_with("...")
            || content.starts_with('%')
        {
            return;
        }

        if is_item(content) {
            self.item(number, indent, content);
        } else if let Some((key, rest)) = split_key(content) {
            self.key(number, indent, key, rest);
        }
    }

    fn item(&mut self, number: u32, indent: usize, content: &str) {
        while self.frames.last().is_some_and(|f| f.indent > indent) {
            self.frames.pop();
        }

        let continues_sequence = self
            .frames
            .last()
            .is_some_and(|f| f.indent == indent && f.next_index.is_some());
        if !continues_sequence {
            let path = match self.pending.take() {
                Some((owner, path)) if owner <= indent => path,
                _ if self.frames.is_empty() => Vec::new(),
                _ => return,
            };
            self.frames.push(Frame {
                indent,
                path,
                next_index: Some(0),
            });
        }
        self.pending = None;

        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        let index = frame.next_index.unwrap_or(0);
        frame.next_index = Some(index + 1);
        let mut path = frame.path.clone();
        path.push(Segment::Index(index));
        self.map.record(&path, number);

        let rest = content[1..].trim_start_matches(' ');
        let rest_indent = indent + (content.len() - rest.len());
        if rest.is_empty() || rest.starts_with('#') {
            self.pending = Some((indent, path));
        } else if let Some((key, value)) = split_key(rest) {
            self.frames.push(Frame {
                indent: rest_indent,
                path,
                next_index: None,
            });
            self.key(number, rest_indent, key, value);
        } else {
            self.scalar(indent, rest);
        }
    }

    fn key(&mut self, number: u32, indent: usize, key: String, rest: &str) {
        while self
            .frames
            .last()
            .is_some_and(|f| f.indent > indent || (f.indent == indent && f.next_index.is_some()))
        {
            self.frames.pop();
        }

        let same_mapping = self
            .frames
            .last()
            .is_some_and(|f| f.indent == indent && f.next_index.is_none());
        if !same_mapping {
            let path = match self.pending.take() {
                Some((owner, path)) if owner < indent => path,
                _ if self.frames.is_empty() => Vec::new(),
                _ => return,
            };
            self.frames.push(Frame {
                indent,
                path,
                next_index: None,
            });
        }
        self.pending = None;

        let Some(frame) = self.frames.last() else {
            return;
        };
        let mut path = frame.path.clone();
        path.push(Segment::Key(key));
        self.map.record(&path, number);

        let value = strip_properties(rest);
        if value.is_empty() || value.starts_with('#') {
            self.pending = Some((indent, path));
        } else {
            self.scalar(indent, value);
        }
    }

    fn scalar(&mut self, owner: usize, value: &str) {
        let value = strip_properties(value);
        if value.starts_with('|') || value.starts_with('>') {
            self.block_scalar = Some(owner);
        } else if value.starts_with('[') || value.starts_with('{') {
            self.flow_depth = bracket_balance(value).max(0);
        }
    }
}

fn is_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Split `key: rest` into the unquoted key and the text after the colon.
fn split_key(content: &str) -> Option<(String, &str)> {
    let (key, after) = match content.chars().next()? {
        quote @ ('"' | '\'') => {
            let end = closing_quote(content, quote)?;
            let key = unquote(&content[1..end], quote);
            (key, content[end + 1..].trim_start())
        }
        '[' | '{' | '?' | '&' | '*' | '!' | '|' | '>' => return None,
        _ => {
            let bytes = content.as_bytes();
            let colon = (0..bytes.len()).find(|&i| {
                bytes[i] == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ')
            })?;
            let key = content[..colon].trim_end();
            if key.contains(" #") {
                return None;
            }
            (key.to_string(), &content[colon..])
        }
    };
    let rest = after.strip_prefix(':')?;
    if !(rest.is_empty() || rest.starts_with(' ')) {
        return None;
    }
    Some((key, rest.trim_start()))
}

fn closing_quote(content: &str, quote: char) -> Option<usize> {
    let bytes = content.as_bytes();
    let q = quote as u8;
    let mut i = 1;
    while i < bytes.len() {
        if quote == '"' && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == q {
            if quote == '\'' && bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

fn unquote(inner: &str, quote: char) -> String {
    if quote == '\'' {
        return inner.replace("''", "'");
    }
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Drop leading anchors (`&a`) and tags (`!t`) from a value.
fn strip_properties(mut value: &str) -> &str {
    loop {
        value = value.trim_start();
        if value.starts_with('&') || value.starts_with('!') {
            value = value.find(' ').map_or("", |i| &value[i..]);
        } else {
            return value;
        }
    }
}

/// Net count of opening minus closing brackets outside quotes.
fn bracket_balance(s: &str) -> i32 {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '#') => break,
            (None, '[' | '{') => depth += 1,
            (None, ']' | '}') => depth -= 1,
            _ => {}
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> Segment {
        Segment::Key(k.to_string())
    }

    #[test]
    fn test_json_keys_and_elements() {
        let text = "{\n  \"name\": \"svc\",\n  \"ports\": [\n    80,\n    443\n  ],\n  \"db\": {\"host\": \"x\"}\n}";
        let map = LineMap::json(text);
        assert_eq!(map.line(&[key("name")]), Some(2));
        assert_eq!(map.line(&[key("ports")]), Some(3));
        assert_eq!(map.line(&[key("ports"), Segment::Index(1)]), Some(5));
        assert_eq!(map.line(&[key("db"), key("host")]), Some(7));
    }

    #[test]
    fn test_json_escaped_keys() {
        let map = LineMap::json(r#"{"a\"b": 1, "A": 2}"#);
        assert_eq!(map.line(&[key("a\"b")]), Some(1));
        assert_eq!(map.line(&[key("A")]), Some(1));
    }

    #[test]
    fn test_yaml_nested_mappings() {
        let text = "name: svc\ndb:\n  host: localhost\n  port: 5432\nreplicas: 3\n";
        let map = LineMap::yaml(text);
        assert_eq!(map.line(&[key("name")]), Some(1));
        assert_eq!(map.line(&[key("db"), key("host")]), Some(3));
        assert_eq!(map.line(&[key("db"), key("port")]), Some(4));
        assert_eq!(map.line(&[key("replicas")]), Some(5));
    }

    #[test]
    fn test_yaml_sequences_indented_and_compact() {
        let text = "ports:\n  - 80\n  - 443\nhosts:\n- a\n- b\nname: x\n";
        let map = LineMap::yaml(text);
        assert_eq!(map.line(&[key("ports"), Segment::Index(1)]), Some(3));
        assert_eq!(map.line(&[key("hosts"), Segment::Index(0)]), Some(5));
        assert_eq!(map.line(&[key("hosts"), Segment::Index(1)]), Some(6));
        assert_eq!(map.line(&[key("name")]), Some(7));
    }

    #[test]
    fn test_yaml_mappings_inside_items() {
        let text = "services:\n  - name: web\n    port: 80\n  - name: db\n    port: 5432\n";
        let map = LineMap::yaml(text);
        let item = |i: usize, k: &str| vec![key("services"), Segment::Index(i), key(k)];
        assert_eq!(map.line(&item(0, "name")), Some(2));
        assert_eq!(map.line(&item(0, "port")), Some(3));
        assert_eq!(map.line(&item(1, "name")), Some(4));
        assert_eq!(map.line(&item(1, "port")), Some(5));
    }

    #[test]
    fn test_yaml_block_scalars_are_skipped() {
        let text = "script: |\n  a: not a key\n  b: neither\nname: x\n";
        let map = LineMap::yaml(text);
        assert_eq!(map.line(&[key("name")]), Some(4));
        assert_eq!(map.line(&[key("a")]), None);
    }

    #[test]
    fn test_yaml_flow_collections_are_skipped() {
        let text = "tags: [\n  a: 1,\n  b\n]\nname: x\n";
        let map = LineMap::yaml(text);
        assert_eq!(map.line(&[key("tags")]), Some(1));
        assert_eq!(map.line(&[key("name")]), Some(5));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_yaml_quoted_keys_comments_and_markers() {
        let text = "---\n# comment\n\"a b\": 1 # trailing\n'it''s': 2\nurl: http://x\n";
        let map = LineMap::yaml(text);
        assert_eq!(map.line(&[key("a b")]), Some(3));
        assert_eq!(map.line(&[key("it's")]), Some(4));
        assert_eq!(map.line(&[key("url")]), Some(5));
    }

    #[test]
    fn test_yaml_anchor_before_nested_block() {
        let text = "base: &base\n  a: 1\n";
        let map = LineMap::yaml(text);
        assert_eq!(map.line(&[key("base"), key("a")]), Some(2));
    }

    #[test]
    fn test_yaml_root_sequence() {
        let map = LineMap::yaml("- a\n- b\n");
        assert_eq!(map.line(&[Segment::Index(1)]), Some(2));
    }
}

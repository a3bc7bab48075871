//! Source positions attached to schema declarations and document values.

use std::fmt;
use std::sync::Arc;

/// Where a position was recorded.
///
/// Document positions sort ahead of schema positions so that diagnostics
/// point at the config file first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// A config document decoded from YAML or JSON.
    Document,
    /// A schema source file.
    Schema,
}

/// A 1-based line/column location in a named source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pos {
    file: Arc<str>,
    line: u32,
    column: u32,
    origin: Origin,
}

impl Pos {
    /// A position inside a schema source.
    pub fn schema(file: Arc<str>, line: u32, column: u32) -> Self {
        Self {
            file,
            line,
            column,
            origin: Origin::Schema,
        }
    }

    /// A position inside a config document. Column is not tracked.
    pub fn document(file: Arc<str>, line: u32) -> Self {
        Self {
            file,
            line,
            column: 0,
            origin: Origin::Document,
        }
    }

    /// Source name.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// 1-based line, or 0 if unknown.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column, or 0 if not tracked.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Which kind of source this position points into.
    pub fn origin(&self) -> Origin {
        self.origin
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column > 0 {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.file, self.line)
        }
    }
}

/// Merge two position lists, keeping document positions first and
/// dropping duplicates.
pub(crate) fn merge_positions(a: &[Pos], b: &[Pos]) -> Vec<Pos> {
    let mut out: Vec<Pos> = Vec::with_capacity(a.len() + b.len());
    for p in a.iter().chain(b) {
        if !out.contains(p) {
            out.push(p.clone());
        }
    }
    out.sort_by_key(Pos::origin);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_positions_sort_first() {
        let schema = Pos::schema("s.cue".into(), 3, 2);
        let doc = Pos::document("c.yaml".into(), 7);
        let merged = merge_positions(&[schema.clone()], &[doc.clone()]);
        assert_eq!(merged, vec![doc, schema]);
    }

    #[test]
    fn test_merge_drops_duplicates() {
        let p = Pos::schema("s.cue".into(), 1, 1);
        assert_eq!(merge_positions(&[p.clone()], &[p.clone()]).len(), 1);
    }

    #[test]
    fn test_display_omits_untracked_column() {
        assert_eq!(Pos::document("c.yaml".into(), 4).to_string(), "c.yaml:4");
        assert_eq!(Pos::schema("s.cue".into(), 4, 9).to_string(), "s.cue:4:9");
    }
}

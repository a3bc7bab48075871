//! # Engine Errors
//!
//! Two failure families leave the engine:
//!
//! - [`CompileError`]: the schema source is malformed (syntax, unresolved
//!   reference, cycle, bad regular expression).
//! - [`ValidationFailure`]: a unified value is not fully concrete. It
//!   decomposes into independent [`Violation`] records, each carrying the
//!   path from the root to the offending field, every source position that
//!   contributed to it, and the message.

use std::fmt;

use thiserror::Error;

use crate::pos::Pos;

/// A lexical or grammatical error before positions are bound to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// One positioned compile diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileDiagnostic {
    pub pos: Pos,
    pub message: String,
}

impl fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

/// The schema source could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_diagnostics(.diagnostics))]
pub struct CompileError {
    diagnostics: Vec<CompileDiagnostic>,
}

impl CompileError {
    pub(crate) fn new(pos: Pos, message: impl Into<String>) -> Self {
        Self {
            diagnostics: vec![CompileDiagnostic {
                pos,
                message: message.into(),
            }],
        }
    }

    /// The individual diagnostics, in source order.
    pub fn diagnostics(&self) -> &[CompileDiagnostic] {
        &self.diagnostics
    }
}

fn join_diagnostics(diagnostics: &[CompileDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One independent way a value fails to be concrete and consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    path: Vec<String>,
    positions: Vec<Pos>,
    message: String,
}

impl Violation {
    pub fn new(path: Vec<String>, positions: Vec<Pos>, message: impl Into<String>) -> Self {
        Self {
            path,
            positions,
            message: message.into(),
        }
    }

    /// Path segments from the root: identifiers verbatim, other labels
    /// quoted, list indexes as `[N]`.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Every position that contributed to the offending value, document
    /// positions first.
    pub fn positions(&self) -> &[Pos] {
        &self.positions
    }

    /// The message without the path prefix.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return f.write_str(&self.message);
        }
        let mut first = true;
        for segment in &self.path {
            if !first && !segment.starts_with('[') {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        write!(f, ": {}", self.message)
    }
}

/// A value failed concreteness validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    violations: Vec<Violation>,
}

impl ValidationFailure {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// The independent violations, in discovery order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.as_slice() {
            [] => f.write_str("validation failed"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more errors)", rest.len()),
        }
    }
}

impl std::error::Error for ValidationFailure {}

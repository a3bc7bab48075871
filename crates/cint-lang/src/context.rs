//! # Engine Context
//!
//! [`Context`] is the shared handle every compile and unify call goes
//! through. It owns the compiled-regex cache and the interned source names
//! that positions point at. One context may be shared by any number of
//! threads; values compiled through it are plain data and can be unified
//! concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use regex::Regex;

use crate::error::{CompileError, SyntaxError};
use crate::eval::Compiler;
use crate::pos::Pos;
use crate::value::{Element, Field, Instance, Label, ListValue, Presence, StructValue, UnifiedValue, Value};
use crate::{lexer, parser, unify};

/// Shared engine state.
#[derive(Debug, Default)]
pub struct Context {
    regexes: Mutex<HashMap<String, Arc<Regex>>>,
    files: Mutex<HashSet<Arc<str>>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile schema source into a value.
    ///
    /// `filename` is recorded in every position of the result.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] for invalid UTF-8, lexical or grammar
    /// errors, unresolved references, structural cycles, and invalid
    /// regular expressions.
    pub fn compile(&self, source: &[u8], filename: &str) -> Result<Value, CompileError> {
        let file = self.intern(filename);
        let text = std::str::from_utf8(source).map_err(|e| {
            CompileError::new(Pos::schema(file.clone(), 1, 1), format!("invalid UTF-8: {e}"))
        })?;

        let syntax = |e: SyntaxError| {
            CompileError::new(Pos::schema(file.clone(), e.line, e.column), e.message)
        };
        let tokens = lexer::tokenize(text).map_err(syntax)?;
        let ast = parser::parse(tokens).map_err(syntax)?;
        tracing::debug!(file = %file, package = ?ast.package, "parsed schema");

        Compiler::new(self, file).compile_file(&ast)
    }

    /// Unify a definition looked up from a compiled schema with a document
    /// value. Conflicts are embedded in the result; call
    /// [`UnifiedValue::validate_concrete`] to collect them.
    pub fn unify(&self, definition: &Instance<'_>, document: &Value) -> UnifiedValue {
        unify::unify_instance(definition, document)
    }

    /// Intern a source name so that positions share one allocation.
    pub fn intern(&self, name: &str) -> Arc<str> {
        let mut files = self.files.lock();
        if let Some(existing) = files.get(name) {
            return existing.clone();
        }
        let interned: Arc<str> = Arc::from(name);
        files.insert(interned.clone());
        interned
    }

    pub(crate) fn regex(&self, source: &str) -> Result<Arc<Regex>, regex::Error> {
        let mut cache = self.regexes.lock();
        if let Some(re) = cache.get(source) {
            return Ok(re.clone());
        }
        let re = Arc::new(Regex::new(source)?);
        cache.insert(source.to_string(), re.clone());
        Ok(re)
    }
}

/// Assembles a document struct value key by key.
///
/// Document structs are open and every field is regular. Inserting a key
/// twice keeps the later value.
#[derive(Debug, Default)]
pub struct StructBuilder {
    value: StructValue,
}

impl StructBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value, pos: Option<Pos>) {
        let label = Label::regular(name);
        let positions: Vec<Pos> = pos.into_iter().collect();
        if let Some(existing) = self.value.field_mut(label.name()) {
            existing.value = value;
            existing.positions = positions;
            return;
        }
        self.value.fields.push(Field {
            label,
            value,
            presence: Presence::Regular,
            positions,
        });
    }

    pub fn build(self) -> Value {
        Value::Struct(self.value)
    }
}

/// Assembles a document list value element by element.
#[derive(Debug, Default)]
pub struct ListBuilder {
    elements: Vec<Element>,
}

impl ListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value, pos: Option<Pos>) {
        self.elements.push(Element {
            value,
            positions: pos.into_iter().collect(),
        });
    }

    pub fn build(self) -> Value {
        Value::List(ListValue {
            elements: self.elements,
            tail: None,
        })
    }
}

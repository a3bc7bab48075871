//! # cint-lang: Constraint Language Engine
//!
//! A self-contained engine for the schema language cint validates against:
//! a CUE-style constraint language where types, bounds, enumerations and
//! concrete data are all values on one lattice, and checking a document
//! means unifying it with a definition.
//!
//! ## Pipeline
//!
//! ```text
//! source ──tokenize──▶ tokens ──parse──▶ AST ──compile──▶ Value
//!                                                          │
//!   document Value ───────────────────── unify ◀───────────┘
//!                                          │
//!                                 validate_concrete ──▶ Vec<Violation>
//! ```
//!
//! ## Supported Language
//!
//! - Basic kinds `null bool int float number string`, top `_`, bottom `_|_`.
//! - Literals, `&` conjunction, `|` disjunction with `*` defaults.
//! - Bounds `>= > <= < != =~ !~`.
//! - Structs with regular, optional `?` and required `!` fields,
//!   definitions `#Name` (closed), hidden `_name`, pattern constraints
//!   `[expr]: expr`, and `...` to reopen.
//! - Lists, with `...T` for open lists.
//! - Lexical references, including forward references.
//!
//! Imports, comprehensions, interpolation and arithmetic are not supported.
//!
//! ## Crate Policy
//!
//! - Depends on no other `cint-*` crate.
//! - No `unsafe` code.
//! - [`Context`] is `Send + Sync`; compiled values are immutable data.

pub mod ast;
mod concrete;
pub mod context;
pub mod error;
mod eval;
pub mod lexer;
pub mod parser;
pub mod pos;
mod unify;
pub mod value;

pub use context::{Context, ListBuilder, StructBuilder};
pub use error::{CompileDiagnostic, CompileError, SyntaxError, ValidationFailure, Violation};
pub use pos::{Origin, Pos};
pub use value::{Instance, Kinds, Label, LabelKind, Presence, UnifiedValue, Value};

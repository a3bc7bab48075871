//! # cint-schema: Validation Pipeline
//!
//! Connects config files to the constraint engine:
//!
//! 1. [`decode`] reads YAML or JSON into an engine value, attaching the
//!    document line of every key and list item.
//! 2. [`compile`] loads the schema once and checks it defines `#Config`.
//! 3. [`engine`] unifies each document with `#Config` and demands
//!    concreteness.
//! 4. [`diagnostic`] flattens engine violations into
//!    [`cint_core::ValidationError`] records.
//! 5. [`batch`] runs the above for every requested file and keeps each
//!    failure local to its own result.
//!
//! ## Crate Policy
//!
//! - Depends on `cint-core` and `cint-lang` internally.
//! - Nothing in this crate panics or returns early on a per-file error:
//!   failures are data by the time they leave [`batch`].

pub mod batch;
pub mod compile;
pub mod decode;
pub mod diagnostic;
pub mod engine;
pub mod locate;

pub use batch::{validate_file, validate_files, Validator};
pub use compile::{load_schema, LoadedSchema, CONFIG_DEFINITION};
pub use decode::decode_document;
pub use diagnostic::{extract_diagnostics, extract_line, format_field_path};
pub use engine::{validate_document, EngineError};
pub use locate::{LineMap, Segment};

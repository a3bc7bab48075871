//! # Error Types: Structured Error Hierarchy
//!
//! Defines the failure taxonomy of a validation run. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Schema errors are global: they pre-empt every per-file validation.
//! - File, decode and format errors are local to one input file.
//! - The `Display` output of every variant is the exact problem text shown
//!   to users, so CI logs stay stable across releases.

use thiserror::Error;

/// Top-level error type for cint.
#[derive(Error, Debug)]
pub enum CintError {
    /// The schema file could not be read.
    #[error("reading schema file: {0}")]
    SchemaRead(#[source] std::io::Error),

    /// The schema source failed to compile.
    #[error("compiling schema: {0}")]
    SchemaCompile(String),

    /// The schema compiled but lacks the expected top-level definition.
    #[error("schema does not define {0}")]
    MissingDefinition(String),

    /// A config file could not be read.
    #[error("failed to read file: {0}")]
    FileRead(#[source] std::io::Error),

    /// A config file has an extension no decoder handles.
    #[error("unsupported file format: {extension} (supported: {supported})")]
    UnsupportedFormat {
        /// The offending extension, lowercased, including the leading dot.
        extension: String,
        /// Comma-separated list of supported extensions.
        supported: String,
    },

    /// A config file is syntactically malformed for its format.
    #[error("failed to parse {format}: {reason}")]
    Decode {
        /// Human-readable format name (`YAML`, `JSON`).
        format: &'static str,
        /// The underlying decoder message.
        reason: String,
    },
}

impl CintError {
    /// Returns true for errors that invalidate the whole batch rather than
    /// a single file.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaRead(_) | Self::SchemaCompile(_) | Self::MissingDefinition(_)
        )
    }
}

//! # cint-core: Foundational Types for cint
//!
//! Defines the records every other cint crate produces or consumes:
//! per-file validation results, the structured diagnostic attached to each
//! failure, the table of supported document formats, and the error
//! taxonomy used across the pipeline.
//!
//! ## Key Design Principles
//!
//! 1. **Validity is derived, never stored.** [`ValidationResult::is_valid`]
//!    is computed from the error list, so the two can never disagree.
//!
//! 2. **Line numbers are unsigned.** `0` means "no position could be
//!    attributed"; a negative line is unrepresentable.
//!
//! 3. **Errors become data at the batch boundary.** [`CintError`] renders
//!    the exact problem text that ends up in a [`ValidationError`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cint-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod format;
pub mod result;

pub use error::CintError;
pub use format::{DocumentFormat, SUPPORTED_EXTENSIONS};
pub use result::{ValidationError, ValidationResult};

//! # Report Rendering
//!
//! Renders batch results for stdout. The text report is the CI-facing
//! default; the JSON report is the same data for machine consumers.

use std::fmt::Write as _;

use cint_core::ValidationResult;

/// Report format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `<path>: ok` or `FAIL: <path>` followed by indented diagnostics.
    #[default]
    Text,
    /// Pretty-printed JSON array of results.
    Json,
}

/// One block per file, in result order.
pub fn format_text(results: &[ValidationResult]) -> String {
    let mut out = String::new();
    for result in results {
        if result.is_valid() {
            let _ = writeln!(out, "{}: ok", result.file_name());
            continue;
        }
        let _ = writeln!(out, "FAIL: {}", result.file_name());
        for error in result.errors() {
            let _ = writeln!(out, "  {error}");
        }
    }
    out
}

/// `[{"file", "valid", "errors": [{"line", "field", "problem"}]}]`
///
/// # Errors
///
/// Propagates serializer failures.
pub fn format_json(results: &[ValidationResult]) -> serde_json::Result<String> {
    let mut rendered = serde_json::to_string_pretty(results)?;
    rendered.push('\n');
    Ok(rendered)
}

/// `0` iff every result is valid, otherwise `1`.
pub fn exit_code(results: &[ValidationResult]) -> u8 {
    if results.iter().all(ValidationResult::is_valid) {
        0
    } else {
        1
    }
}

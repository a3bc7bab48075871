//! # Validation Results
//!
//! One [`ValidationResult`] is produced per requested config file. It holds
//! an ordered list of [`ValidationError`] diagnostics, one per independent
//! constraint violation, and is valid exactly when that list is empty.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single diagnostic attached to a failing config file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationError {
    /// 1-based line number, or `0` when no position could be attributed.
    pub line: u32,
    /// Dot-joined field path (`spec.replicas`); empty for root or unknown.
    pub field: String,
    /// Human-readable description of the problem. Never empty.
    pub problem: String,
}

impl ValidationError {
    /// A diagnostic with no line or field attribution.
    pub fn message(problem: impl Into<String>) -> Self {
        Self {
            line: 0,
            field: String::new(),
            problem: problem.into(),
        }
    }

    /// A fully attributed diagnostic.
    pub fn new(line: u32, field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            line,
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    /// Renders the most specific combination of line and field available.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line > 0, self.field.is_empty()) {
            (true, false) => write!(
                f,
                "line {}, field \"{}\": {}",
                self.line, self.field, self.problem
            ),
            (true, true) => write!(f, "line {}: {}", self.line, self.problem),
            (false, false) => write!(f, "field \"{}\": {}", self.field, self.problem),
            (false, true) => f.write_str(&self.problem),
        }
    }
}

/// The outcome of validating one config file.
///
/// Validity is derived from the error list; there is no separate flag that
/// could drift out of sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ResultRecord", from = "ResultRecord")]
pub struct ValidationResult {
    file_name: String,
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// A passing result.
    pub fn valid(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            errors: Vec::new(),
        }
    }

    /// A result carrying the given diagnostics.
    ///
    /// An empty `errors` list yields a valid result.
    pub fn with_errors(file_name: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self {
            file_name: file_name.into(),
            errors,
        }
    }

    /// A failing result with one unattributed diagnostic.
    pub fn single(file_name: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::with_errors(file_name, vec![ValidationError::message(problem)])
    }

    /// The file identifier as requested by the caller.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// True iff the file produced no diagnostics.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The diagnostics, in the order they were discovered.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consumes self and returns the diagnostics.
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

/// Wire shape of a result: `valid` is written out for consumers but
/// recomputed on read.
#[derive(Serialize, Deserialize)]
struct ResultRecord {
    file: String,
    valid: bool,
    errors: Vec<ValidationError>,
}

impl From<ValidationResult> for ResultRecord {
    fn from(r: ValidationResult) -> Self {
        Self {
            valid: r.is_valid(),
            file: r.file_name,
            errors: r.errors,
        }
    }
}

impl From<ResultRecord> for ValidationResult {
    fn from(r: ResultRecord) -> Self {
        Self::with_errors(r.file, r.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_result_has_no_errors() {
        let r = ValidationResult::valid("a.yaml");
        assert!(r.is_valid());
        assert!(r.errors().is_empty());
        assert_eq!(r.file_name(), "a.yaml");
    }

    #[test]
    fn test_single_error_result_is_invalid() {
        let r = ValidationResult::single("a.yaml", "failed to read file: gone");
        assert!(!r.is_valid());
        assert_eq!(r.errors().len(), 1);
        assert_eq!(r.errors()[0].line, 0);
        assert_eq!(r.errors()[0].field, "");
    }

    #[test]
    fn test_empty_error_list_is_valid() {
        let r = ValidationResult::with_errors("a.json", Vec::new());
        assert!(r.is_valid());
    }

    #[test]
    fn test_display_picks_most_specific_form() {
        assert_eq!(
            ValidationError::new(4, "spec.replicas", "bad").to_string(),
            "line 4, field \"spec.replicas\": bad"
        );
        assert_eq!(ValidationError::new(4, "", "bad").to_string(), "line 4: bad");
        assert_eq!(
            ValidationError::new(0, "name", "bad").to_string(),
            "field \"name\": bad"
        );
        assert_eq!(ValidationError::message("bad").to_string(), "bad");
    }

    #[test]
    fn test_json_shape_includes_derived_validity() {
        let r = ValidationResult::with_errors(
            "svc.yaml",
            vec![ValidationError::new(2, "replicas", "out of bound")],
        );
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["file"], "svc.yaml");
        assert_eq!(v["valid"], false);
        assert_eq!(v["errors"][0]["line"], 2);
        assert_eq!(v["errors"][0]["field"], "replicas");
    }

    #[test]
    fn test_json_validity_is_recomputed_on_read() {
        let raw = r#"{"file":"x.json","valid":true,"errors":[{"line":0,"field":"","problem":"p"}]}"#;
        let r: ValidationResult = serde_json::from_str(raw).unwrap();
        assert!(!r.is_valid());
    }
}

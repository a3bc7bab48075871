//! # Diagnostic Extractor
//!
//! Normalizes an engine [`ValidationFailure`] into the flat
//! [`ValidationError`] records reported to users: one per independent
//! violation, each with the first known line, a dot-joined field path, and
//! the violation's own text.

use cint_core::ValidationError;
use cint_lang::{Pos, ValidationFailure};

use crate::compile::CONFIG_DEFINITION;

/// One [`ValidationError`] per violation, in discovery order.
///
/// Never returns an empty list: a failure without decomposable violations
/// yields a single error carrying the raw failure text.
pub fn extract_diagnostics(failure: &ValidationFailure) -> Vec<ValidationError> {
    if failure.violations().is_empty() {
        return vec![ValidationError::message(failure.to_string())];
    }
    failure
        .violations()
        .iter()
        .map(|v| {
            ValidationError::new(
                extract_line(v.positions()),
                format_field_path(v.path()),
                v.to_string(),
            )
        })
        .collect()
}

/// The first positive line among `positions`, or 0.
pub fn extract_line(positions: &[Pos]) -> u32 {
    positions
        .iter()
        .map(Pos::line)
        .find(|&line| line > 0)
        .unwrap_or(0)
}

/// Join path segments with `.`, dropping empty segments, list indexes, and
/// the root definition name, and trimming stray quotes.
pub fn format_field_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.is_empty() && !s.starts_with('[') && *s != CONFIG_DEFINITION)
        .map(|s| s.trim_matches('"'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cint_lang::Violation;

    use super::*;

    #[test]
    fn test_path_drops_root_and_indexes() {
        assert_eq!(format_field_path(&["#Config", "spec", "replicas"]), "spec.replicas");
        assert_eq!(format_field_path(&["#Config", "ports", "[0]", "name"]), "ports.name");
        assert_eq!(format_field_path(&["#Config"]), "");
        assert_eq!(format_field_path::<&str>(&[]), "");
    }

    #[test]
    fn test_path_trims_quotes_and_skips_empty() {
        assert_eq!(format_field_path(&["", "\"app.kubernetes.io/name\""]), "app.kubernetes.io/name");
    }

    #[test]
    fn test_line_prefers_first_positive() {
        let file: Arc<str> = Arc::from("c.yaml");
        let positions = vec![
            Pos::document(file.clone(), 0),
            Pos::document(file.clone(), 7),
            Pos::schema(Arc::from("s.cue"), 3, 2),
        ];
        assert_eq!(extract_line(&positions), 7);
        assert_eq!(extract_line(&[]), 0);
    }

    #[test]
    fn test_each_violation_becomes_one_error() {
        let file: Arc<str> = Arc::from("c.yaml");
        let failure = ValidationFailure::new(vec![
            Violation::new(
                vec!["#Config".into(), "replicas".into()],
                vec![Pos::document(file.clone(), 4)],
                "invalid value 0 (out of bound >=1)",
            ),
            Violation::new(vec!["#Config".into(), "name".into()], Vec::new(), "incomplete value string"),
        ]);
        let errors = extract_diagnostics(&failure);
        assert_eq!(
            errors,
            vec![
                ValidationError::new(
                    4,
                    "replicas",
                    "#Config.replicas: invalid value 0 (out of bound >=1)"
                ),
                ValidationError::new(0, "name", "#Config.name: incomplete value string"),
            ]
        );
    }

    #[test]
    fn test_empty_failure_falls_back_to_raw_message() {
        let errors = extract_diagnostics(&ValidationFailure::new(Vec::new()));
        assert_eq!(errors, vec![ValidationError::message("validation failed")]);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn segment() -> impl Strategy<Value = String> {
            prop_oneof![
                "[a-z_]{1,8}",
                Just("#Config".to_string()),
                Just(String::new()),
                (0u32..20).prop_map(|i| format!("[{i}]")),
                "[a-z]{1,5}".prop_map(|s| format!("\"{s}\"")),
            ]
        }

        proptest! {
            #[test]
            fn test_filtering_is_idempotent(segments in prop::collection::vec(segment(), 0..8)) {
                let once = format_field_path(segments.as_slice());
                let parts: Vec<&str> = if once.is_empty() { Vec::new() } else { once.split('.').collect() };
                prop_assert_eq!(format_field_path(parts.as_slice()), once.clone());
                prop_assert!(!once.contains('['));
                prop_assert!(!once.split('.').any(|s| s == "#Config"));
            }

            #[test]
            fn test_line_is_first_positive_or_zero(lines in prop::collection::vec(0u32..50, 0..6)) {
                let file: Arc<str> = Arc::from("c.yaml");
                let positions: Vec<Pos> = lines.iter().map(|&l| Pos::document(file.clone(), l)).collect();
                let expected = lines.iter().copied().find(|&l| l > 0).unwrap_or(0);
                prop_assert_eq!(extract_line(&positions), expected);
            }
        }
    }
}

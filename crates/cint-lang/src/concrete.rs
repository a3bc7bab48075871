//! Concreteness validation.
//!
//! Walks a unified value and records one [`Violation`] for every conflict
//! or unresolved constraint reachable through regular fields and list
//! elements. Definitions, hidden fields and optional fields are not data
//! and are skipped.

use crate::error::{ValidationFailure, Violation};
use crate::pos::Pos;
use crate::value::{Presence, Value};

pub(crate) fn validate(
    value: &Value,
    path: &[String],
    positions: &[Pos],
) -> Result<(), ValidationFailure> {
    let mut walker = Walker {
        path: path.to_vec(),
        violations: Vec::new(),
    };
    walker.walk(value, positions);
    if walker.violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure::new(walker.violations))
    }
}

struct Walker {
    path: Vec<String>,
    violations: Vec<Violation>,
}

impl Walker {
    fn report(&mut self, positions: &[Pos], message: String) {
        self.violations
            .push(Violation::new(self.path.clone(), positions.to_vec(), message));
    }

    fn walk(&mut self, value: &Value, positions: &[Pos]) {
        match value {
            Value::Bottom(message) => self.report(positions, message.clone()),
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => {}
            Value::Top | Value::Kind(_) | Value::Bound(_) | Value::Conjunction(_) => {
                self.report(positions, format!("incomplete value {value}"));
            }
            Value::Disjunction(d) => match d.default_value() {
                Some(default) => self.walk(default, positions),
                None => self.report(positions, format!("incomplete value {value}")),
            },
            Value::Struct(s) => {
                for field in s.fields.iter().filter(|f| f.label.is_regular()) {
                    match field.presence {
                        Presence::Optional => {}
                        Presence::Required => {
                            self.path.push(field.label.segment());
                            self.report(
                                &field.positions,
                                "field is required but not present".to_string(),
                            );
                            self.path.pop();
                        }
                        Presence::Regular => {
                            self.path.push(field.label.segment());
                            self.walk(&field.value, &field.positions);
                            self.path.pop();
                        }
                    }
                }
            }
            Value::List(list) => {
                for (i, element) in list.elements.iter().enumerate() {
                    self.path.push(format!("[{i}]"));
                    self.walk(&element.value, &element.positions);
                    self.path.pop();
                }
            }
        }
    }
}

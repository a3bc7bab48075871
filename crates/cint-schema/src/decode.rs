//! # Document Decoder
//!
//! Turns the raw bytes of a config file into an engine [`Value`]. The
//! format is chosen from the lowercased extension before any decoding is
//! attempted. Every decoded mapping key and sequence item carries the
//! document line it was found on, so violations can point back into the
//! config file.

use std::path::Path;
use std::sync::Arc;

use cint_core::{CintError, DocumentFormat};
use cint_lang::{Context, ListBuilder, Pos, StructBuilder, Value};

use crate::locate::{LineMap, Segment};

/// Decode a config document.
///
/// # Errors
///
/// Returns [`CintError::UnsupportedFormat`] for an unknown extension and
/// [`CintError::Decode`] for malformed YAML or JSON.
pub fn decode_document(ctx: &Context, path: &Path, bytes: &[u8]) -> Result<Value, CintError> {
    let format = DocumentFormat::from_path(path)?;
    let file = ctx.intern(&path.display().to_string());
    let text = String::from_utf8_lossy(bytes);

    match format {
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_slice(bytes).map_err(|e| decode_error(format, e))?;
            let lines = LineMap::yaml(&text);
            Converter::new(file, &lines)
                .yaml(&yaml)
                .map_err(|reason| CintError::Decode {
                    format: format.name(),
                    reason,
                })
        }
        DocumentFormat::Json => {
            let json: serde_json::Value =
                serde_json::from_slice(bytes).map_err(|e| decode_error(format, e))?;
            let lines = LineMap::json(&text);
            Ok(Converter::new(file, &lines).json(&json))
        }
    }
}

fn decode_error(format: DocumentFormat, e: impl std::fmt::Display) -> CintError {
    CintError::Decode {
        format: format.name(),
        reason: e.to_string(),
    }
}

struct Converter<'a> {
    file: Arc<str>,
    lines: &'a LineMap,
    path: Vec<Segment>,
}

impl<'a> Converter<'a> {
    fn new(file: Arc<str>, lines: &'a LineMap) -> Self {
        Self {
            file,
            lines,
            path: Vec::new(),
        }
    }

    fn pos(&self) -> Option<Pos> {
        self.lines
            .line(&self.path)
            .map(|line| Pos::document(self.file.clone(), line))
    }

    fn yaml(&mut self, yaml: &serde_yaml::Value) -> Result<Value, String> {
        match yaml {
            serde_yaml::Value::Null => Ok(Value::Null),
            serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i128::from(i)))
                } else if let Some(u) = n.as_u64() {
                    Ok(Value::Int(i128::from(u)))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(format!("unsupported YAML number: {n}"))
                }
            }
            serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
            serde_yaml::Value::Sequence(seq) => {
                let mut list = ListBuilder::new();
                for (i, item) in seq.iter().enumerate() {
                    self.path.push(Segment::Index(i));
                    let value = self.yaml(item)?;
                    let pos = self.pos();
                    self.path.pop();
                    list.push(value, pos);
                }
                Ok(list.build())
            }
            serde_yaml::Value::Mapping(map) => {
                let mut fields = StructBuilder::new();
                for (k, v) in map {
                    let key = match k {
                        serde_yaml::Value::String(s) => s.clone(),
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        serde_yaml::Value::Null => "null".to_string(),
                        other => return Err(format!("unsupported YAML map key type: {other:?}")),
                    };
                    self.path.push(Segment::Key(key.clone()));
                    let value = self.yaml(v)?;
                    let pos = self.pos();
                    self.path.pop();
                    fields.insert(key, value, pos);
                }
                Ok(fields.build())
            }
            // Tags carry no meaning for validation.
            serde_yaml::Value::Tagged(tagged) => self.yaml(&tagged.value),
        }
    }

    fn json(&mut self, json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Int(i128::from(u))
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                let mut list = ListBuilder::new();
                for (i, item) in items.iter().enumerate() {
                    self.path.push(Segment::Index(i));
                    let value = self.json(item);
                    let pos = self.pos();
                    self.path.pop();
                    list.push(value, pos);
                }
                list.build()
            }
            serde_json::Value::Object(map) => {
                let mut fields = StructBuilder::new();
                for (key, v) in map {
                    self.path.push(Segment::Key(key.clone()));
                    let value = self.json(v);
                    let pos = self.pos();
                    self.path.pop();
                    fields.insert(key.clone(), value, pos);
                }
                fields.build()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(name: &str, text: &str) -> Result<Value, CintError> {
        decode_document(&Context::new(), Path::new(name), text.as_bytes())
    }

    fn field<'v>(v: &'v Value, name: &str) -> &'v cint_lang::value::Field {
        let Value::Struct(s) = v else {
            panic!("expected struct, got {v}");
        };
        s.field(name).unwrap()
    }

    #[test]
    fn test_yaml_scalars_map_to_engine_values() {
        let v = decode("c.yaml", "name: svc\nreplicas: 3\nratio: 0.5\ndebug: true\nnote: null\n").unwrap();
        assert_eq!(field(&v, "name").value, Value::String("svc".into()));
        assert_eq!(field(&v, "replicas").value, Value::Int(3));
        assert_eq!(field(&v, "ratio").value, Value::Float(0.5));
        assert_eq!(field(&v, "debug").value, Value::Bool(true));
        assert_eq!(field(&v, "note").value, Value::Null);
    }

    #[test]
    fn test_yaml_fields_carry_document_lines() {
        let v = decode("c.yaml", "name: svc\n\nreplicas: 3\n").unwrap();
        let pos = &field(&v, "replicas").positions[0];
        assert_eq!((pos.file(), pos.line()), ("c.yaml", 3));
    }

    #[test]
    fn test_json_fields_carry_document_lines() {
        let v = decode("c.json", "{\n  \"name\": \"svc\",\n  \"replicas\": 3\n}").unwrap();
        assert_eq!(field(&v, "replicas").positions[0].line(), 3);
        assert_eq!(field(&v, "replicas").value, Value::Int(3));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert!(decode("C.YML", "a: 1").is_ok());
        assert!(decode("c.JSON", "{}").is_ok());
    }

    #[test]
    fn test_unsupported_extension_is_rejected_before_decoding() {
        let err = decode("c.toml", "not even toml").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported file format: .toml (supported: .yaml, .yml, .json)"
        );
    }

    #[test]
    fn test_malformed_yaml_is_a_decode_error() {
        let err = decode("c.yaml", "name: [unclosed\n").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse YAML: "), "{err}");
    }

    #[test]
    fn test_malformed_json_is_a_decode_error() {
        let err = decode("c.json", "{\"name\": ").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse JSON: "), "{err}");
    }

    #[test]
    fn test_yaml_non_string_keys_are_stringified() {
        let v = decode("c.yaml", "8080: http\ntrue: yes\n").unwrap();
        assert_eq!(field(&v, "8080").value, Value::String("http".into()));
        assert_eq!(field(&v, "true").value, Value::String("yes".into()));
    }

    #[test]
    fn test_yaml_tags_are_ignored() {
        let v = decode("c.yaml", "port: !custom 80\n").unwrap();
        assert_eq!(field(&v, "port").value, Value::Int(80));
    }

    #[test]
    fn test_json_key_order_is_preserved() {
        let v = decode("c.json", r#"{"b": 1, "a": 2}"#).unwrap();
        let Value::Struct(s) = v else { panic!() };
        let names: Vec<_> = s.fields.iter().map(|f| f.label.name().to_string()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_empty_yaml_is_null() {
        assert_eq!(decode("c.yaml", "").unwrap(), Value::Null);
    }
}

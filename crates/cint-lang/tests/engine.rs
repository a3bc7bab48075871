//! Integration test: compile schemas, unify them with hand-built documents,
//! and check the violations that come back.

use std::sync::Arc;

use cint_lang::{Context, ListBuilder, Origin, Pos, StructBuilder, Value, Violation};

const SCHEMA: &str = r#"
package config

#Port: int & >=1 & <=65535

#Config: {
	name:        string & =~"^[a-z][a-z0-9-]*$"
	port:        #Port
	replicas:    int & >=1 & <=10
	environment: "development" | "staging" | "production"
	log_level:   *"info" | "debug" | "warn" | "error"
	debug?:      bool
	labels?: {[string]: string}
	tags?: [...string]
}
"#;

fn doc_pos(line: u32) -> Option<Pos> {
    Some(Pos::document(Arc::from("config.yaml"), line))
}

fn valid_document() -> StructBuilder {
    let mut doc = StructBuilder::new();
    doc.insert("name", Value::String("my-service".into()), doc_pos(1));
    doc.insert("port", Value::Int(8080), doc_pos(2));
    doc.insert("replicas", Value::Int(3), doc_pos(3));
    doc.insert("environment", Value::String("production".into()), doc_pos(4));
    doc
}

fn violations(ctx: &Context, doc: Value) -> Vec<Violation> {
    let schema = ctx.compile(SCHEMA.as_bytes(), "schema.cue").expect("schema compiles");
    let def = schema.lookup("#Config").expect("#Config defined");
    match ctx.unify(&def, &doc).validate_concrete() {
        Ok(()) => Vec::new(),
        Err(failure) => failure.into_violations(),
    }
}

#[test]
fn test_valid_document_passes() {
    let ctx = Context::new();
    assert!(violations(&ctx, valid_document().build()).is_empty());
}

#[test]
fn test_default_fills_missing_field() {
    let ctx = Context::new();
    let schema = ctx.compile(SCHEMA.as_bytes(), "schema.cue").unwrap();
    let def = schema.lookup("#Config").unwrap();
    let unified = ctx.unify(&def, &valid_document().build());
    let Value::Struct(s) = unified.value() else {
        panic!("expected struct");
    };
    let Value::Disjunction(d) = &s.field("log_level").unwrap().value else {
        panic!("expected disjunction");
    };
    assert_eq!(d.default_value(), Some(&Value::String("info".into())));
}

#[test]
fn test_type_mismatch_points_at_document_line_first() {
    let ctx = Context::new();
    let mut doc = valid_document();
    doc.insert("port", Value::String("eighty".into()), doc_pos(2));
    let v = violations(&ctx, doc.build());
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].path(), ["#Config", "port"]);
    assert!(v[0].message().contains("mismatched types"), "{}", v[0]);
    assert_eq!(v[0].positions()[0].origin(), Origin::Document);
    assert_eq!(v[0].positions()[0].line(), 2);
    assert!(v[0]
        .positions()
        .iter()
        .any(|p| p.origin() == Origin::Schema && p.file() == "schema.cue"));
}

#[test]
fn test_out_of_range_reports_bound() {
    let ctx = Context::new();
    let mut doc = valid_document();
    doc.insert("replicas", Value::Int(100), doc_pos(3));
    let v = violations(&ctx, doc.build());
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].message(), "invalid value 100 (out of bound <=10)");
}

#[test]
fn test_missing_required_field_is_incomplete() {
    let ctx = Context::new();
    let mut doc = StructBuilder::new();
    doc.insert("name", Value::String("svc".into()), doc_pos(1));
    doc.insert("replicas", Value::Int(1), doc_pos(2));
    doc.insert("environment", Value::String("staging".into()), doc_pos(3));
    let v = violations(&ctx, doc.build());
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].to_string(), "#Config.port: incomplete value int & >=1 & <=65535");
    assert!(v[0].positions().iter().all(|p| p.origin() == Origin::Schema));
}

#[test]
fn test_unknown_field_is_not_allowed() {
    let ctx = Context::new();
    let mut doc = valid_document();
    doc.insert("unknown_field", Value::Bool(true), doc_pos(5));
    let v = violations(&ctx, doc.build());
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].to_string(), "#Config.unknown_field: field not allowed");
    assert_eq!(v[0].positions()[0].line(), 5);
}

#[test]
fn test_enum_miss_lists_every_alternative() {
    let ctx = Context::new();
    let mut doc = valid_document();
    doc.insert("environment", Value::String("dev".into()), doc_pos(4));
    let v = violations(&ctx, doc.build());
    assert_eq!(v.len(), 1);
    assert!(v[0].message().starts_with("3 errors in empty disjunction"), "{}", v[0]);
}

#[test]
fn test_independent_violations_are_all_reported() {
    let ctx = Context::new();
    let mut doc = valid_document();
    doc.insert("name", Value::String("Bad_Name".into()), doc_pos(1));
    doc.insert("port", Value::Int(0), doc_pos(2));
    doc.insert("extra", Value::Null, doc_pos(6));
    let v = violations(&ctx, doc.build());
    let paths: Vec<_> = v.iter().map(|x| x.path().join(".")).collect();
    assert_eq!(paths, ["#Config.name", "#Config.port", "#Config.extra"]);
}

#[test]
fn test_pattern_constraint_checks_map_values() {
    let ctx = Context::new();
    let mut labels = StructBuilder::new();
    labels.insert("team", Value::String("core".into()), doc_pos(6));
    labels.insert("tier", Value::Int(1), doc_pos(7));
    let mut doc = valid_document();
    doc.insert("labels", labels.build(), doc_pos(5));
    let v = violations(&ctx, doc.build());
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].path(), ["#Config", "labels", "tier"]);
}

#[test]
fn test_open_list_checks_each_element() {
    let ctx = Context::new();
    let mut tags = ListBuilder::new();
    tags.push(Value::String("a".into()), doc_pos(6));
    tags.push(Value::Int(2), doc_pos(7));
    let mut doc = valid_document();
    doc.insert("tags", tags.build(), doc_pos(5));
    let v = violations(&ctx, doc.build());
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].to_string().split(':').next(), Some("#Config.tags[1]"));
    assert_eq!(v[0].positions()[0].line(), 7);
}

#[test]
fn test_float_is_not_an_int() {
    let ctx = Context::new();
    let mut doc = valid_document();
    doc.insert("replicas", Value::Float(2.5), doc_pos(3));
    assert_eq!(violations(&ctx, doc.build()).len(), 1);
}

#[test]
fn test_schema_without_config_has_no_definition() {
    let ctx = Context::new();
    let schema = ctx.compile(b"#Other: { a: int }", "s.cue").unwrap();
    assert!(schema.lookup("#Config").is_none());
}

#[test]
fn test_context_is_shared_across_threads() {
    let ctx = Arc::new(Context::new());
    let schema = Arc::new(ctx.compile(SCHEMA.as_bytes(), "schema.cue").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ctx = Arc::clone(&ctx);
            let schema = Arc::clone(&schema);
            std::thread::spawn(move || {
                let def = schema.lookup("#Config").unwrap();
                let mut doc = valid_document();
                doc.insert("replicas", Value::Int(i + 1), None);
                ctx.unify(&def, &doc.build()).validate_concrete().is_ok()
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}

//! Integration test: drive the `cint` binary end to end and check its
//! stdout report and exit status.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const SCHEMA: &str = r#"
#Config: {
	name: string & =~"^[a-z][a-z0-9-]*$"
	replicas: int & >=1 & <=10
}
"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

fn cint(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cint"))
        .args(args)
        .output()
        .expect("spawn cint")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_valid_file_exits_zero() {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "app.cue", SCHEMA);
    let config = write(dir.path(), "service.yaml", "name: web\nreplicas: 2\n");

    let output = cint(&[
        &format!("--schema={}", schema.display()),
        &format!("--config={}", config.display()),
    ]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), format!("{}: ok\n", config.display()));
}

#[test]
fn test_invalid_file_exits_one() {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "app.cue", SCHEMA);
    let good = write(dir.path(), "good.json", r#"{"name": "web", "replicas": 1}"#);
    let bad = write(dir.path(), "bad.yaml", "name: web\nreplicas: 0\n");

    let output = cint(&[
        "--schema",
        schema.to_str().unwrap(),
        "--config",
        good.to_str().unwrap(),
        "--config",
        bad.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.starts_with(&format!("{}: ok\n", good.display())), "{text}");
    assert!(text.contains(&format!("FAIL: {}\n", bad.display())), "{text}");
    assert!(text.contains("  line 2, field \"replicas\": "), "{text}");
}

#[test]
fn test_broken_schema_exits_one() {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "app.cue", "#Config: {");
    let config = write(dir.path(), "service.yaml", "name: web\n");

    let output = cint(&["--schema", schema.to_str().unwrap(), "--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("failed to load schema: "));
}

#[test]
fn test_json_format() {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "app.cue", SCHEMA);
    let bad = write(dir.path(), "bad.json", r#"{"name": "Web", "replicas": 1}"#);

    let output = cint(&[
        "--schema",
        schema.to_str().unwrap(),
        "--config",
        bad.to_str().unwrap(),
        "--format",
        "json",
        "--jobs",
        "2",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[0]["file"], bad.display().to_string());
    assert_eq!(report[0]["valid"], false);
    assert_eq!(report[0]["errors"][0]["field"], "name");
    assert_eq!(report[0]["errors"][0]["line"], 1);
}

#[test]
fn test_version_exits_zero() {
    let output = cint(&["--version"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with("cint "));
}

#[test]
fn test_missing_arguments_exit_one() {
    assert_eq!(cint(&[]).status.code(), Some(1));
    assert_eq!(cint(&["--schema", "app.cue"]).status.code(), Some(1));
    assert_eq!(cint(&["--config", "service.yaml"]).status.code(), Some(1));
}

//! Runs one validation batch and writes the report.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context as _;
use cint_schema::Validator;

use crate::report::{exit_code, format_json, format_text, OutputFormat};

/// Everything a validation run needs, as parsed from the command line.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub schema: PathBuf,
    pub configs: Vec<PathBuf>,
    pub jobs: usize,
    pub format: OutputFormat,
}

/// Validate, write the report to `out`, and return the process exit code.
///
/// # Errors
///
/// Only fails if the report cannot be rendered or written; validation
/// failures are reported in the output and the exit code.
pub fn run(args: &RunArgs, out: &mut impl Write) -> anyhow::Result<u8> {
    tracing::debug!(
        schema = %args.schema.display(),
        files = args.configs.len(),
        jobs = args.jobs,
        "starting validation"
    );

    let results = Validator::new()
        .jobs(args.jobs)
        .validate_files(&args.schema, &args.configs);

    let report = match args.format {
        OutputFormat::Text => format_text(&results),
        OutputFormat::Json => format_json(&results).context("rendering JSON report")?,
    };
    out.write_all(report.as_bytes())
        .and_then(|()| out.flush())
        .context("writing report")?;

    Ok(exit_code(&results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_report_and_returns_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.cue");
        std::fs::write(&schema, "#Config: {name: string}").unwrap();
        let good = dir.path().join("good.yaml");
        std::fs::write(&good, "name: svc").unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"name": 1}"#).unwrap();

        let args = RunArgs {
            schema,
            configs: vec![good.clone(), bad.clone()],
            jobs: 1,
            format: OutputFormat::Text,
        };
        let mut out = Vec::new();
        assert_eq!(run(&args, &mut out).unwrap(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(&format!("{}: ok\n", good.display())), "{text}");
        assert!(text.contains(&format!("FAIL: {}\n", bad.display())), "{text}");
        assert!(text.contains("line 1, field \"name\""), "{text}");
    }

    #[test]
    fn test_json_format_is_parseable() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.cue");
        std::fs::write(&schema, "#Config: {name: string}").unwrap();
        let good = dir.path().join("good.yml");
        std::fs::write(&good, "name: svc").unwrap();

        let args = RunArgs {
            schema,
            configs: vec![good],
            jobs: 2,
            format: OutputFormat::Json,
        };
        let mut out = Vec::new();
        assert_eq!(run(&args, &mut out).unwrap(), 0);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["valid"], true);
    }
}

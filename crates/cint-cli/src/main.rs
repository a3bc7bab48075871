//! # cint CLI entry point
//!
//! Parses command-line arguments, installs logging, runs one validation
//! batch and maps the outcome to the process exit status.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cint_cli::{run, OutputFormat, RunArgs};

/// cint - Configuration linter powered by a CUE-style schema language
///
/// Validates YAML and JSON config files against the `#Config` definition
/// of a schema. Exits 0 if every file is valid, 1 otherwise.
#[derive(Parser, Debug)]
#[command(
    name = "cint",
    version,
    about,
    long_about = None,
    after_help = "Examples:\n  \
        # Validate a single file\n  \
        cint --schema=app.cue --config=service.yaml\n\n  \
        # Validate multiple files\n  \
        cint --schema=app.cue --config=service-a.yaml --config=service-b.yaml"
)]
struct Cli {
    /// Path to the schema file.
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,

    /// Config file to validate (repeat for several files).
    #[arg(long = "config", value_name = "PATH", required = true)]
    configs: Vec<PathBuf>,

    /// Worker threads for validating files; 1 validates sequentially.
    #[arg(short, long, default_value_t = 1, value_name = "N")]
    jobs: usize,

    /// Report format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose logging on stderr. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "cint starting");

    let args = RunArgs {
        schema: cli.schema,
        configs: cli.configs,
        jobs: cli.jobs,
        format: cli.format,
    };
    match run(&args, &mut std::io::stdout().lock()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

//! # cint-cli: Config Linter Command Line
//!
//! Provides the `cint` binary used as a CI gate:
//!
//! ```bash
//! # Validate a single file
//! cint --schema app.cue --config service.yaml
//!
//! # Validate several files on four worker threads, JSON report
//! cint --schema app.cue --config a.yaml --config b.json --jobs 4 --format json
//! ```
//!
//! The process exits `0` only if every file validated; any failing file,
//! an unusable schema, or bad arguments exit `1`.

pub mod report;
pub mod run;

pub use report::{exit_code, format_json, format_text, OutputFormat};
pub use run::{run, RunArgs};

//! # Batch Orchestrator
//!
//! Validates a list of config files against one schema and returns one
//! [`ValidationResult`] per requested path, in request order.
//!
//! ## Failure Scope
//!
//! - A schema that cannot be loaded fails every file with the same
//!   `failed to load schema: ...` problem; no config file is read.
//! - Every other failure (unreadable file, unsupported extension, decode
//!   error, constraint violations) stays local to its own result.
//!
//! ## Concurrency
//!
//! The compiled schema is immutable and the engine [`Context`] is shared
//! read-mostly, so files can be checked on a rayon pool. Results are
//! collected through an indexed parallel iterator, which keeps input order
//! without any shared result list.

use std::path::Path;

use cint_core::{CintError, ValidationResult};
use cint_lang::Context;
use rayon::prelude::*;

use crate::compile::{load_schema, LoadedSchema};
use crate::decode::decode_document;
use crate::diagnostic::extract_diagnostics;
use crate::engine::{validate_document, EngineError};

/// Validate `config_paths` against the schema at `schema_path`, one file
/// at a time.
pub fn validate_files<P>(schema_path: &Path, config_paths: &[P]) -> Vec<ValidationResult>
where
    P: AsRef<Path> + Sync,
{
    Validator::new().validate_files(schema_path, config_paths)
}

/// Batch validation settings.
#[derive(Debug, Clone)]
pub struct Validator {
    jobs: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of worker threads. `0` and `1` both mean sequential.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Load the schema once, then validate every file.
    pub fn validate_files<P>(&self, schema_path: &Path, config_paths: &[P]) -> Vec<ValidationResult>
    where
        P: AsRef<Path> + Sync,
    {
        let ctx = Context::new();
        let schema = match load_schema(&ctx, schema_path) {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!(
                    schema = %schema_path.display(),
                    error = %e,
                    files = config_paths.len(),
                    "schema failed to load; failing every file"
                );
                return schema_failure_results(config_paths, &e);
            }
        };

        let results = if self.jobs <= 1 || config_paths.len() <= 1 {
            validate_sequential(&ctx, &schema, config_paths)
        } else {
            self.validate_parallel(&ctx, &schema, config_paths)
        };

        let failed = results.iter().filter(|r| !r.is_valid()).count();
        tracing::info!(files = results.len(), failed, jobs = self.jobs.max(1), "validation finished");
        results
    }

    fn validate_parallel<P>(
        &self,
        ctx: &Context,
        schema: &LoadedSchema,
        config_paths: &[P],
    ) -> Vec<ValidationResult>
    where
        P: AsRef<Path> + Sync,
    {
        match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => pool.install(|| {
                config_paths
                    .par_iter()
                    .map(|path| validate_file(ctx, schema, path.as_ref()))
                    .collect()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "could not start worker pool; validating sequentially");
                validate_sequential(ctx, schema, config_paths)
            }
        }
    }
}

fn validate_sequential<P: AsRef<Path>>(
    ctx: &Context,
    schema: &LoadedSchema,
    config_paths: &[P],
) -> Vec<ValidationResult> {
    config_paths
        .iter()
        .map(|path| validate_file(ctx, schema, path.as_ref()))
        .collect()
}

fn schema_failure_results<P: AsRef<Path>>(config_paths: &[P], err: &CintError) -> Vec<ValidationResult> {
    let problem = format!("failed to load schema: {err}");
    config_paths
        .iter()
        .map(|path| ValidationResult::single(path.as_ref().display().to_string(), problem.clone()))
        .collect()
}

/// Read, decode and validate one config file. Never fails: every problem
/// becomes part of the returned result.
pub fn validate_file(ctx: &Context, schema: &LoadedSchema, path: &Path) -> ValidationResult {
    let name = path.display().to_string();
    tracing::debug!(file = %name, "validating");

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return ValidationResult::single(name, CintError::FileRead(e).to_string()),
    };
    let document = match decode_document(ctx, path, &bytes) {
        Ok(document) => document,
        Err(e) => return ValidationResult::single(name, e.to_string()),
    };

    match validate_document(ctx, schema, &document) {
        Ok(()) => ValidationResult::valid(name),
        Err(EngineError::Failed(failure)) => {
            let errors = extract_diagnostics(&failure);
            tracing::debug!(file = %name, errors = errors.len(), "constraint violations");
            ValidationResult::with_errors(name, errors)
        }
        Err(e @ EngineError::MissingDefinition(_)) => ValidationResult::single(name, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sequential() {
        assert_eq!(Validator::new().jobs, 1);
        assert_eq!(Validator::new().jobs(4).jobs, 4);
    }

    #[test]
    fn test_schema_failure_fills_every_slot() {
        let err = CintError::MissingDefinition("#Config".into());
        let results = schema_failure_results(&["a.yaml", "b.json"], &err);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].file_name(), "b.json");
        assert_eq!(
            results[0].errors()[0].problem,
            "failed to load schema: schema does not define #Config"
        );
    }

    #[test]
    fn test_empty_batch_yields_no_results() {
        let results = validate_files::<&str>(Path::new("/nonexistent/schema.cue"), &[]);
        assert!(results.is_empty());
    }
}

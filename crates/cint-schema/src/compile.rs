//! Schema loading: read the schema file once, compile it, and confirm it
//! declares the top-level contract documents are checked against.

use std::path::{Path, PathBuf};

use cint_core::CintError;
use cint_lang::{Context, Instance, Value};

/// Name of the definition every config document is unified with.
pub const CONFIG_DEFINITION: &str = "#Config";

/// A compiled schema, immutable after loading and shareable across threads.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    path: PathBuf,
    value: Value,
}

impl LoadedSchema {
    /// Wrap an already compiled schema value.
    pub fn new(path: impl Into<PathBuf>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The `#Config` definition, if the schema declares one.
    pub fn definition(&self) -> Option<Instance<'_>> {
        self.value.lookup(CONFIG_DEFINITION)
    }
}

/// Read and compile the schema at `path`.
///
/// # Errors
///
/// - [`CintError::SchemaRead`] if the file cannot be read.
/// - [`CintError::SchemaCompile`] if the source does not compile.
/// - [`CintError::MissingDefinition`] if it compiles but has no `#Config`.
pub fn load_schema(ctx: &Context, path: &Path) -> Result<LoadedSchema, CintError> {
    let source = std::fs::read(path).map_err(CintError::SchemaRead)?;
    let value = ctx
        .compile(&source, &path.display().to_string())
        .map_err(|e| CintError::SchemaCompile(e.to_string()))?;

    let schema = LoadedSchema::new(path, value);
    if schema.definition().is_none() {
        return Err(CintError::MissingDefinition(CONFIG_DEFINITION.to_string()));
    }
    tracing::debug!(schema = %path.display(), bytes = source.len(), "schema compiled");
    Ok(schema)
}

//! # Validation Engine
//!
//! Unifies one decoded document with the schema's `#Config` definition and
//! demands full concreteness of the result. Conflicts are not reported at
//! unification time; they surface here as violations.

use cint_lang::{Context, ValidationFailure, Value};
use thiserror::Error;

use crate::compile::{LoadedSchema, CONFIG_DEFINITION};

/// Why a document did not validate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The schema has no top-level contract. This is a schema-authoring
    /// error, not a document error.
    #[error("schema does not define {0}")]
    MissingDefinition(&'static str),

    /// The document violates the schema.
    #[error(transparent)]
    Failed(#[from] ValidationFailure),
}

/// Check `document` against the schema's `#Config`.
///
/// # Errors
///
/// [`EngineError::MissingDefinition`] when `#Config` is absent, otherwise
/// [`EngineError::Failed`] carrying every violation found.
pub fn validate_document(
    ctx: &Context,
    schema: &LoadedSchema,
    document: &Value,
) -> Result<(), EngineError> {
    let definition = schema
        .definition()
        .ok_or(EngineError::MissingDefinition(CONFIG_DEFINITION))?;
    let unified = ctx.unify(&definition, document);
    unified.validate_concrete()?;
    Ok(())
}

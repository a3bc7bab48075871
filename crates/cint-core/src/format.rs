//! # Document Formats
//!
//! Maps a config file path to the decoder that understands it. Selection is
//! by lowercase file extension and happens before any byte is decoded.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CintError;

/// Extensions accepted for config documents, in the order they are listed
/// to users.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = [".yaml", ".yml", ".json"];

/// A config document format with a dedicated decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// YAML 1.2 (`.yaml`, `.yml`).
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl DocumentFormat {
    /// Select the format for `path` from its extension.
    ///
    /// The match is case-insensitive (`CONFIG.YML` is YAML).
    ///
    /// # Errors
    ///
    /// Returns [`CintError::UnsupportedFormat`] naming the offending
    /// extension and the supported set.
    pub fn from_path(path: &Path) -> Result<Self, CintError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        match extension.as_str() {
            ".yaml" | ".yml" => Ok(Self::Yaml),
            ".json" => Ok(Self::Json),
            _ => Err(CintError::UnsupportedFormat {
                extension,
                supported: SUPPORTED_EXTENSIONS.join(", "),
            }),
        }
    }

    /// Display name used in decode error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Error types for catalog loading

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {origin}")]
    ParseToml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid catalog definition: {reason}")]
    InvalidDefinition { reason: String },
}

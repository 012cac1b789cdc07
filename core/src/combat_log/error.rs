//! Error types for fight event loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a pre-parsed fight dump
#[derive(Debug, Error)]
pub enum EventsError {
    #[error("failed to read event file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse events in {path}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid event dump: {0}")]
    InvalidDump(#[source] serde_json::Error),
}

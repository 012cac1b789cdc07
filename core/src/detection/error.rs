//! Error types for detection faults
//!
//! Lookup misses and missing evidence are ordinary results, not errors. These
//! cover broken inputs that make a single pair undetectable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("ability {ability_id} resolved to unknown grimoire '{grimoire}'")]
    MissingGrimoire { ability_id: i64, grimoire: String },

    #[error("invalid detection config: {reason}")]
    InvalidConfig { reason: String },
}

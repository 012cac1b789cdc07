//! Scribing script detection
//!
//! The catalog answers which grimoire and focus an ability belongs to. The
//! signature and affix scripts are never logged directly, so they are
//! inferred from what the player's casts leave behind in the fight.

pub mod affix;
pub mod casts;
mod engine;
mod error;
pub mod resolver;
pub mod signature;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod fixtures;

pub use affix::{detect_affixes, trigger_start};
pub use casts::{NormalizedCasts, normalize_casts};
pub use engine::{PlayerAbilities, ScribingEngine, validate_config};
pub use error::DetectionError;
pub use resolver::SkillResolver;
pub use signature::detect_signature;

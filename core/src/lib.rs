pub mod catalog;
pub mod combat_log;
pub mod context;
pub mod detection;

// Re-exports for convenience
pub use catalog::{CatalogError, ScribingCatalog};
pub use combat_log::*;
pub use context::{ConfigError, DetectionConfigExt, QuillConfigExt};
pub use detection::{DetectionError, PlayerAbilities, ScribingEngine, SkillResolver};
pub use quill_types::{
    AffixResult, DetectionConfig, DetectionStatus, EffectKind, QuillConfig, RecipeInfo,
    ResolvedScribingDetection, SCHEMA_VERSION, ScribingDetectionsMap, ScribingSkillInfo,
    SignatureResult,
};

//! Application configuration
//!
//! Re-exports the shared config types from quill-types and adds persistence.
//! The default location is the platform config dir (via confy); an explicit
//! TOML file can be loaded instead.

use std::path::Path;

pub use quill_types::{DetectionConfig, QuillConfig};

use super::error::ConfigError;
use crate::catalog::{CatalogError, ScribingCatalog};

const APP_NAME: &str = "quill";
const CONFIG_NAME: &str = "config";

// ─────────────────────────────────────────────────────────────────────────────
// QuillConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for QuillConfig persistence
pub trait QuillConfigExt: Sized {
    /// Load from the default location, falling back to defaults on any error
    fn load() -> Self;
    fn try_load() -> Result<Self, ConfigError>;
    /// Load from an explicit TOML file
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    /// Catalog named by `catalog_path`, or the bundled one
    fn catalog(&self) -> Result<ScribingCatalog, CatalogError>;
}

impl QuillConfigExt for QuillConfig {
    fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using default configuration");
            Self::default()
        })
    }

    fn try_load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, CONFIG_NAME)?)
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn catalog(&self) -> Result<ScribingCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => ScribingCatalog::load(path),
            None => ScribingCatalog::bundled(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DetectionConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

pub trait DetectionConfigExt: Sized {
    /// Load a standalone detection table; missing fields take defaults
    fn from_toml_file(path: &Path) -> Result<Self, ConfigError>;
}

impl DetectionConfigExt for DetectionConfig {
    fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        read_toml(path)
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Loaded config file");
    Ok(parsed)
}

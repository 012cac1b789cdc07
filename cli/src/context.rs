use std::path::{Path, PathBuf};
use std::sync::Arc;

use quill_core::context::{QuillConfig, QuillConfigExt};
use quill_core::{ScribingCatalog, ScribingEngine};

use crate::error_chain;

/// Holds the loaded configuration and the engine built from it.
pub struct CliContext {
    pub config: QuillConfig,
    pub engine: ScribingEngine,
}

impl CliContext {
    /// Load config (explicit file, else the default location) and build the
    /// engine. `catalog` overrides the configured catalog path.
    pub fn new(config_path: Option<&Path>, catalog: Option<PathBuf>) -> Result<Self, String> {
        let mut config = match config_path {
            Some(path) => QuillConfig::load_from(path).map_err(|e| error_chain(&e))?,
            None => QuillConfig::load(),
        };
        if catalog.is_some() {
            config.catalog_path = catalog;
        }

        let catalog = config.catalog().map_err(|e| error_chain(&e))?;
        let engine = ScribingEngine::with_config(Arc::new(catalog), config.detection.clone());
        Ok(Self { config, engine })
    }

    pub fn catalog(&self) -> &ScribingCatalog {
        self.engine.catalog()
    }
}

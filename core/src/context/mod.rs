mod config;
mod error;

pub use config::{DetectionConfig, DetectionConfigExt, QuillConfig, QuillConfigExt};
pub use error::ConfigError;

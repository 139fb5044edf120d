//! Engine configuration (YAML, every field optional)

pub mod loader;
pub mod types;

pub use loader::{ConfigLoader, CONFIG_DIR_ENV, CONFIG_FILE};
pub use types::{EngineConfig, Fallbacks, IdSuffix, PartnerLayout};

//! Configuration loader
//!
//! Loads and validates the engine YAML configuration.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::EngineConfig;

/// Environment variable naming the configuration directory
pub const CONFIG_DIR_ENV: &str = "WMS_LABELS_CONFIG_DIR";

/// File name looked up inside the configuration directory
pub const CONFIG_FILE: &str = "label_engine.yaml";

pub struct ConfigLoader {
    config_dir: String,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Create loader from WMS_LABELS_CONFIG_DIR env var or default to "config"
    pub fn from_env() -> Self {
        let dir = std::env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| "config".to_string());
        Self::new(dir)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        Path::new(&self.config_dir).join(CONFIG_FILE)
    }

    /// Load the engine configuration.
    ///
    /// A missing file is not an error: defaults are returned. A present but
    /// malformed or invalid file is.
    pub fn load(&self) -> Result<EngineConfig> {
        let path = self.config_path();
        if !path.exists() {
            debug!("{} not found, using default engine config", path.display());
            return Ok(EngineConfig::default());
        }
        Self::load_file(&path)
    }

    /// Load from an explicit file path
    pub fn load_file(path: &Path) -> Result<EngineConfig> {
        info!("Loading engine configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse and validate YAML content
    pub fn parse(content: &str) -> Result<EngineConfig> {
        let config: EngineConfig = if content.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };

        validate(&config)?;

        info!(
            "Engine config: offset {} min, {} partner layouts, hazmat override: {}",
            config.timezone_offset_minutes,
            config.partner_layouts.len(),
            config.hazmat_catalog.is_some()
        );

        Ok(config)
    }
}

fn validate(config: &EngineConfig) -> Result<()> {
    if config.timezone_offset_minutes.abs() > 14 * 60 {
        return Err(anyhow!(
            "timezone_offset_minutes out of range: {}",
            config.timezone_offset_minutes
        ));
    }

    if config.weight_unit.trim().is_empty() {
        return Err(anyhow!("weight_unit must not be empty"));
    }

    for partner in &config.partner_layouts {
        if partner.token.trim().is_empty() {
            return Err(anyhow!(
                "partner layout for carrier '{}' has an empty token",
                partner.carrier
            ));
        }
    }

    if let Some(catalog) = &config.hazmat_catalog {
        let mut seen = std::collections::HashSet::new();
        for entry in catalog {
            if !seen.insert(entry.un_number.as_str()) {
                return Err(anyhow!("Duplicate UN number in hazmat catalog: {}", entry.un_number));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdSuffix;
    use tempfile::TempDir;

    #[test]
    fn test_loader_creation() {
        let loader = ConfigLoader::new("config");
        assert_eq!(loader.config_dir(), "config");
        assert!(loader.config_path().ends_with(CONFIG_FILE));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(temp_dir.path().to_string_lossy());
        let config = loader.load().unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "timezone_offset_minutes: 0\nid_suffix: batch_counter\n",
        )
        .unwrap();

        let loader = ConfigLoader::new(temp_dir.path().to_string_lossy());
        let config = loader.load().unwrap();
        assert_eq!(config.timezone_offset_minutes, 0);
        assert_eq!(config.id_suffix, IdSuffix::BatchCounter);
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        let err = ConfigLoader::parse("timezone_offset_minutes: 2000\n").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_rejects_blank_partner_token() {
        let yaml = "partner_layouts:\n  - token: ''\n    carrier: Someone\n";
        assert!(ConfigLoader::parse(yaml).is_err());
    }

    #[test]
    fn test_rejects_duplicate_hazmat_entries() {
        let yaml = r#"
hazmat_catalog:
  - un_number: "1090"
    product: ACETONA
    risk_class: "3"
    risk_number: "33"
  - un_number: "1090"
    product: ACETONA
    risk_class: "3"
    risk_number: "33"
"#;
        let err = ConfigLoader::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate UN number"));
    }
}

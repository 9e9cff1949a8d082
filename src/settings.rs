//! Configurator Settings
//!
//! Startup configuration: where assets live, which fragments the catalogs
//! offer, and the parameter values a session starts from.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use deskcraft::settings::ConfiguratorSettings;
//!
//! // Built-in catalog, assets resolved against the working directory
//! let settings = ConfiguratorSettings::default();
//!
//! // Or from JSON; every field is optional
//! let settings = ConfiguratorSettings::from_json_str(r#"{ "asset_root": "public" }"#)?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::AssetCatalog;
use crate::config::{ConfigLimits, DeskConfig};
use crate::errors::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfiguratorSettings {
    /// Directory that catalog references are resolved against.
    pub asset_root: PathBuf,
    pub catalog: AssetCatalog,
    /// Parameter values at session start.
    pub defaults: DeskConfig,
}

impl Default for ConfiguratorSettings {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            catalog: AssetCatalog::default(),
            defaults: DeskConfig::default(),
        }
    }
}

impl ConfiguratorSettings {
    /// Parses and validates settings from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a JSON file. Relative asset roots are resolved
    /// against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut settings = Self::from_json_str(&text)?;
        if settings.asset_root.is_relative()
            && let Some(dir) = path.parent()
        {
            settings.asset_root = dir.join(&settings.asset_root);
        }
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    #[must_use]
    pub fn limits(&self) -> ConfigLimits {
        ConfigLimits::from_catalog(&self.catalog)
    }

    /// Checks that the catalog is usable and the defaults fall inside it.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.catalog.validate()?;
        self.defaults.validate(&self.limits())
    }
}

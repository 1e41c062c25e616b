//! JSON config file adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document.  Missing fields
//! take their defaults; every load and save is validated.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::GateConfig;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<GateConfig, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ConfigError::NotFound),
            Err(e) => return Err(ConfigError::IoError(e.to_string())),
        };
        let cfg: GateConfig =
            serde_json::from_str(&text).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        cfg.validate()?;
        info!("Config loaded from {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &GateConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        std::fs::write(&self.path, text + "\n").map_err(|e| ConfigError::IoError(e.to_string()))?;
        info!("Config written to {}", self.path.display());
        Ok(())
    }
}

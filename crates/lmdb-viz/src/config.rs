//! Visualizer configuration.
//!
//! Configuration is a JSON document; every field is optional and falls back
//! to the defaults below.
//!
//! ```json
//! {
//!   "store": { "max_dbs": 256 },
//!   "view": { "magnification": 8, "skip": 0.0, "zoom": 1.0 },
//!   "width": 2000,
//!   "height": 1000,
//!   "hidden": ["logs", "index:key"]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VizError};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "LMDB_VIZ_CONFIG";

pub const DEFAULT_MAX_DBS: u32 = 256;
pub const DEFAULT_WIDTH: u32 = 2000;
pub const DEFAULT_HEIGHT: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub store: StoreOptions,
    pub view: ViewDefaults,
    pub width: u32,
    pub height: u32,
    /// Tables to hide, as `name`, `name:key` or `name:val`.
    pub hidden: Vec<String>,
}

/// Options used when opening the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Maximum number of named databases the environment may open.
    pub max_dbs: u32,
}

/// Initial view parameters, also restored by a view reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDefaults {
    pub magnification: u32,
    pub skip: f64,
    pub zoom: f64,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            store: StoreOptions::default(),
            view: ViewDefaults::default(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            hidden: Vec::new(),
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_dbs: DEFAULT_MAX_DBS,
        }
    }
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            magnification: 8,
            skip: 0.0,
            zoom: 1.0,
        }
    }
}

impl VizConfig {
    /// Reads a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|error| {
            VizError::Config(format!("failed to read {}: {error}", path.display()))
        })?;
        let config = Self::from_json(&raw).map_err(|error| match error {
            VizError::Config(message) => {
                VizError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses a configuration document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|error| VizError::Config(format!("invalid configuration: {error}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.store.max_dbs == 0 {
            return Err(VizError::Config("store.max_dbs must be positive".to_string()));
        }
        if !self.view.magnification.is_power_of_two() || self.view.magnification > 16 {
            return Err(VizError::Config(format!(
                "view.magnification must be one of 1, 2, 4, 8, 16 (got {})",
                self.view.magnification
            )));
        }
        if !(0.0..=1.0).contains(&self.view.skip) {
            return Err(VizError::Config(format!(
                "view.skip must be within [0, 1] (got {})",
                self.view.skip
            )));
        }
        if !(self.view.zoom.is_finite() && self.view.zoom > 0.0) {
            return Err(VizError::Config(format!(
                "view.zoom must be positive (got {})",
                self.view.zoom
            )));
        }
        Ok(())
    }
}

//! Config module - Region directory and chart styling

mod regions;
mod style;

pub use regions::RegionDirectory;
pub use style::{ChartStyle, Color};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
}

/// Everything the chart builder needs besides the data itself.
///
/// Missing fields in a JSON config fall back to the defaults, so a file that
/// only adds a region is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub regions: RegionDirectory,
    pub style: ChartStyle,
}

impl ChartConfig {
    pub fn new(regions: RegionDirectory, style: ChartStyle) -> Self {
        Self { regions, style }
    }

    /// Parse a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::info!(
            "Loaded chart config from {} ({} regions)",
            path.as_ref().display(),
            config.regions.len()
        );
        Ok(config)
    }
}

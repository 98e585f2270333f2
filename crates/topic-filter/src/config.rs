use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::directory::SiteSettings;
use crate::error::{Result, TopicFilterError};

pub const FILTER_CONFIG_FILENAME: &str = "topic-filter.json";
pub const FILTER_CONFIG_VERSION: &str = "1.0.0";

/// Site flags consulted while compiling a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub version: String,
    #[serde(default = "default_tagging_enabled")]
    pub tagging_enabled: bool,
}

fn default_tagging_enabled() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            version: FILTER_CONFIG_VERSION.to_string(),
            tagging_enabled: default_tagging_enabled(),
        }
    }
}

impl SiteSettings for FilterConfig {
    fn tagging_enabled(&self) -> bool {
        self.tagging_enabled
    }
}

pub fn load_or_create_filter_config(dir: &Path) -> Result<FilterConfig> {
    std::fs::create_dir_all(dir)?;

    let path = filter_config_path(dir);
    if !path.exists() {
        let config = FilterConfig::default();
        write_filter_config(&path, &config)?;
        tracing::debug!("wrote default filter config to {}", path.display());
        return Ok(config);
    }

    let data = std::fs::read_to_string(&path)?;
    let config: FilterConfig =
        serde_json::from_str(&data).map_err(|error| TopicFilterError::Config {
            path: path.clone(),
            message: format!("failed to parse: {error}"),
        })?;

    if config.version != FILTER_CONFIG_VERSION {
        return Err(TopicFilterError::Config {
            path,
            message: format!("unsupported config version {}", config.version),
        });
    }

    Ok(config)
}

pub fn write_filter_config(path: &Path, config: &FilterConfig) -> Result<()> {
    let data = serde_json::to_string_pretty(config).map_err(|error| TopicFilterError::Config {
        path: path.to_path_buf(),
        message: format!("failed to serialize: {error}"),
    })?;
    std::fs::write(path, data)?;
    Ok(())
}

pub fn filter_config_path(dir: &Path) -> PathBuf {
    dir.join(FILTER_CONFIG_FILENAME)
}

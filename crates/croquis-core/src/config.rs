//! Layered editor configuration: defaults, then a TOML file, then environment
//! variables, then CLI flags, in increasing precedence.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{CroquisError, Result};
use crate::models::StyleDefaults;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    File,
    Environment,
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the editor.
#[derive(Debug, Clone)]
pub struct CroquisConfig {
    pub stroke_color: ConfigValue<String>,
    pub fill_color: ConfigValue<String>,
    pub marker_symbol: ConfigValue<String>,
    pub export_prefix: ConfigValue<String>,
}

impl CroquisConfig {
    pub fn with_defaults() -> Self {
        let style = StyleDefaults::default();
        Self {
            stroke_color: ConfigValue::new(style.stroke, ConfigSource::Default),
            fill_color: ConfigValue::new(style.fill, ConfigSource::Default),
            marker_symbol: ConfigValue::new(style.marker_symbol, ConfigSource::Default),
            export_prefix: ConfigValue::new("drawing".to_string(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| CroquisError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| CroquisError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(stroke_color) = file_config.stroke_color {
            self.stroke_color.update(stroke_color, ConfigSource::File);
        }
        if let Some(fill_color) = file_config.fill_color {
            self.fill_color.update(fill_color, ConfigSource::File);
        }
        if let Some(marker_symbol) = file_config.marker_symbol {
            self.marker_symbol.update(marker_symbol, ConfigSource::File);
        }
        if let Some(export_prefix) = file_config.export_prefix {
            self.export_prefix.update(export_prefix, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(value) = env::var("CROQUIS_STROKE_COLOR") {
            self.stroke_color.update(value, ConfigSource::Environment);
        }
        if let Ok(value) = env::var("CROQUIS_FILL_COLOR") {
            self.fill_color.update(value, ConfigSource::Environment);
        }
        if let Ok(value) = env::var("CROQUIS_MARKER_SYMBOL") {
            self.marker_symbol.update(value, ConfigSource::Environment);
        }
        if let Ok(value) = env::var("CROQUIS_EXPORT_PREFIX") {
            self.export_prefix.update(value, ConfigSource::Environment);
        }
        self
    }

    /// Style fallbacks for the selection controller.
    pub fn style_defaults(&self) -> StyleDefaults {
        StyleDefaults {
            stroke: self.stroke_color.value.clone(),
            fill: self.fill_color.value.clone(),
            marker_color: self.stroke_color.value.clone(),
            marker_symbol: self.marker_symbol.value.clone(),
            ..StyleDefaults::default()
        }
    }

    pub fn export_prefix(&self) -> &str {
        &self.export_prefix.value
    }
}

impl Default for CroquisConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Shape of the optional TOML config file.
#[derive(Debug, Deserialize)]
struct FileConfig {
    stroke_color: Option<String>,
    fill_color: Option<String>,
    marker_symbol: Option<String>,
    export_prefix: Option<String>,
}

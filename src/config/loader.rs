// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config::consts::{
    DEFAULT_DEVICE_COUNT, DEFAULT_DEVICE_PREFIX, DEFAULT_LOG_FILTER, FALLBACK_CONCURRENCY,
};
use crate::errors::ConfigError;

/// Configuration of a [`Library`](crate::library::Library).
///
/// Every field is optional; an empty document yields the defaults.
///
/// # Example
/// ```yaml
/// executor_options:
///   max_concurrency: 4
///   worker_threads: 2
/// devices:
///   count: 2
///   name_prefix: gpu
/// log_filter: "spla_flow=debug"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    pub executor_options: ExecutorOptions,
    pub devices: DeviceOptions,
    pub log_filter: Option<String>,
}

/// Options for the reactive executor and the runtime hosting it.
///
/// * `max_concurrency` - modules allowed to run at once (defaults to the CPU count)
/// * `worker_threads` - tokio worker threads (defaults to tokio's own choice)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
    pub worker_threads: Option<usize>,
}

impl ExecutorOptions {
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(FALLBACK_CONCURRENCY)
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceOptions {
    pub count: usize,
    pub name_prefix: String,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_DEVICE_COUNT,
            name_prefix: DEFAULT_DEVICE_PREFIX.to_string(),
        }
    }
}

impl LibraryConfig {
    /// Filter for the tracing subscriber when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.count == 0 {
            return Err(ConfigError::Invalid("devices.count must be at least 1".into()));
        }
        if self.devices.name_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("devices.name_prefix must not be empty".into()));
        }
        if self.executor_options.max_concurrency == Some(0) {
            return Err(ConfigError::Invalid(
                "executor_options.max_concurrency must be at least 1".into(),
            ));
        }
        if self.executor_options.worker_threads == Some(0) {
            return Err(ConfigError::Invalid(
                "executor_options.worker_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Serialization format of a configuration file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<LibraryConfig, ConfigError> {
    let config: LibraryConfig = match format {
        ConfigFormat::Yaml if content.trim().is_empty() => LibraryConfig::default(),
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };
    config.validate()?;
    Ok(config)
}

/// Load a library configuration from a `.yaml`, `.yml` or `.toml` file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LibraryConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, format)
}

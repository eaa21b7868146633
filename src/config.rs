//! Configuration handling for plinth.
//! This module loads engine construction options (namespaces, extension,
//! undefined-variable handling) from JSON or YAML files.

use crate::constants::{CONFIG_FILES, DEFAULT_EXTENSION};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

/// Engine construction options.
///
/// Host functions are code and are registered through
/// [`crate::engine::EngineBuilder::function`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Namespace name to template root directory
    #[serde(default)]
    pub namespaces: IndexMap<String, String>,

    /// Template file extension
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Treat undefined template variables as errors
    #[serde(default)]
    pub strict_undefined: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespaces: IndexMap::new(),
            extension: default_extension(),
            strict_undefined: false,
        }
    }
}

impl EngineConfig {
    /// Resolves relative namespace roots against `base_dir`.
    pub fn rebase<P: AsRef<Path>>(mut self, base_dir: P) -> Self {
        let base_dir = base_dir.as_ref();
        for root in self.namespaces.values_mut() {
            if Path::new(root.as_str()).is_relative() {
                *root = base_dir.join(root.as_str()).display().to_string();
            }
        }
        self
    }
}

/// Finds the first existing configuration file in a directory.
///
/// # Arguments
/// * `config_dir` - Directory to search
/// * `config_files` - Candidate file names, in priority order
///
/// # Returns
/// * `Option<PathBuf>` - Path of the first candidate that exists
pub fn find_config<P: AsRef<Path>>(config_dir: P, config_files: &[&str]) -> Option<PathBuf> {
    config_files
        .iter()
        .map(|file| config_dir.as_ref().join(file))
        .find(|config_path| config_path.is_file())
}

/// Parses configuration content, trying JSON first and YAML second.
///
/// # Errors
/// * `Error::ConfigError` if the content is neither valid JSON nor valid YAML
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    match serde_json::from_str(content) {
        Ok(config) => Ok(config),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {e}"))),
    }
}

/// Loads and parses a configuration file.
///
/// Relative namespace roots are taken relative to the file's directory.
pub fn load_config_file<P: AsRef<Path>>(config_path: P) -> Result<EngineConfig> {
    let config_path = config_path.as_ref();
    if !config_path.is_file() {
        return Err(Error::ConfigError(format!(
            "Invalid configuration path: {}",
            config_path.display()
        )));
    }

    debug!("Loading configuration from {}", config_path.display());
    let content = std::fs::read_to_string(config_path).map_err(Error::IoError)?;
    let config = parse_config(&content)?;

    Ok(match config_path.parent() {
        Some(base_dir) => config.rebase(base_dir),
        None => config,
    })
}

/// Loads the configuration of a directory, or the defaults if it has none.
pub fn get_config<P: AsRef<Path>>(config_dir: P) -> Result<EngineConfig> {
    match find_config(&config_dir, &CONFIG_FILES) {
        Some(config_path) => load_config_file(config_path),
        None => {
            debug!(
                "No configuration file found in {} (tried: {})",
                config_dir.as_ref().display(),
                CONFIG_FILES.join(", ")
            );
            Ok(EngineConfig::default())
        }
    }
}

//! Optional YAML settings file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::normalize::DEFAULT_SEARCH_URL;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "german-words.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Extracted records, one JSON array per line.
    pub words_path: PathBuf,
    /// Frequency list, `count headword` per line.
    pub freqs_path: PathBuf,
    /// Search URL prefix for outbound word links.
    pub link_search_url: String,
    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub channel_buffer: usize,
    /// 0 = auto-detect
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            words_path: PathBuf::from("german_words.jsonl"),
            freqs_path: PathBuf::from("frequencies.txt"),
            link_search_url: DEFAULT_SEARCH_URL.to_string(),
            log_filter: "info".to_string(),
            channel_buffer: 10000,
            threads: 0,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or the default file if present, or fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = path {
            return Config::load(path);
        }
        let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
        if candidate.exists() {
            Config::load(&candidate)
        } else {
            Ok(Config::default())
        }
    }
}

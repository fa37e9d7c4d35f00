//! Locating, reading and validating the client config file.

use std::path::{Path, PathBuf};

use crate::config::ClientConfig;

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".claude-stream.toml";

/// Resolves a [`ClientConfig`] from the first config file that exists.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    candidates: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Search `./.claude-stream.toml`, then `<config_dir>/claude-stream/config.toml`.
    #[must_use]
    pub fn new() -> Self {
        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("claude-stream").join("config.toml"));
        }
        Self { candidates }
    }

    /// Only consider `path`.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            candidates: vec![path],
        }
    }

    /// Load the first existing candidate, or defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read, is not valid TOML
    /// for [`ClientConfig`], or holds values a run cannot use.
    pub fn load(&self) -> Result<ClientConfig, ConfigError> {
        let Some(path) = self.find_config_file() else {
            tracing::debug!(candidates = ?self.candidates, "No config file found, using defaults");
            return Ok(ClientConfig::default());
        };

        tracing::debug!(path = %path.display(), "Loading config file");
        let config = Self::parse_file(&path)?;
        validate(&config).map_err(|reason| ConfigError::Invalid { path, reason })?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<ClientConfig, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Candidate paths in priority order.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.candidates
    }

    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.candidates.iter().find(|p| p.is_file()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(config: &ClientConfig) -> Result<(), String> {
    if config.binary.trim().is_empty() {
        return Err("binary must not be empty".to_string());
    }
    if config.channel_buffer == 0 {
        return Err("channel_buffer must be at least 1".to_string());
    }
    if config.stall_timeout_ms == 0 {
        return Err("stall_timeout_ms must be at least 1".to_string());
    }
    Ok(())
}

/// Errors raised while loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config file {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

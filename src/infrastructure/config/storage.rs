//! Config, state and read-state files under the platform config directory.

use super::app_config::AppConfig;
use super::state_config::StateConfig;
use crate::domain::entities::{MuteConfig, ReadState};
use crate::domain::errors::PersistenceError;
use crate::domain::ports::ReadStateStore;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";
const APP_NAME: &str = "oxicord-sync";
const CONFIG_FILE_NAME: &str = "config.toml";
const STATE_FILE_NAME: &str = "state.toml";
const READ_STATE_FILE_NAME: &str = "read_state.toml";
const MUTES_FILE_NAME: &str = "mutes.toml";

/// Failures reading or writing the config directory.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home or config directory is known for this platform.
    #[error("failed to determine config directory")]
    ConfigDirNotFound,
    /// File system error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A value could not be written as TOML.
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    /// A file is not valid TOML.
    #[error("toml deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl From<ConfigError> for PersistenceError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::TomlDe(e) => Self::Malformed {
                what: "read state".to_string(),
                message: e.to_string(),
            },
            other => Self::Unavailable {
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReadStateFile {
    #[serde(default)]
    read_state: Vec<ReadState>,
}

/// Loads and saves files in the config directory.
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Create a new `StorageManager`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::ConfigDirNotFound)?;

        Ok(Self { config_dir })
    }

    /// Creates a new `StorageManager` with a specific directory (useful for testing).
    #[must_use]
    pub fn with_dir(path: PathBuf) -> Self {
        Self { config_dir: path }
    }

    /// Directory all files are kept in.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Ensures the configuration directory exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> Result<(), ConfigError> {
        if !self.config_dir.exists() {
            info!(path = %self.config_dir.display(), "Creating configuration directory");
            fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Loads the application configuration, writing defaults when missing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or written.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        self.ensure_config_dir()?;
        let config_path = path_override.map_or_else(
            || self.config_dir.join(CONFIG_FILE_NAME),
            Path::to_path_buf,
        );

        if !config_path.exists() {
            info!(path = %config_path.display(), "Config file not found, creating default");
            let default_config = AppConfig::default();
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            Self::save_to_file(&config_path, &default_config)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path)?;
        match toml::from_str::<AppConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!(error = %e, "Failed to parse config file, using defaults");
                Ok(AppConfig::default())
            }
        }
    }

    /// Loads the navigation state.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read.
    pub fn load_state(&self) -> Result<StateConfig, ConfigError> {
        let state_path = self.config_dir.join(STATE_FILE_NAME);
        if !state_path.exists() {
            return Ok(StateConfig::default());
        }

        let content = fs::read_to_string(&state_path)?;
        match toml::from_str::<StateConfig>(&content) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(error = %e, "Failed to parse state file, resetting state");
                Ok(StateConfig::default())
            }
        }
    }

    /// Saves the navigation state.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save_state(&self, state: &StateConfig) -> Result<(), ConfigError> {
        self.ensure_config_dir()?;
        Self::save_to_file(&self.config_dir.join(STATE_FILE_NAME), state)
    }

    fn load_optional<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, ConfigError> {
        let path = self.config_dir.join(name);
        if !path.exists() {
            debug!(file = name, "No persisted file, using defaults");
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    fn save_to_file<T: Serialize>(path: &Path, data: &T) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(data)?;

        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::other("Invalid path"))?;
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}

impl ReadStateStore for StorageManager {
    fn load_read_state(&self) -> Result<Vec<ReadState>, PersistenceError> {
        let file: ReadStateFile = self.load_optional(READ_STATE_FILE_NAME)?;
        Ok(file.read_state)
    }

    fn save_read_state(&self, states: &[ReadState]) -> Result<(), PersistenceError> {
        self.ensure_config_dir()?;
        let file = ReadStateFile {
            read_state: states.to_vec(),
        };
        Self::save_to_file(&self.config_dir.join(READ_STATE_FILE_NAME), &file)?;
        Ok(())
    }

    fn load_mute_config(&self) -> Result<MuteConfig, PersistenceError> {
        self.load_optional(MUTES_FILE_NAME).map_err(|e| match e {
            ConfigError::TomlDe(e) => PersistenceError::Malformed {
                what: "mute config".to_string(),
                message: e.to_string(),
            },
            other => other.into(),
        })
    }
}

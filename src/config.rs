//! Connection configuration
//!
//! Settings are read once at startup from a TOML file in the platform's
//! standard config directory and then passed around as an immutable value.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the config file
    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where to find Kodi and how to talk to it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Hostname or IP address of the Kodi machine
    #[serde(default = "default_host")]
    pub host: String,

    /// Port of Kodi's web server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Web server username (empty disables authentication)
    #[serde(default = "default_username")]
    pub username: String,

    /// Web server password
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Kodi player to control (1 is the video player)
    #[serde(default = "default_player_id")]
    pub player_id: u32,

    /// Alias file to use instead of `aliases.json` in the config directory
    #[serde(default)]
    pub aliases_path: Option<PathBuf>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_username() -> String {
    "kodi".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_player_id() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: None,
            timeout_secs: default_timeout_secs(),
            player_id: default_player_id(),
            aliases_path: None,
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// With an explicit `path` the file must exist. Without one, the default
    /// location is used if present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reads and parses one TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Rejects values that cannot produce a working connection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port cannot be 0".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The JSON-RPC endpoint URL (without credentials).
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/jsonrpc", self.host.trim(), self.port)
    }

    /// Where the alias table is read from.
    pub fn aliases_file(&self) -> Option<PathBuf> {
        self.aliases_path
            .clone()
            .or_else(|| config_dir().map(|dir| dir.join("aliases.json")))
    }

    /// Path of the config file used when none is given.
    ///
    /// - Linux: ~/.config/kodi-control/config.toml
    /// - macOS: ~/Library/Application Support/kodi-control/config.toml
    /// - Windows: %APPDATA%\kodi-control\config\config.toml
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }
}

fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "kodi-control").map(|d| d.config_dir().to_path_buf())
}

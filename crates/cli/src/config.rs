// Local configuration for the redline CLI.
//
// Global config: `~/.redline/config.toml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use redline_core::types::Actor;

/// Root directory for redline global state: `~/.redline/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".redline"))
}

/// Path to the global config file: `~/.redline/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|dir| dir.join("config.toml"))
}

/// Global CLI configuration at `~/.redline/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default display name for edits attributed to this user.
    pub author_name: Option<String>,
    /// Stable identifier for this user (defaults to the OS username).
    pub author_id: Option<String>,
    /// Model label for edits attributed to an AI assistant.
    pub model: Option<String>,
}

impl GlobalConfig {
    /// Load from `~/.redline/config.toml`. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load() -> Self {
        global_config_path().and_then(|path| Self::load_from(&path).ok()).unwrap_or_default()
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// The human actor these settings describe.
    pub fn user_actor(&self) -> Actor {
        let fallback = std::env::var("USER").unwrap_or_else(|_| "author".to_string());
        Actor::User {
            user_id: self.author_id.clone().unwrap_or_else(|| fallback.clone()),
            name: self.author_name.clone().unwrap_or(fallback),
        }
    }

    /// The AI actor these settings describe.
    pub fn llm_actor(&self) -> Actor {
        Actor::Llm { model: self.model.clone().unwrap_or_else(|| "unknown-model".to_string()) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(std::io::Error),
    #[error("config parse error: {0}")]
    Parse(toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(toml::ser::Error),
}

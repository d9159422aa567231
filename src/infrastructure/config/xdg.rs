//! XDG config store adapter

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, APP_DIR_NAME};
use crate::domain::error::ConfigError;

const CONFIG_FILE: &str = "config.toml";

/// XDG-compliant config store
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    /// Store at `<config dir>/pocket-recorder/config.toml`
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR_NAME);

        Self {
            path: config_dir.join(CONFIG_FILE),
        }
    }

    /// Store backed by an explicit file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_toml(content: &str) -> Result<AppConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Self::parse_toml(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AppConfig::empty()),
            Err(e) => Err(ConfigError::ReadError(e.to_string())),
        }
    }

    /// Writes a sibling temp file then renames it over the config, so a
    /// crash never leaves a truncated file behind.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let write_error = |e: io::Error| ConfigError::WriteError(e.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(write_error)?;
        }

        let content = Self::to_toml(config)?;
        let temp = self.path.with_extension("toml.tmp");
        fs::write(&temp, content).await.map_err(write_error)?;
        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(write_error(e));
        }
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.display().to_string(),
            ));
        }
        self.save(&AppConfig::defaults()).await
    }
}

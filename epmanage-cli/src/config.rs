use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::TokenValidation;

pub const DEFAULT_TOKEN_FILE: &str = ".token";

/// Persistent settings; CLI flags and environment variables take precedence.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
    /// PEM public key; when set, token signatures are verified (RS512).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_public_key: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Missing file means defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Like [`Config::load`], but an unreadable or corrupt file (or no
    /// config directory at all) only logs a warning.
    pub fn load_or_default() -> Self {
        Self::usable_or_default(Self::load())
    }

    fn usable_or_default(loaded: Result<Self>) -> Self {
        loaded.unwrap_or_else(|e| {
            warn!(error = %format!("{:#}", e), "ignoring config file");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        debug!("Loading config from: {:?}", path);
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        serde_json::from_str(&contents).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let config_dir = path.parent().context("Failed to get config directory")?;
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        info!("Config saved to: {:?}", path);
        Ok(())
    }

    /// Removes the config file; returns whether one existed.
    pub fn clear() -> Result<bool> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path).context("Failed to remove config file")?;
        Ok(true)
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("epmanage").join("config.json"))
    }

    pub fn base_url_or(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string)
            .or_else(|| self.base_url.clone())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn token_file_or(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.token_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn token_validation(&self) -> Result<TokenValidation> {
        let Some(path) = &self.token_public_key else {
            return Ok(TokenValidation::default());
        };
        let pem = std::fs::read(path)
            .with_context(|| format!("Failed to read token public key {}", path.display()))?;
        TokenValidation::with_rsa_public_key(&pem).context("Invalid token public key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, None);
        assert_eq!(config.token_file_or(None), PathBuf::from(".token"));
        assert_eq!(config.timeout(), None);
        assert!(!config.token_validation().unwrap().is_signature_verified());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epmanage").join("config.json");
        let config = Config {
            base_url: Some("https://api.example.com".to_string()),
            timeout_secs: Some(30),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = Config::load_from(&path);
        assert!(loaded.is_err());
        assert_eq!(Config::usable_or_default(loaded), Config::default());
    }

    #[test]
    fn test_flag_wins_over_file() {
        let config = Config {
            base_url: Some("https://file.example.com".to_string()),
            token_file: Some(PathBuf::from("/tmp/file.token")),
            ..Config::default()
        };
        assert_eq!(
            config.base_url_or(Some("https://flag.example.com")).as_deref(),
            Some("https://flag.example.com")
        );
        assert_eq!(config.base_url_or(None).as_deref(), Some("https://file.example.com"));
        assert_eq!(
            config.token_file_or(Some(Path::new("cli.token"))),
            PathBuf::from("cli.token")
        );
        assert_eq!(config.token_file_or(None), PathBuf::from("/tmp/file.token"));
    }
}

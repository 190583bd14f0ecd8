// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::keyring;

const APP_DIR: &str = "soundcloud-provider";

pub const DEFAULT_API_BASE: &str = "https://api-v2.soundcloud.com/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.132 Safari/537.36";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write configuration file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no configuration directory available")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth token for SoundCloud API authentication
    /// DEPRECATED: Token is now stored in system keyring.
    /// This field is kept for migration from plaintext configs.
    pub access_token: Option<String>,
    /// Base URL of the v2 API, with trailing slash
    pub api_base: String,
    pub user_agent: String,
    /// ffmpeg binary used for remuxing
    pub ffmpeg_path: PathBuf,
    /// Where remux temp files are created; system temp dir when unset
    pub temp_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    /// Upper bound on `next_href` pages followed per collection
    pub max_pages: usize,
    pub search_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            temp_dir: None,
            request_timeout_secs: 30,
            max_pages: 50,
            search_limit: 10,
        }
    }
}

impl Config {
    /// Default config file (`~/.config/soundcloud-provider/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Load from `path`, or the default location. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path().ok_or(ConfigError::NoConfigDir)?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|source| ConfigError::Write { path, source })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Find the access token: explicit value first, then the keyring, then the
    /// deprecated config field (which gets migrated to the keyring).
    pub fn resolve_token(&self, explicit: Option<&str>) -> Option<String> {
        if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
            return Some(token.to_string());
        }

        match keyring::get_token() {
            Ok(Some(token)) => {
                debug!("Using token from keyring");
                return Some(token);
            }
            Ok(None) => {}
            Err(e) => warn!("Keyring unavailable: {e}"),
        }

        let token = self
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())?;
        info!("Migrating token from config to keyring");
        if let Err(e) = keyring::store_token(token) {
            warn!("Token migration failed: {e}");
        }
        Some(token.to_string())
    }
}

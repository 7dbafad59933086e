//! Application configuration.
//!
//! Layers, lowest to highest priority: built-in defaults, the TOML config
//! file, environment variables, command-line flags. Flags are applied by the
//! binary on top of what [`AppConfig::load`] and [`AppConfig::apply_env`]
//! produce.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use thriftstock_core::DomainError;
use thriftstock_inventory::{CatalogSettings, DEFAULT_SLOW_MOVER_DAYS, PricingPolicy};
use thriftstock_observability::LogFormat;

use crate::store::{CsvFileStore, GitHubMirror, MirroredStore, PersistenceError};
use crate::store::github::{GITHUB_API_BASE, MirrorTarget};

pub const APP_DIR: &str = "thriftstock";
pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_DATA_PATH: &str = "THRIFTSTOCK_DATA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid pricing config: {0}")]
    Pricing(#[source] DomainError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub pricing: PricingPolicy,
    pub catalog: CatalogSettings,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Local inventory CSV.
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("inventory.csv"),
        }
    }
}

/// GitHub mirror settings. The mirror runs only when enabled and both a
/// repository and a token are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    /// `owner/name`.
    pub repo: Option<String>,
    /// Path of the mirrored file inside the repository.
    pub path: String,
    pub branch: Option<String>,
    pub api_url: String,
    /// Usually supplied through `GITHUB_TOKEN` rather than the file.
    pub token: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repo: None,
            path: "inventory.csv".to_string(),
            branch: None,
            api_url: GITHUB_API_BASE.to_string(),
            token: None,
        }
    }
}

impl RemoteConfig {
    pub fn is_active(&self) -> bool {
        self.enabled && self.repo.is_some() && self.token.is_some()
    }

    fn target(&self) -> Option<(MirrorTarget, String)> {
        if !self.is_active() {
            return None;
        }
        let repo = self.repo.clone()?;
        let token = self.token.clone()?;
        Some((
            MirrorTarget {
                api_url: self.api_url.clone(),
                repo,
                path: self.path.clone(),
                branch: self.branch.clone(),
            },
            token,
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub slow_mover_days: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            slow_mover_days: DEFAULT_SLOW_MOVER_DAYS,
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// used when present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.pricing.validate().map_err(ConfigError::Pricing)?;
        Ok(config)
    }

    /// `<config dir>/thriftstock/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`. Empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(ENV_GITHUB_TOKEN) {
            self.remote.token = Some(token);
        }
        if let Some(path) = non_empty(ENV_DATA_PATH) {
            self.data.path = PathBuf::from(path);
        }
    }

    /// Build the store described by this configuration.
    pub fn build_store(&self) -> Result<MirroredStore, PersistenceError> {
        let local = CsvFileStore::new(&self.data.path, self.pricing.clone());
        let mirror = match self.remote.target() {
            Some((target, token)) => Some(GitHubMirror::new(target, token)?),
            None => {
                if self.remote.enabled && self.remote.repo.is_some() {
                    tracing::warn!("remote mirror configured but no token found; saving locally only");
                }
                None
            }
        };
        Ok(MirroredStore::new(local, mirror))
    }
}

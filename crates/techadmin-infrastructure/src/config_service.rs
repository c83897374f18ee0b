//! Configuration loading.
//!
//! Reads `config.toml` (or an explicit path) and applies environment
//! overrides on top of it.

use std::path::{Path, PathBuf};

use techadmin_core::config::RootConfig;
use techadmin_core::error::Result;

use crate::paths::AdminPaths;

pub const ENV_API_URL: &str = "TECHADMIN_API_URL";
pub const ENV_API_KEY: &str = "TECHADMIN_API_KEY";

/// Loads the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Uses the explicit path if given, else the platform config file.
    pub fn resolve(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::new(path)),
            None => Ok(Self::new(AdminPaths::config_file()?)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file and applies process environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<RootConfig> {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file(&self) -> Result<RootConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[ConfigService] no config at {}, using defaults",
                self.path.display()
            );
            return Ok(RootConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: RootConfig = toml::from_str(&content)?;
        tracing::debug!("[ConfigService] loaded {}", self.path.display());
        Ok(config)
    }
}

/// Overrides backend settings from the environment.
///
/// Blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut RootConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_blank(ENV_API_URL) {
        config.backend.url = Some(url);
    }
    if let Some(api_key) = non_blank(ENV_API_KEY) {
        config.backend.api_key = Some(api_key);
    }
}

//! Path management for techadmin files.
//!
//! ```text
//! ~/.config/techadmin/        # Config directory
//! └── config.toml             # Application configuration
//!
//! ~/.local/share/techadmin/   # Data directory
//! └── session.json            # Persisted sign-in session
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "techadmin";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config/data directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for techadmin_core::AdminError {
    fn from(err: PathError) -> Self {
        techadmin_core::AdminError::config(err.to_string())
    }
}

/// Resolves the platform directories used by techadmin.
pub struct AdminPaths;

impl AdminPaths {
    /// Returns the techadmin configuration directory (e.g. `~/.config/techadmin/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the techadmin data directory (e.g. `~/.local/share/techadmin/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path of the persisted session.
    ///
    /// The file holds bearer tokens; it is written with owner-only
    /// permissions on Unix.
    pub fn session_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("session.json"))
    }
}

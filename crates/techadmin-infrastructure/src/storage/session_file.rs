//! Persisted sign-in session.

use std::path::PathBuf;

use techadmin_core::auth::Session;
use techadmin_core::error::Result;

use super::atomic_json::AtomicJsonFile;
use crate::paths::AdminPaths;

/// The session kept on disk between runs for silent restore.
pub struct SessionFile {
    file: AtomicJsonFile<Session>,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    /// Session file in the platform data directory.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(AdminPaths::session_file()?))
    }

    /// Loads the stored session.
    ///
    /// An unreadable file is discarded and treated as signed out.
    pub fn load(&self) -> Option<Session> {
        match self.file.load() {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(
                    "[SessionFile] discarding unreadable session file {}: {}",
                    self.file.path().display(),
                    err
                );
                if let Err(err) = self.file.remove() {
                    tracing::warn!("[SessionFile] failed to remove session file: {}", err);
                }
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        self.file.save(session)?;
        tracing::debug!("[SessionFile] session saved to {}", self.file.path().display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.file.remove()
    }
}
